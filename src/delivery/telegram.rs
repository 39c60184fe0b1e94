// src/delivery/telegram.rs

//! Telegram Bot API sink.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::delivery::MessageSink;
use crate::error::{AppError, Result};

/// Environment variable holding the bot token.
pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable holding the target chat id.
pub const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends HTML messages to one chat through `sendMessage`.
#[derive(Clone)]
pub struct TelegramSink {
    client: Client,
    token: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(client: Client, token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Build a sink from the environment.
    ///
    /// Returns `None`, with a warning, if the token or chat id is missing.
    pub fn from_env(client: Client) -> Option<Self> {
        let token = non_empty_var(TOKEN_VAR);
        let chat_id = non_empty_var(CHAT_ID_VAR);

        match (token, chat_id) {
            (Some(token), Some(chat_id)) => Some(Self::new(client, token, chat_id)),
            _ => {
                log::warn!(
                    "{} or {} not set, delivery disabled",
                    TOKEN_VAR,
                    CHAT_ID_VAR
                );
                None
            }
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", API_BASE, self.token)
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint())
            .form(&[
                ("chat_id", self.chat_id.as_str()),
                ("text", text),
                ("parse_mode", "HTML"),
                ("disable_web_page_preview", "true"),
            ])
            .send()
            .await
            // The request URL carries the bot token
            .map_err(reqwest::Error::without_url)?;

        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;
        check_response(&body)
    }
}

fn check_response(body: &str) -> Result<()> {
    let response: ApiResponse = serde_json::from_str(body)?;
    if response.ok {
        Ok(())
    } else {
        Err(AppError::Channel(
            response
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
