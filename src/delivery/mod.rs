// src/delivery/mod.rs

//! Outbound delivery of harvested auctions.
//!
//! Messages go out strictly one at a time, no faster than the configured
//! minimum interval. The first rejected message aborts the rest of the run.

pub mod format;
pub mod telegram;

use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};

use crate::error::{AppError, Result};
use crate::models::{Auction, DeliveryConfig};

pub use format::{Message, MessageFormatter};
pub use telegram::TelegramSink;

type SendLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Downstream messaging channel.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Formats auctions and pushes them through a sink under the rate limit.
pub struct Deliverer<'a> {
    sink: &'a dyn MessageSink,
    formatter: MessageFormatter,
    /// One send per interval, no burst. `None` when the interval is zero.
    limiter: Option<SendLimiter>,
}

impl<'a> Deliverer<'a> {
    pub fn new(sink: &'a dyn MessageSink, config: &DeliveryConfig) -> Self {
        let limiter = Quota::with_period(config.min_interval())
            .map(|quota| RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN)));

        Self {
            sink,
            formatter: MessageFormatter::new(config.clone()),
            limiter,
        }
    }

    /// Deliver auctions in the given order. Returns the number of messages sent.
    ///
    /// Every auction is formatted before the first send, so a formatting error
    /// sends nothing. A channel error is attributed to the auction whose
    /// message failed.
    pub async fn deliver(&self, auctions: &[Auction]) -> Result<usize> {
        let messages = self.formatter.format_all(auctions)?;

        for message in &messages {
            if let Some(limiter) = &self.limiter {
                limiter.until_ready().await;
            }

            if let Err(e) = self.sink.send(&message.text).await {
                log::error!("Error sending auction {}: {}", message.record_id, e);
                return Err(AppError::delivery(&message.record_id, e));
            }
            log::debug!("Sent message for auction {}", message.record_id);
        }

        Ok(messages.len())
    }
}
