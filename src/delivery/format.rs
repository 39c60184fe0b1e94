// src/delivery/format.rs

//! Message formatting and chunk packing.
//!
//! An auction becomes one header part plus one part per lot. Parts are packed
//! greedily into messages that all start with the header; when an auction
//! needs more than one message, each one gets a `(i de N)` marker.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{AppError, Result};
use crate::models::{Auction, DeliveryConfig, Lot};

const NO_PROVINCE: &str = "<i>Sin provincia</i>";
const NO_DESCRIPTION: &str = "<i>Sin descripción</i>";
const NO_VALUE: &str = "<i>Sin valor</i>";
const DEFAULT_KIND: &str = "Bien";
const ELLIPSIS: &str = "...";

/// One outbound message and the auction it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub record_id: String,
    pub text: String,
}

/// Renders auctions into size-bounded messages.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    config: DeliveryConfig,
}

impl MessageFormatter {
    pub fn new(config: DeliveryConfig) -> Self {
        Self { config }
    }

    /// Format every auction, in order. Fails on the first auction that
    /// cannot be packed.
    pub fn format_all(&self, auctions: &[Auction]) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        for auction in auctions {
            for text in self.format(auction)? {
                messages.push(Message {
                    record_id: auction.id.clone(),
                    text,
                });
            }
        }
        Ok(messages)
    }

    /// Format one auction into one or more messages.
    pub fn format(&self, auction: &Auction) -> Result<Vec<String>> {
        let header = self.header(auction);
        let parts: Vec<String> = auction.lots.iter().map(|lot| self.lot(lot)).collect();

        let messages = pack(&header, &parts, self.config.chunk_limit)
            .map_err(|message| AppError::formatting(&auction.id, message))?;

        if let Some(long) = messages
            .iter()
            .find(|m| text_len(m) > self.config.max_message_len)
        {
            return Err(AppError::formatting(
                &auction.id,
                format!(
                    "message of {} characters exceeds {}",
                    text_len(long),
                    self.config.max_message_len
                ),
            ));
        }
        Ok(messages)
    }

    pub fn header(&self, auction: &Auction) -> String {
        format!(
            "<b>Subasta {}</b>\nFechas: {} - {}",
            escape_html(&format!("{}{}", self.config.detail_url, auction.id)),
            format_date(auction.start_date),
            format_date(auction.end_date),
        )
    }

    pub fn lot(&self, lot: &Lot) -> String {
        let kind = escape_html(lot.kind.as_deref().unwrap_or(DEFAULT_KIND));
        let province = lot
            .province
            .as_deref()
            .map(escape_html)
            .unwrap_or_else(|| NO_PROVINCE.to_string());
        let value = lot
            .value
            .map(|v| format!("{}€", format_euros(v)))
            .unwrap_or_else(|| NO_VALUE.to_string());
        let description = lot
            .description
            .as_deref()
            .map(|d| escape_html(&truncate(d, self.config.description_limit)))
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        format!(
            "\n\n<b>{kind} en {province}</b>\n - Valor de la subasta: {value}\n - Descripción: {description}"
        )
    }
}

/// Greedily pack `parts` behind `header` into messages of at most `limit`
/// characters, then number them if there is more than one.
///
/// Fails if a single part does not fit next to the header.
pub fn pack(header: &str, parts: &[String], limit: usize) -> std::result::Result<Vec<String>, String> {
    let header_len = text_len(header);
    if header_len > limit {
        return Err(format!("header of {header_len} characters exceeds {limit}"));
    }

    let mut messages = vec![header.to_string()];
    let mut current_len = header_len;

    for (index, part) in parts.iter().enumerate() {
        let part_len = text_len(part);
        if header_len + part_len > limit {
            return Err(format!(
                "lot part {} of {} characters does not fit next to the header ({} + {} > {})",
                index + 1,
                part_len,
                header_len,
                part_len,
                limit
            ));
        }

        if current_len + part_len > limit {
            messages.push(header.to_string());
            current_len = header_len;
        }
        if let Some(current) = messages.last_mut() {
            current.push_str(part);
            current_len += part_len;
        }
    }

    let total = messages.len();
    if total > 1 {
        for (i, message) in messages.iter_mut().enumerate() {
            message.insert_str(0, &split_marker(i + 1, total));
        }
    }
    Ok(messages)
}

fn split_marker(index: usize, total: usize) -> String {
    format!("<b><i>({index} de {total})</i></b> ")
}

/// Length as the channel counts it: characters, not bytes.
fn text_len(text: &str) -> usize {
    text.chars().count()
}

fn truncate(text: &str, limit: usize) -> String {
    if text_len(text) <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Whole euros with `.` as thousands separator.
fn format_euros(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;
    use crate::models::AuctionStatus;

    fn formatter() -> MessageFormatter {
        MessageFormatter::new(DeliveryConfig::default())
    }

    #[test]
    fn test_pack_splits_on_overflow() {
        let header = "h".repeat(100);
        let parts = vec!["a".repeat(2000), "b".repeat(2000), "c".repeat(2000)];

        let messages = pack(&header, &parts, 4050).unwrap();

        assert_eq!(messages.len(), 3);
        for (i, message) in messages.iter().enumerate() {
            let marker = split_marker(i + 1, 3);
            assert!(message.starts_with(&marker));
            let body = &message[marker.len()..];
            assert_eq!(body.len(), 2100);
            assert!(body.starts_with(&header));
        }
        assert!(messages[0].contains("(1 de 3)"));
        assert!(messages[2].ends_with('c'));
    }

    #[test]
    fn test_pack_fills_greedily() {
        let header = "h".repeat(100);
        let parts = vec!["a".repeat(1000), "b".repeat(1000), "c".repeat(3000)];

        let messages = pack(&header, &parts, 4050).unwrap();

        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains(&"b".repeat(1000)));
        assert!(messages[1].contains(&"c".repeat(3000)));
    }

    #[test]
    fn test_pack_single_message_has_no_marker() {
        let messages = pack("head", &["x".to_string(), "y".to_string()], 4050).unwrap();
        assert_eq!(messages, vec!["headxy".to_string()]);
    }

    #[test]
    fn test_pack_rejects_oversized_part() {
        let header = "h".repeat(100);
        let parts = vec!["a".repeat(3951)];
        assert!(pack(&header, &parts, 4050).is_err());

        let parts = vec!["a".repeat(3950)];
        assert_eq!(pack(&header, &parts, 4050).unwrap().len(), 1);
    }

    #[test]
    fn test_oversized_lot_is_formatting_error() {
        let mut auction = Auction::new("SUB-1", AuctionStatus::Active);
        let mut lot = Lot::new("SUB-1", "1");
        lot.kind = Some("x".repeat(5000));
        auction.lots.push(lot);

        let err = formatter().format(&auction).unwrap_err();
        assert!(matches!(err, AppError::Formatting { ref record_id, .. } if record_id == "SUB-1"));
    }

    #[test]
    fn test_header_and_lot_text() {
        let mut auction = Auction::new("SUB-JA-2024-1", AuctionStatus::Active);
        auction.start_date = Utc.with_ymd_and_hms(2025, 3, 13, 18, 0, 0).single();
        auction.end_date = Utc.with_ymd_and_hms(2025, 4, 2, 16, 0, 0).single();
        let mut lot = Lot::new("SUB-JA-2024-1", "1");
        lot.kind = Some("Vivienda".into());
        lot.province = Some("Jaén".into());
        lot.value = Some(Decimal::from_str("1234567.50").unwrap());
        lot.description = Some("Piso <3º> & trastero".into());
        auction.lots.push(lot);

        let messages = formatter().format(&auction).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0],
            "<b>Subasta https://subastas.boe.es/detalleSubasta.php?idSub=SUB-JA-2024-1</b>\n\
             Fechas: 13/03/2025 - 02/04/2025\n\n\
             <b>Vivienda en Jaén</b>\n \
             - Valor de la subasta: 1.234.568€\n \
             - Descripción: Piso &lt;3º&gt; &amp; trastero"
        );
    }

    #[test]
    fn test_lot_placeholders() {
        let text = formatter().lot(&Lot::new("SUB-1", "1"));
        assert!(text.contains(NO_PROVINCE));
        assert!(text.contains(NO_DESCRIPTION));
        assert!(text.contains(NO_VALUE));
    }

    #[test]
    fn test_truncate_description() {
        let long = "á".repeat(150);
        let truncated = truncate(&long, 100);
        assert_eq!(text_len(&truncated), 100);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate("corto", 100), "corto");
    }

    #[test]
    fn test_format_euros() {
        assert_eq!(format_euros(Decimal::from(0)), "0");
        assert_eq!(format_euros(Decimal::from(999)), "999");
        assert_eq!(format_euros(Decimal::from(1000)), "1.000");
        assert_eq!(format_euros(Decimal::from_str("120000.49").unwrap()), "120.000");
        assert_eq!(format_euros(Decimal::from_str("-1500").unwrap()), "-1.500");
    }

    #[test]
    fn test_format_all_keeps_record_ids() {
        let auctions = vec![
            Auction::new("SUB-1", AuctionStatus::Active),
            Auction::new("SUB-2", AuctionStatus::Upcoming),
        ];
        let messages = formatter().format_all(&auctions).unwrap();
        let ids: Vec<_> = messages.iter().map(|m| m.record_id.as_str()).collect();
        assert_eq!(ids, ["SUB-1", "SUB-2"]);
    }
}
