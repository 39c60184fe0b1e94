// src/services/parsers.rs

//! Field parsers for cell text scraped from detail pages.
//!
//! Every parser returns `None` when the text carries no value. Explicit
//! "nothing here" sentinels are silent; anything else that fails to parse is
//! logged as a warning. No parser ever returns an error.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;

/// Texts that mean "no amount" rather than a malformed amount.
const ABSENT_AMOUNTS: &[&str] = &["No consta", "Sin tramos"];

/// Prefix of texts that point elsewhere ("Ver valor de subasta en cada lote").
const SEE_ELSEWHERE_PREFIX: &str = "Ver ";

const NO_MINIMUM_BID: &str = "Sin puja mínima";

const TRUE_VALUES: &[&str] = &["Sí"];
const FALSE_VALUES: &[&str] = &["No", "No consta"];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

static ISO_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ISO:\s*([^\s]+)").expect("valid ISO marker regex"));

/// Parse a euro amount written in es-ES style ("1.234,56 €").
pub fn parse_euros(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.starts_with(SEE_ELSEWHERE_PREFIX) || ABSENT_AMOUNTS.contains(&text) {
        return None;
    }

    let parsed = parse_es_decimal(text.trim_end_matches('€'));
    if parsed.is_none() {
        log::warn!("Could not parse '{}' as euros", text);
    }
    parsed
}

/// Parse a minimum bid, which has its own "no minimum" sentinel.
pub fn parse_minimum_bid(text: &str) -> Option<Decimal> {
    if text.trim() == NO_MINIMUM_BID {
        return None;
    }
    parse_euros(text)
}

/// Parse a surface area ("120,50 m²") or a plain es-ES decimal.
pub fn parse_area(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if ABSENT_AMOUNTS.contains(&text) {
        return None;
    }

    let parsed = parse_es_decimal(text.trim_end_matches("m²").trim_end_matches("m2"));
    if parsed.is_none() {
        log::warn!("Could not parse '{}' as a decimal", text);
    }
    parsed
}

/// Parse a yes/no cell.
pub fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if TRUE_VALUES.contains(&text) {
        return Some(true);
    }
    if FALSE_VALUES.contains(&text) {
        return Some(false);
    }

    log::warn!("Could not parse '{}' as bool", text);
    None
}

/// Parse a timestamp from the machine-readable `ISO:` token embedded in a
/// human-readable cell, normalized to UTC.
///
/// `"22-05-2024 18:00:00 CET (ISO: 2024-05-22T18:00:00+02:00)"` yields
/// `2024-05-22T16:00:00Z`. Values without an offset are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let Some(captures) = ISO_MARKER.captures(text) else {
        log::warn!("Could not parse '{}' as date", text);
        return None;
    };

    let token = captures[1].trim_end_matches(|c| matches!(c, ')' | '.' | ',' | ';'));

    let parsed = DateTime::parse_from_rfc3339(token)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(token, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        });

    if parsed.is_none() {
        log::warn!("Could not parse '{}' as date", token);
    }
    parsed
}

/// Parse a calendar date such as a vehicle registration date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let parsed = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok());

    if parsed.is_none() {
        log::warn!("Could not parse '{}' as date", text);
    }
    parsed
}

/// Parse a decimal with `.` as thousands separator and `,` as decimal mark.
fn parse_es_decimal(text: &str) -> Option<Decimal> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if normalized.is_empty() || !normalized.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Decimal::from_str(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_euros_es_style() {
        assert_eq!(parse_euros("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_euros("1.234,56 €"), Some(dec("1234.56")));
        assert_eq!(parse_euros("250.000,00 €"), Some(dec("250000.00")));
        assert_eq!(parse_euros("0,00 €"), Some(dec("0")));
    }

    #[test]
    fn test_euros_sentinels() {
        assert_eq!(parse_euros("No consta"), None);
        assert_eq!(parse_euros("Sin tramos"), None);
        assert_eq!(parse_euros("Ver valor de subasta en cada lote"), None);
    }

    #[test]
    fn test_euros_garbage() {
        assert_eq!(parse_euros("garbage"), None);
        assert_eq!(parse_euros(""), None);
    }

    #[test]
    fn test_minimum_bid() {
        assert_eq!(parse_minimum_bid("Sin puja mínima"), None);
        assert_eq!(parse_minimum_bid("10,50 €"), Some(dec("10.50")));
    }

    #[test]
    fn test_area() {
        assert_eq!(parse_area("120,50 m²"), Some(dec("120.50")));
        assert_eq!(parse_area("33,3333"), Some(dec("33.3333")));
        assert_eq!(parse_area("No consta"), None);
    }

    #[test]
    fn test_bool() {
        assert_eq!(parse_bool("Sí"), Some(true));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("No consta"), Some(false));
        assert_eq!(parse_bool("???"), None);
    }

    #[test]
    fn test_timestamp_with_terminator() {
        let parsed = parse_timestamp("Fecha: ISO:2024-05-01T00:00:00+02:00.");
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2024, 4, 30, 22, 0, 0).unwrap()));
    }

    #[test]
    fn test_timestamp_portal_format() {
        let parsed = parse_timestamp("22-05-2024 18:00:00 CET (ISO: 2024-05-22T18:00:00+02:00)");
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2024, 5, 22, 16, 0, 0).unwrap()));
    }

    #[test]
    fn test_timestamp_without_offset_is_utc() {
        let parsed = parse_timestamp("ISO: 2024-05-22T18:00:00)");
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2024, 5, 22, 18, 0, 0).unwrap()));
    }

    #[test]
    fn test_timestamp_without_marker() {
        assert_eq!(parse_timestamp("22-05-2024 18:00:00 CET"), None);
        assert_eq!(parse_timestamp("ISO: not-a-date"), None);
    }

    #[test]
    fn test_date() {
        let expected = NaiveDate::from_ymd_opt(2019, 3, 14);
        assert_eq!(parse_date("14/03/2019"), expected);
        assert_eq!(parse_date("14-03-2019"), expected);
        assert_eq!(parse_date("2019-03-14"), expected);
        assert_eq!(parse_date("marzo 2019"), None);
    }
}
