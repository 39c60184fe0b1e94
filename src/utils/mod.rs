//! Utility functions and helpers.

pub mod http;
pub mod log;

/// Read one query parameter from a (possibly relative) link.
///
/// Only the part after the first `?` is considered, so relative links such as
/// `./detalleSubasta.php?idSub=SUB-1&idBus=x` work without a base URL.
pub fn query_param(href: &str, key: &str) -> Option<String> {
    let (_, query) = href.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}
