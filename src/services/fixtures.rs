//! Canned pages and an in-memory page source for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::services::{PageRequest, PageSource};

type Handler = Box<dyn Fn(&PageRequest) -> Option<String> + Send + Sync>;

/// Serves pages from a closure; an unanswered request is a transport error.
pub(crate) struct FakeSource {
    handler: Handler,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<PageRequest>>,
}

impl FakeSource {
    pub fn with_handler(
        handler: impl Fn(&PageRequest) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pages(pages: HashMap<PageRequest, String>) -> Self {
        Self::with_handler(move |request| pages.get(request).cloned())
    }

    pub fn requested(&self, request: &PageRequest) -> bool {
        self.requests.lock().unwrap().contains(request)
    }
}

#[async_trait]
impl PageSource for FakeSource {
    async fn fetch(&self, request: &PageRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(request)
            .ok_or_else(|| AppError::transport(request.to_string(), "no fixture"))
    }
}

fn document(body: &str) -> String {
    format!("<html><body>{body}</body></html>")
}

pub(crate) fn table(rows: &[(&str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(h, v)| format!("<tr><th>{h}</th><td>{v}</td></tr>"))
        .collect();
    format!("<table>{rows}</table>")
}

pub(crate) fn listing_page(cursor: Option<&str>, ids: &[String]) -> String {
    let pager = cursor
        .map(|c| {
            format!(
                r#"<div class="paginar"><a class="current" href="subastas_ava.php?accion=Mas&amp;id_busqueda={c}">1</a></div>"#
            )
        })
        .unwrap_or_default();
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li><a class="resultado-busqueda-link-defecto" href="./detalleSubasta.php?idSub={id}&amp;idBus=x">Más...</a></li>"#
            )
        })
        .collect();
    document(&format!(
        r#"{pager}<div class="listadoResult"><ul>{items}</ul></div>"#
    ))
}

pub(crate) fn general_page(tabs: &[&str], rows: &[(&str, &str)]) -> String {
    let tabs: String = tabs
        .iter()
        .map(|t| format!(r##"<li><a href="#">{t}</a></li>"##))
        .collect();
    document(&format!(
        r#"<div id="tabs"><ul>{tabs}</ul></div><div id="idBloqueDatos1">{}</div>"#,
        table(rows)
    ))
}

pub(crate) fn authority_page(rows: &[(&str, &str)]) -> String {
    document(&format!(r#"<div id="idBloqueDatos2">{}</div>"#, table(rows)))
}

pub(crate) fn related_page(
    creditor: Option<&[(&str, &str)]>,
    administrator: Option<&[(&str, &str)]>,
) -> String {
    let creditor = creditor
        .map(|rows| format!(r#"<div id="idBloqueDatos4">{}</div>"#, table(rows)))
        .unwrap_or_default();
    let administrator = administrator
        .map(|rows| format!(r#"<div id="idBloqueDatos7">{}</div>"#, table(rows)))
        .unwrap_or_default();
    document(&format!("{creditor}{administrator}"))
}

pub(crate) fn lot_page(lot_ids: &[&str], heading: &str, rows: &[(&str, &str)]) -> String {
    let tabs = if lot_ids.is_empty() {
        String::new()
    } else {
        let items: String = lot_ids
            .iter()
            .map(|id| format!(r##"<li><a id="idTabLote{id}" href="#">Lote {id}</a></li>"##))
            .collect();
        format!(r#"<div id="tabsver"><ul>{items}</ul></div>"#)
    };
    document(&format!(
        r#"{tabs}<div id="idBloqueDatos3"><h4>{heading}</h4><div class="caja">Resumen del bien</div>{}</div>"#,
        table(rows)
    ))
}
