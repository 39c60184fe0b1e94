// src/services/source.rs

//! Page source abstraction.
//!
//! Every page the harvester reads goes through [`PageSource::fetch`], so the
//! crawler and resolver never know whether they talk to the portal or to a
//! canned fixture.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::AuctionStatus;

const SEARCH_PATH: &str = "subastas_ava.php";
const DETAIL_PATH: &str = "detalleSubasta.php";

/// Detail page selector (`ver=N`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailView {
    General,
    Authority,
    Lots,
    Related,
}

impl DetailView {
    pub fn number(&self) -> u8 {
        match self {
            DetailView::General => 1,
            DetailView::Authority => 2,
            DetailView::Lots => 3,
            DetailView::Related => 4,
        }
    }
}

/// One page the harvester can ask for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageRequest {
    /// Initial search for one status
    Search {
        status: AuctionStatus,
        page_size: usize,
    },
    /// Continuation page of a search session
    More {
        cursor: String,
        offset: usize,
        page_size: usize,
    },
    /// One section of an auction's detail view
    Detail {
        view: DetailView,
        id: String,
        lot_id: Option<String>,
    },
}

impl PageRequest {
    pub fn detail(view: DetailView, id: impl Into<String>) -> Self {
        Self::Detail {
            view,
            id: id.into(),
            lot_id: None,
        }
    }

    pub fn lot(id: impl Into<String>, lot_id: impl Into<String>) -> Self {
        Self::Detail {
            view: DetailView::Lots,
            id: id.into(),
            lot_id: Some(lot_id.into()),
        }
    }

    /// Resolve the request URL against the portal root.
    pub fn url(&self, base: &Url) -> Result<Url> {
        let mut url = match self {
            PageRequest::Search { .. } | PageRequest::More { .. } => base.join(SEARCH_PATH)?,
            PageRequest::Detail { .. } => base.join(DETAIL_PATH)?,
        };

        match self {
            PageRequest::Search { .. } => {}
            PageRequest::More {
                cursor,
                offset,
                page_size,
            } => {
                url.query_pairs_mut()
                    .append_pair("accion", "Mas")
                    .append_pair("id_busqueda", &format!("{cursor}-{offset}-{page_size}"));
            }
            PageRequest::Detail { view, id, lot_id } => {
                let mut pairs = url.query_pairs_mut();
                pairs
                    .append_pair("ver", &view.number().to_string())
                    .append_pair("idSub", id);
                if let Some(lot_id) = lot_id {
                    pairs.append_pair("idLote", lot_id);
                }
            }
        }
        Ok(url)
    }

    /// Form body for requests sent as POST.
    pub fn form(&self) -> Option<Vec<(&'static str, String)>> {
        match self {
            PageRequest::Search { status, page_size } => Some(vec![
                ("page_hits", page_size.to_string()),
                ("campo[0]", "SUBASTA.ESTADO.CODIGO".to_string()),
                ("dato[0]", status.code().to_string()),
                ("sort_field[0]", "SUBASTA.FECHA_FIN".to_string()),
                ("sort_order[0]", "desc".to_string()),
                ("accion", "Buscar".to_string()),
            ]),
            _ => None,
        }
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRequest::Search { status, .. } => write!(f, "search[{}]", status),
            PageRequest::More {
                cursor,
                offset,
                page_size,
            } => write!(f, "search {cursor}-{offset}-{page_size}"),
            PageRequest::Detail { view, id, lot_id } => match lot_id {
                Some(lot_id) => write!(f, "detail ver={} {} lot {}", view.number(), id, lot_id),
                None => write!(f, "detail ver={} {}", view.number(), id),
            },
        }
    }
}

/// Source of raw page bodies.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, request: &PageRequest) -> Result<String>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for Arc<T> {
    async fn fetch(&self, request: &PageRequest) -> Result<String> {
        (**self).fetch(request).await
    }
}

/// Retries transport failures of an inner source immediately, up to a fixed
/// number of attempts. Any other error is returned on first occurrence.
pub struct RetryingSource<S> {
    inner: S,
    max_attempts: usize,
}

impl<S> RetryingSource<S> {
    pub fn new(inner: S, max_attempts: usize) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
        }
    }
}

#[async_trait]
impl<S: PageSource> PageSource for RetryingSource<S> {
    async fn fetch(&self, request: &PageRequest) -> Result<String> {
        let backoff = ConstantBuilder::default()
            .with_delay(Duration::ZERO)
            .with_max_times(self.max_attempts - 1);
        let mut attempt = 0;

        (|| self.inner.fetch(request))
            .retry(backoff)
            .sleep(tokio::time::sleep)
            .when(AppError::is_transport)
            .notify(|e: &AppError, _| {
                attempt += 1;
                log::warn!(
                    "Error loading {} (attempt {}/{}): {}",
                    request,
                    attempt,
                    self.max_attempts,
                    e
                );
            })
            .await
            .map_err(|e| {
                if e.is_transport() {
                    log::warn!(
                        "Giving up on {} after {} attempts: {}",
                        request,
                        self.max_attempts,
                        e
                    );
                    AppError::FetchExhausted {
                        url: request.to_string(),
                        attempts: self.max_attempts,
                    }
                } else {
                    e
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Fails with the queued errors, then succeeds.
    struct Flaky {
        errors: Mutex<Vec<AppError>>,
        calls: AtomicUsize,
    }

    impl Flaky {
        fn new(errors: Vec<AppError>) -> Self {
            Self {
                errors: Mutex::new(errors),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageSource for Flaky {
        async fn fetch(&self, _request: &PageRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.errors.lock().unwrap().pop();
            match next {
                Some(e) => Err(e),
                None => Ok("<html></html>".to_string()),
            }
        }
    }

    fn request() -> PageRequest {
        PageRequest::detail(DetailView::General, "SUB-1")
    }

    #[tokio::test]
    async fn test_two_failures_then_success() {
        let flaky = Arc::new(Flaky::new(vec![
            AppError::transport("x", "reset"),
            AppError::transport("x", "timeout"),
        ]));
        let source = RetryingSource::new(Arc::clone(&flaky), 3);

        let body = source.fetch(&request()).await.unwrap();
        assert_eq!(body, "<html></html>");
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_three_failures_exhaust() {
        let flaky = Arc::new(Flaky::new(vec![
            AppError::transport("x", "1"),
            AppError::transport("x", "2"),
            AppError::transport("x", "3"),
        ]));
        let source = RetryingSource::new(Arc::clone(&flaky), 3);

        let err = source.fetch(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::FetchExhausted { attempts: 3, .. }));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_single_attempt_budget() {
        let flaky = Arc::new(Flaky::new(vec![AppError::transport("x", "reset")]));
        let source = RetryingSource::new(Arc::clone(&flaky), 1);

        let err = source.fetch(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::FetchExhausted { attempts: 1, .. }));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_transport_error_is_not_retried() {
        let flaky = Arc::new(Flaky::new(vec![AppError::structural("body", "garbled")]));
        let source = RetryingSource::new(Arc::clone(&flaky), 3);

        let err = source.fetch(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::Structural { .. }));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_request_urls() {
        let base = Url::parse("https://subastas.boe.es/").unwrap();

        let more = PageRequest::More {
            cursor: "abc".into(),
            offset: 500,
            page_size: 500,
        };
        assert_eq!(
            more.url(&base).unwrap().as_str(),
            "https://subastas.boe.es/subastas_ava.php?accion=Mas&id_busqueda=abc-500-500"
        );

        let lot = PageRequest::lot("SUB-1", "3");
        assert_eq!(
            lot.url(&base).unwrap().as_str(),
            "https://subastas.boe.es/detalleSubasta.php?ver=3&idSub=SUB-1&idLote=3"
        );
    }

    #[test]
    fn test_search_form() {
        let search = PageRequest::Search {
            status: AuctionStatus::Active,
            page_size: 500,
        };
        let form = search.form().unwrap();
        assert!(form.contains(&("dato[0]", "EJ".to_string())));
        assert!(form.contains(&("accion", "Buscar".to_string())));
        assert!(PageRequest::lot("SUB-1", "2").form().is_none());
    }
}
