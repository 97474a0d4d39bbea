//! Fetch-and-render state for compiled documents served over the network.
//!
//! Each fetch gets a ticket; only the newest ticket may update the state, so
//! a slow response that lost the race is dropped. A failed fetch keeps the
//! last good document until [`RemoteDocument::clear`] is called.

use crate::error::FetchError;
use natmdx_core::CompiledDocument;
use serde_json::Value as JsonValue;

/// Raw HTTP response handed back by a [`Fetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl FetchResponse {
    /// Whether the status is 2xx.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network seam: performs a GET for `url`.
pub trait Fetcher {
    /// Fetches `url`.
    fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&str) -> Result<FetchResponse, FetchError>,
{
    fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        (self)(url)
    }
}

/// Validates a response and decodes the compiled document in it.
pub fn parse_response(response: &FetchResponse) -> Result<CompiledDocument, FetchError> {
    if !response.is_ok() {
        return Err(FetchError::Status {
            status: response.status,
        });
    }
    let data: JsonValue =
        serde_json::from_str(&response.body).map_err(|_| FetchError::InvalidFormat)?;
    let has_tree = data
        .get("tree")
        .is_some_and(|tree| !tree.is_null() && tree != &JsonValue::Bool(false));
    if !has_tree {
        return Err(FetchError::InvalidFormat);
    }
    serde_json::from_value(data).map_err(|_| FetchError::InvalidFormat)
}

/// Identifies one fetch started by [`RemoteDocument::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// State of one remote document.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    url: String,
    content: Option<CompiledDocument>,
    error: Option<FetchError>,
    loading: bool,
    latest: u64,
}

impl RemoteDocument {
    /// Idle state for `url`; nothing fetched yet.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: None,
            error: None,
            loading: false,
            latest: 0,
        }
    }

    /// The document URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Last successfully fetched document.
    pub fn content(&self) -> Option<&CompiledDocument> {
        self.content.as_ref()
    }

    /// Error of the most recent completed fetch, if it failed.
    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    /// Whether a fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Starts a fetch. Any ticket handed out earlier becomes stale.
    pub fn begin(&mut self) -> Ticket {
        self.latest += 1;
        self.loading = true;
        self.error = None;
        Ticket(self.latest)
    }

    /// Applies the outcome of the fetch identified by `ticket`.
    ///
    /// Returns false, leaving the state untouched, when the ticket is stale.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<FetchResponse, FetchError>,
    ) -> bool {
        if ticket.0 != self.latest {
            log::debug!("Discarding stale response for {}", self.url);
            return false;
        }
        self.loading = false;
        match outcome.and_then(|response| parse_response(&response)) {
            Ok(document) => {
                self.content = Some(document);
                self.error = None;
            }
            Err(err) => {
                log::warn!("Fetching {} failed: {err}", self.url);
                self.error = Some(err);
            }
        }
        true
    }

    /// Fetches synchronously through `fetcher`.
    pub fn refetch(&mut self, fetcher: &dyn Fetcher) {
        let ticket = self.begin();
        let outcome = fetcher.fetch(&self.url);
        self.complete(ticket, outcome);
    }

    /// Drops the content and any error; outstanding tickets become stale.
    pub fn clear(&mut self) {
        self.content = None;
        self.error = None;
        self.loading = false;
        self.latest += 1;
    }
}
