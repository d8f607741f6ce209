//! In-memory page sources for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::error::NetworkError;
use super::extractor::Extractor;
use super::fetcher::PageSource;
use super::query::ActivityQuery;

/// Listing page with ten items.
pub const LISTING_FIXTURE: &str = include_str!("fixtures/listing.html");

/// Serves a fixed body and counts fetches.
pub struct StaticPage {
    body: String,
    calls: AtomicUsize,
}

impl StaticPage {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for StaticPage {
    async fn fetch_page(&self) -> Result<String, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

/// Always fails with a status error.
pub struct FailingPage {
    status: u16,
}

impl FailingPage {
    pub fn status(status: u16) -> Self {
        Self { status }
    }
}

#[async_trait]
impl PageSource for FailingPage {
    async fn fetch_page(&self) -> Result<String, NetworkError> {
        Err(NetworkError::Status {
            status: self.status,
            reason: "test".to_string(),
        })
    }
}

/// Serves the fixture after a delay and records how many fetches overlap.
pub struct SlowPage {
    delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
}

impl SlowPage {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        }
    }

    /// Most fetches ever in flight at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for SlowPage {
    async fn fetch_page(&self) -> Result<String, NetworkError> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(LISTING_FIXTURE.to_string())
    }
}

/// Query over the fixture listing served by a [`SlowPage`].
pub fn slow_query(delay: Duration) -> (ActivityQuery, Arc<SlowPage>) {
    let page = Arc::new(SlowPage::new(delay));
    let extractor = Extractor::with_base("https://cdyouth.cdcyl.org.cn").unwrap();
    (ActivityQuery::new(page.clone(), extractor), page)
}

/// Query over the fixture listing, plus a handle for counting fetches.
pub fn fixture_query() -> (ActivityQuery, Arc<StaticPage>) {
    let page = Arc::new(StaticPage::new(LISTING_FIXTURE));
    let extractor = Extractor::with_base("https://cdyouth.cdcyl.org.cn").unwrap();
    (ActivityQuery::new(page.clone(), extractor), page)
}
