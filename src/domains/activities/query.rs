//! Activity query: fetch, extract, then cap.

use std::sync::Arc;

use tracing::{info, instrument};

use super::error::ActivityResult;
use super::extractor::Extractor;
use super::fetcher::{HttpFetcher, PageSource};
use super::model::Activity;
use crate::core::config::SourceConfig;

/// Composes a page source with the extractor.
///
/// Stateless between calls: every query reads the live page again.
pub struct ActivityQuery {
    source: Arc<dyn PageSource>,
    extractor: Extractor,
}

impl ActivityQuery {
    /// Create a query over an arbitrary page source.
    pub fn new(source: Arc<dyn PageSource>, extractor: Extractor) -> Self {
        Self { source, extractor }
    }

    /// Create a query that fetches the configured listing over HTTP.
    pub fn from_config(config: &SourceConfig) -> ActivityResult<Self> {
        let fetcher = HttpFetcher::new(config)?;
        let extractor = Extractor::with_base(&config.base_url)?;
        Ok(Self::new(Arc::new(fetcher), extractor))
    }

    /// Fetch and extract the listing, keeping at most `limit` leading items.
    ///
    /// `limit` is trusted here; range checks happen at the tool boundary.
    #[instrument(skip(self))]
    pub async fn get_activities(&self, limit: Option<usize>) -> ActivityResult<Vec<Activity>> {
        let html = self.source.fetch_page().await?;
        let mut activities = self.extractor.extract(&html)?;
        let total = activities.len();

        if let Some(limit) = limit {
            activities.truncate(limit);
        }

        info!(total, returned = activities.len(), "Activity query completed");
        Ok(activities)
    }
}
