//! Per-request orchestration: open a page, discover, project, close the page.

use crate::discovery::{self, DiscoveryConfig, PageSource, SpecPage};
use crate::document::SpecDocument;
use crate::error::Result;
use crate::projection::{self, ExploreOptions, Projection, ResponseEntry};
use std::sync::Arc;

/// Entry point shared by the HTTP API and the MCP tools.
pub struct Explorer {
    pages: Arc<dyn PageSource>,
    config: DiscoveryConfig,
}

impl Explorer {
    pub fn new(pages: Arc<dyn PageSource>, config: DiscoveryConfig) -> Self {
        Self { pages, config }
    }

    pub async fn explore(&self, url: &str, options: &ExploreOptions) -> Result<Projection> {
        let doc = self.fetch_spec(url).await?;
        Ok(projection::project(&doc, options))
    }

    pub async fn response_schemas(
        &self,
        url: &str,
        path: &str,
        method: &str,
    ) -> Result<Vec<ResponseEntry>> {
        let doc = self.fetch_spec(url).await?;
        Ok(projection::extract_responses(&doc, path, method))
    }

    /// Discovery on a dedicated page; the page is closed on every outcome,
    /// including cancellation of the returned future.
    async fn fetch_spec(&self, url: &str) -> Result<SpecDocument> {
        let mut page = OpenPage::new(self.pages.new_page().await?, url);
        let result = discovery::discover(page.page.as_ref(), url, &self.config).await;
        page.close().await;

        if let Ok(ref doc) = result {
            tracing::info!(
                %url,
                version = doc.version().unwrap_or("unknown"),
                "Specification discovered"
            );
        }
        result
    }
}

/// Closes its page when dropped without an explicit [`OpenPage::close`].
struct OpenPage {
    page: Arc<dyn SpecPage>,
    url: String,
    closed: bool,
}

impl OpenPage {
    fn new(page: Box<dyn SpecPage>, url: &str) -> Self {
        Self {
            page: Arc::from(page),
            url: url.to_string(),
            closed: false,
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.page.close().await {
            tracing::warn!(url = %self.url, error = %e, "Failed to close page");
        }
        self.closed = true;
    }
}

impl Drop for OpenPage {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(url = %self.url, "Page dropped outside a runtime, left open");
            return;
        };

        tracing::debug!(url = %self.url, "Request cancelled, closing page");
        let page = self.page.clone();
        let url = std::mem::take(&mut self.url);
        runtime.spawn(async move {
            if let Err(e) = page.close().await {
                tracing::warn!(%url, error = %e, "Failed to close page");
            }
        });
    }
}
