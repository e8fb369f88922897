//! BrowserManager: the single CDP browser shared by all requests.
//!
//! The browser is launched (or attached to) once at startup. Every request
//! gets its own page from [`PageSource::new_page`] and closes it afterwards.

use crate::discovery::{CapturedResponse, PageSource, SpecPage, UrlFilter};
use crate::error::{Error, Result};
use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFinished, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::Page;
use futures::channel::mpsc;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;

/// Configuration for the BrowserManager.
#[derive(Debug, Clone)]
pub struct BrowserManagerConfig {
    /// Custom Chrome/Chromium binary path.
    pub browser_path: Option<String>,
    /// Connect to an already-running browser via CDP URL.
    pub cdp_url: Option<String>,
    /// Run headless (default: true).
    pub headless: bool,
    /// Browser window size.
    pub window_size: (u32, u32),
}

impl Default for BrowserManagerConfig {
    fn default() -> Self {
        Self {
            browser_path: None,
            cdp_url: None,
            headless: true,
            window_size: (1280, 720),
        }
    }
}

/// Owns the browser process (or CDP connection).
pub struct BrowserManager {
    browser: RwLock<Option<Browser>>,
    launched: bool,
}

impl BrowserManager {
    /// Launch Chrome, or attach to `cdp_url` when configured.
    pub async fn launch(config: BrowserManagerConfig) -> anyhow::Result<Self> {
        let (browser, mut handler, launched) = if let Some(ref cdp_url) = config.cdp_url {
            let (browser, handler) = Browser::connect(cdp_url)
                .await
                .with_context(|| format!("Failed to connect to browser at {}", cdp_url))?;
            (browser, handler, false)
        } else {
            let mut builder = BrowserConfig::builder();

            if let Some(ref path) = config.browser_path {
                builder = builder.chrome_executable(path);
            }

            if !config.headless {
                builder = builder.with_head();
            }

            builder = builder
                .window_size(config.window_size.0, config.window_size.1)
                .arg("--disable-dev-shm-usage")
                .arg("--remote-allow-origins=*");

            let browser_config = builder.build().map_err(|e| anyhow::anyhow!("{}", e))?;

            let (browser, handler) = Browser::launch(browser_config)
                .await
                .context("Failed to launch browser")?;
            (browser, handler, true)
        };

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        tracing::info!(launched, "Browser ready");

        Ok(Self {
            browser: RwLock::new(Some(browser)),
            launched,
        })
    }

    /// Close the browser. Attached browsers are only disconnected.
    pub async fn shutdown(&self) {
        let Some(mut browser) = self.browser.write().await.take() else {
            return;
        };

        if self.launched {
            if let Err(e) = browser.close().await {
                tracing::warn!(error = %e, "Failed to close browser");
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!(error = %e, "Browser did not exit cleanly");
            }
        }

        tracing::info!("Browser closed");
    }
}

#[async_trait]
impl PageSource for BrowserManager {
    async fn new_page(&self) -> Result<Box<dyn SpecPage>> {
        let guard = self.browser.read().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| Error::Upstream("Browser is not running".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::upstream("Failed to create new page", e))?;

        Ok(Box::new(ChromePage {
            page,
            tasks: Mutex::new(JoinSet::new()),
        }))
    }
}

/// A chromiumoxide page seen through the [`SpecPage`] seam.
///
/// Background listener tasks are aborted when the page is closed or dropped.
pub struct ChromePage {
    page: Page,
    tasks: Mutex<JoinSet<()>>,
}

/// The two CDP network events needed to read a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    Received { request_id: String, url: String },
    Finished { request_id: String },
}

/// Pairs `responseReceived` with `loadingFinished` by request id.
///
/// The two events arrive on separate listeners, so either may be seen first.
/// A request is ready once both have been seen and its URL passes the filter.
pub struct ResponseTracker {
    filter: UrlFilter,
    /// Matching responses still loading.
    pending: HashMap<String, String>,
    /// Non-matching responses still loading.
    ignored: HashSet<String>,
    /// Requests that finished before their response was seen.
    finished_early: HashSet<String>,
}

impl ResponseTracker {
    pub fn new(filter: UrlFilter) -> Self {
        Self {
            filter,
            pending: HashMap::new(),
            ignored: HashSet::new(),
            finished_early: HashSet::new(),
        }
    }

    /// Record an event; returns `(request_id, url)` when a body can be fetched.
    pub fn observe(&mut self, event: NetworkEvent) -> Option<(String, String)> {
        match event {
            NetworkEvent::Received { request_id, url } => {
                let matches = (self.filter)(&url);
                if self.finished_early.remove(&request_id) {
                    return matches.then_some((request_id, url));
                }
                if matches {
                    self.pending.insert(request_id, url);
                } else {
                    self.ignored.insert(request_id);
                }
                None
            }
            NetworkEvent::Finished { request_id } => {
                if let Some(url) = self.pending.remove(&request_id) {
                    return Some((request_id, url));
                }
                if !self.ignored.remove(&request_id) {
                    self.finished_early.insert(request_id);
                }
                None
            }
        }
    }
}

#[async_trait]
impl SpecPage for ChromePage {
    async fn watch_responses(
        &self,
        filter: UrlFilter,
    ) -> Result<BoxStream<'static, CapturedResponse>> {
        self.page
            .execute(EnableParams::default())
            .await
            .map_err(|e| Error::upstream("Failed to enable network events", e))?;

        let received = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| Error::upstream("Failed to observe responses", e))?;
        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(|e| Error::upstream("Failed to observe responses", e))?;

        let page = self.page.clone();
        let (tx, rx) = mpsc::unbounded();

        // Bodies are only readable once loading has finished.
        self.tasks.lock().await.spawn(async move {
            let mut events = Box::pin(futures::stream::select(
                received.map(|event| NetworkEvent::Received {
                    request_id: event.request_id.inner().clone(),
                    url: event.response.url.clone(),
                }),
                finished.map(|event| NetworkEvent::Finished {
                    request_id: event.request_id.inner().clone(),
                }),
            ));
            let mut tracker = ResponseTracker::new(filter);

            while let Some(event) = events.next().await {
                if tx.is_closed() {
                    break;
                }
                let Some((request_id, url)) = tracker.observe(event) else {
                    continue;
                };
                match response_body(&page, RequestId::new(request_id)).await {
                    Ok(body) => {
                        if tx.unbounded_send(CapturedResponse { url, body }).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::debug!(%url, error = %e, "Could not read response body"),
                }
            }
        });

        Ok(rx.boxed())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(|e| Error::upstream("Failed to enable lifecycle events", e))?;

        let mut lifecycle = self
            .page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| Error::upstream("Failed to observe page lifecycle", e))?;

        self.page
            .goto(url)
            .await
            .map_err(|e| Error::upstream("Navigation failed", e))?;

        let main_frame = self
            .page
            .mainframe()
            .await
            .map_err(|e| Error::upstream("Failed to resolve main frame", e))?;

        while let Some(event) = lifecycle.next().await {
            let in_main_frame = main_frame.as_ref().map_or(true, |id| *id == event.frame_id);
            if in_main_frame && event.name == "networkIdle" {
                break;
            }
        }

        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate_expression(expression)
            .await
            .map_err(|e| Error::upstream("Script evaluation failed", e))?;

        Ok(result.into_value::<Value>().unwrap_or(Value::Null))
    }

    async fn close(&self) -> Result<()> {
        self.tasks.lock().await.abort_all();
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| Error::upstream("Failed to close page", e))
    }
}

async fn response_body(page: &Page, request_id: RequestId) -> anyhow::Result<String> {
    let reply = page.execute(GetResponseBodyParams::new(request_id)).await?;
    let returns = reply.result;

    if returns.base64_encoded {
        let bytes = BASE64
            .decode(returns.body.as_bytes())
            .context("Response body is not valid base64")?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        Ok(returns.body)
    }
}
