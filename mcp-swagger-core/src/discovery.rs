//! Locating the Swagger/OpenAPI document behind a documentation page.
//!
//! Two tiers, tried in order:
//! 1. Network: every response whose URL mentions `swagger` or `openapi` is
//!    parsed as JSON (or YAML when it looks like one). First parse wins.
//! 2. Page state: read the spec the Swagger UI instance keeps on `window.ui`.
//!
//! The network tier is raced against a timer once navigation settles.

use crate::document::SpecDocument;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinSet;

/// Reads the spec a Swagger UI bundle exposes on `window.ui`.
pub const UI_SPEC_EXPRESSION: &str = r#"(() => {
    const ui = window.ui;
    if (!ui) return null;
    if (ui.spec && ui.spec.json) return ui.spec.json;
    if (typeof ui.spec === 'function') {
        const spec = ui.spec();
        const plain = spec && typeof spec.toJS === 'function' ? spec.toJS() : spec;
        return plain && plain.json ? plain.json : null;
    }
    return null;
})()"#;

/// Body of a network response the page received.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub url: String,
    pub body: String,
}

/// Predicate over response URLs, applied before bodies are fetched.
pub type UrlFilter = fn(&str) -> bool;

/// The slice of a browser page discovery needs.
#[async_trait]
pub trait SpecPage: Send + Sync {
    /// Start observing responses. Must be called before [`SpecPage::goto`];
    /// yields the responses whose URL passes `filter`, in arrival order.
    async fn watch_responses(
        &self,
        filter: UrlFilter,
    ) -> Result<BoxStream<'static, CapturedResponse>>;

    /// Navigate and wait until network activity is idle.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Evaluate a JavaScript expression; non-serializable results read as `null`.
    async fn evaluate(&self, expression: &str) -> Result<Value>;

    async fn close(&self) -> Result<()>;
}

/// Hands out one fresh page per request.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn SpecPage>>;
}

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// How long to wait for a spec response once navigation has settled.
    pub network_timeout: Duration,
    /// Upper bound for navigation, including the network-idle wait.
    pub navigation_timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            network_timeout: Duration::from_secs(5),
            navigation_timeout: Duration::from_secs(30),
        }
    }
}

pub fn is_spec_url(url: &str) -> bool {
    url.contains("swagger") || url.contains("openapi")
}

/// Parse a response body as a spec document.
///
/// JSON first; YAML only when the text carries an `openapi:` or `swagger:` key.
pub fn parse_spec_body(body: &str) -> Option<SpecDocument> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => SpecDocument::from_value(value),
        Err(_) if body.contains("openapi:") || body.contains("swagger:") => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(body).ok()?;
            yaml_to_json(yaml).and_then(SpecDocument::from_value)
        }
        Err(_) => None,
    }
}

/// YAML allows non-string keys (`200:` is an integer); JSON objects do not.
fn yaml_to_json(value: serde_yaml::Value) -> Option<Value> {
    use serde_yaml::Value as Yaml;

    Some(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => {
            Value::Array(items.into_iter().filter_map(yaml_to_json).collect())
        }
        Yaml::Mapping(mapping) => {
            let mut object = serde_json::Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    Yaml::Null => "null".to_string(),
                    _ => return None,
                };
                object.insert(key, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

/// Find the spec behind `url` using an already opened `page`.
pub async fn discover(
    page: &dyn SpecPage,
    url: &str,
    config: &DiscoveryConfig,
) -> Result<SpecDocument> {
    let mut responses = page.watch_responses(is_spec_url).await?;

    let (tx, rx) = oneshot::channel();
    // Dropping the set aborts the watcher, including when this future is cancelled.
    let mut watcher = JoinSet::new();
    watcher.spawn(async move {
        while let Some(response) = responses.next().await {
            if let Some(doc) = parse_spec_body(&response.body) {
                tracing::debug!(url = %response.url, "Specification captured from network");
                let _ = tx.send(doc);
                return;
            }
            tracing::trace!(url = %response.url, "Matching response is not a specification");
        }
    });

    let navigation = match tokio::time::timeout(config.navigation_timeout, page.goto(url)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Upstream(format!(
            "Navigation to {} timed out after {}ms",
            url,
            config.navigation_timeout.as_millis()
        ))),
    };
    if let Err(e) = navigation {
        watcher.abort_all();
        return Err(e);
    }

    let captured = match tokio::time::timeout(config.network_timeout, rx).await {
        Ok(Ok(doc)) => Some(doc),
        Ok(Err(_)) => None,
        Err(_) => {
            tracing::debug!(%url, "No specification response before timeout");
            None
        }
    };
    watcher.abort_all();

    if let Some(doc) = captured {
        return Ok(doc);
    }

    let value = page.evaluate(UI_SPEC_EXPRESSION).await?;
    match SpecDocument::from_value(value) {
        Some(doc) => {
            tracing::debug!(%url, "Specification read from page state");
            Ok(doc)
        }
        None => {
            tracing::warn!(%url, "No specification found");
            Err(Error::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde_json::json;
    use std::sync::Mutex;

    const SHORT: Duration = Duration::from_millis(100);

    #[derive(Default)]
    struct ScriptedPage {
        responses: Vec<(Duration, CapturedResponse)>,
        ui_spec: Value,
        navigation_delay: Duration,
        navigation_error: Option<String>,
        evaluated: Mutex<Vec<String>>,
    }

    impl ScriptedPage {
        fn respond(mut self, delay_ms: u64, url: &str, body: &str) -> Self {
            self.responses.push((
                Duration::from_millis(delay_ms),
                CapturedResponse {
                    url: url.to_string(),
                    body: body.to_string(),
                },
            ));
            self
        }
    }

    #[async_trait]
    impl SpecPage for ScriptedPage {
        async fn watch_responses(
            &self,
            filter: UrlFilter,
        ) -> Result<BoxStream<'static, CapturedResponse>> {
            let responses = self.responses.clone();
            Ok(stream::iter(responses)
                .then(|(delay, response)| async move {
                    tokio::time::sleep(delay).await;
                    response
                })
                .filter(move |response| futures::future::ready(filter(&response.url)))
                .boxed())
        }

        async fn goto(&self, _url: &str) -> Result<()> {
            tokio::time::sleep(self.navigation_delay).await;
            match &self.navigation_error {
                Some(message) => Err(Error::Upstream(message.clone())),
                None => Ok(()),
            }
        }

        async fn evaluate(&self, expression: &str) -> Result<Value> {
            self.evaluated.lock().unwrap().push(expression.to_string());
            Ok(self.ui_spec.clone())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    fn config() -> DiscoveryConfig {
        DiscoveryConfig {
            network_timeout: SHORT,
            navigation_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_is_spec_url() {
        assert!(is_spec_url("https://api.example.com/openapi.json"));
        assert!(is_spec_url("https://api.example.com/v2/swagger.yaml"));
        assert!(!is_spec_url("https://api.example.com/docs/index.html"));
    }

    #[test]
    fn test_parse_json_body() {
        let doc = parse_spec_body(r#"{"openapi": "3.1.0", "paths": {"/a": {"get": {}}}}"#).unwrap();
        assert_eq!(doc.version(), Some("3.1.0"));
    }

    #[test]
    fn test_parse_yaml_body_with_numeric_keys() {
        let body = "openapi: 3.0.0\npaths:\n  /pets:\n    get:\n      responses:\n        200:\n          description: ok\n";
        let doc = parse_spec_body(body).unwrap();
        let responses = doc.responses("/pets", "get").unwrap();
        assert_eq!(responses["200"]["description"], "ok");
    }

    #[test]
    fn test_parse_rejects_other_bodies() {
        assert!(parse_spec_body("window.ui = SwaggerUIBundle({})").is_none());
        assert!(parse_spec_body("paths:\n  /a: {}\n").is_none());
        assert!(parse_spec_body("[1, 2, 3]").is_none());
    }

    #[tokio::test]
    async fn test_network_response_wins() {
        let page = ScriptedPage {
            ui_spec: json!({ "paths": { "/from-ui": {} } }),
            ..Default::default()
        }
        .respond(0, "https://x.test/app.js", r#"{"paths": {"/wrong": {}}}"#)
        .respond(5, "https://x.test/openapi.json", r#"{"paths": {"/pets": {"get": {}}}}"#);

        let doc = discover(&page, "https://x.test/docs", &config()).await.unwrap();
        assert!(doc.paths.unwrap().contains_key("/pets"));
        assert!(page.evaluated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_parseable_match_wins() {
        let page = ScriptedPage::default()
            .respond(0, "https://x.test/swagger-ui.css", "body { color: red }")
            .respond(5, "https://x.test/swagger.json", r#"{"paths": {"/first": {}}}"#)
            .respond(5, "https://x.test/openapi.json", r#"{"paths": {"/second": {}}}"#);

        let doc = discover(&page, "https://x.test/docs", &config()).await.unwrap();
        let paths = doc.paths.unwrap();
        assert!(paths.contains_key("/first"));
        assert!(!paths.contains_key("/second"));
    }

    #[tokio::test]
    async fn test_falls_back_to_page_state() {
        let page = ScriptedPage {
            ui_spec: json!({ "swagger": "2.0", "definitions": { "Pet": {} } }),
            ..Default::default()
        };

        let doc = discover(&page, "https://x.test/docs", &config()).await.unwrap();
        assert!(doc.definitions.unwrap().contains_key("Pet"));
        assert_eq!(
            page.evaluated.lock().unwrap().as_slice(),
            [UI_SPEC_EXPRESSION.to_string()]
        );
    }

    #[tokio::test]
    async fn test_late_response_falls_back_after_timeout() {
        let page = ScriptedPage {
            ui_spec: json!({ "paths": { "/from-ui": {} } }),
            ..Default::default()
        }
        .respond(1_000, "https://x.test/openapi.json", r#"{"paths": {"/late": {}}}"#);

        let doc = discover(&page, "https://x.test/docs", &config()).await.unwrap();
        assert!(doc.paths.unwrap().contains_key("/from-ui"));
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let page = ScriptedPage::default().respond(0, "https://x.test/openapi.json", "not a spec");

        let err = discover(&page, "https://x.test/docs", &config()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound));
        assert_eq!(err.to_string(), "Could not find Swagger/OpenAPI specification");
    }

    #[tokio::test]
    async fn test_navigation_failure_is_reported() {
        let page = ScriptedPage {
            navigation_error: Some("net::ERR_NAME_NOT_RESOLVED".to_string()),
            ..Default::default()
        };

        let err = discover(&page, "https://nowhere.test", &config()).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(ref m) if m.contains("ERR_NAME_NOT_RESOLVED")));
    }

    #[tokio::test]
    async fn test_navigation_timeout() {
        let page = ScriptedPage {
            navigation_delay: Duration::from_secs(5),
            ..Default::default()
        };
        let config = DiscoveryConfig {
            network_timeout: SHORT,
            navigation_timeout: SHORT,
        };

        let err = discover(&page, "https://slow.test", &config).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
