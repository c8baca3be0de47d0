//! Fluent request/response configuration for a [`MockTransport`].
//!
//! ```
//! use mock_http_handler::{MockRequestConfiguration, MockTransport};
//!
//! # async fn example() -> mock_http_handler::Result<()> {
//! let transport = MockTransport::new();
//!
//! MockRequestConfiguration::new()
//!     .with_method("POST")
//!     .with_address("http://api.example.com/orders")
//!     .with_status(201)
//!     .with_json_body(&serde_json::json!({"id": 1}))
//!     .install(&transport)?;
//!
//! let client = transport.create_client(Some("http://api.example.com/"))?;
//! let response = client.post_text("orders", "{}").await?;
//! assert_eq!(response.status(), 201);
//! transport.verify()?;
//! # Ok(())
//! # }
//! ```

use crate::error::{MockError, Result};
use crate::matcher::RequestMatcher;
use crate::message::HttpRequest;
use crate::response::{ResponseContent, ResponseTemplate};
use crate::transport::{InterceptRule, MockTransport, RequestHook};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Builder for a single intercept rule.
///
/// Setters consume the configuration and return the updated one; `install`
/// consumes it for good. Method and address, when both set, must both match.
pub struct MockRequestConfiguration {
    method: Option<String>,
    address: Option<String>,
    request_hook: Option<RequestHook>,
    body_hook: Option<RequestHook>,
    status: u16,
    headers: Vec<(String, String)>,
    content: Option<ResponseContent>,
    delay: Option<Duration>,
    pending_error: Option<MockError>,
}

impl Default for MockRequestConfiguration {
    fn default() -> Self {
        Self {
            method: None,
            address: None,
            request_hook: None,
            body_hook: None,
            status: 200,
            headers: Vec::new(),
            content: None,
            delay: None,
            pending_error: None,
        }
    }
}

impl std::fmt::Debug for MockRequestConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRequestConfiguration")
            .field("method", &self.method)
            .field("address", &self.address)
            .field("status", &self.status)
            .field("content", &self.content)
            .field("captures_request", &self.request_hook.is_some())
            .field("captures_body", &self.body_hook.is_some())
            .finish_non_exhaustive()
    }
}

impl MockRequestConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only match requests with this method.
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = Some(method.to_uppercase());
        self
    }

    /// Only match requests to this absolute address. Parsed at install time.
    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    /// Receive the intercepted request each time the rule fires.
    pub fn capture_request<F>(mut self, callback: F) -> Self
    where
        F: Fn(&HttpRequest) + Send + Sync + 'static,
    {
        self.request_hook = Some(Arc::new(move |request: &HttpRequest| -> Result<()> {
            callback(request);
            Ok(())
        }));
        self
    }

    /// Receive the request body deserialized from JSON. Runs after
    /// [`capture_request`](Self::capture_request).
    ///
    /// A missing or malformed body fails the send with
    /// [`MockError::RequestBody`].
    pub fn capture_request_body<T, F>(mut self, callback: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.body_hook = Some(Arc::new(move |request: &HttpRequest| -> Result<()> {
            let body = request.body().unwrap_or_default();
            let value = serde_json::from_slice::<T>(body).map_err(MockError::RequestBody)?;
            callback(value);
            Ok(())
        }));
        self
    }

    /// Response status code, 200 unless set.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Response body. Text is used verbatim.
    pub fn with_body(mut self, content: impl Into<ResponseContent>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Response body serialized to JSON. A serialization failure is reported
    /// by [`install`](Self::install).
    pub fn with_json_body<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match ResponseContent::json(value) {
            Ok(content) => self.content = Some(content),
            Err(e) => self.pending_error = Some(e),
        }
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Wait this long before returning the response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn content(&self) -> Option<&ResponseContent> {
        self.content.as_ref()
    }

    /// The matcher this configuration installs.
    pub fn matcher(&self) -> Result<RequestMatcher> {
        let url = self
            .address
            .as_deref()
            .map(|a| Url::parse(a).map_err(|e| MockError::invalid_address(a, e)))
            .transpose()?;
        Ok(RequestMatcher::from_parts(self.method.as_deref(), url))
    }

    /// Register the configured rule on `transport`. The rule is verifiable.
    pub fn install(mut self, transport: &MockTransport) -> Result<()> {
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }

        let matcher = self.matcher()?;

        let mut template = ResponseTemplate::new(self.status);
        for (name, value) in &self.headers {
            template = template.with_header(name, value);
        }
        if let Some(content) = self.content {
            template = template.with_content(content);
        }
        if let Some(delay) = self.delay {
            template = template.with_delay(delay);
        }
        template.validate()?;

        let mut rule = InterceptRule::new(matcher, template).verifiable();
        for hook in [self.request_hook, self.body_hook].into_iter().flatten() {
            rule = rule.with_hook(move |request| hook(request));
        }

        debug!(
            method = ?self.method,
            address = ?self.address,
            status = self.status,
            "Installing request configuration"
        );
        transport.setup(rule);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Transport;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct DummyObject {
        dummy_value: i32,
    }

    const SITE: &str = "http://www.somesite.com/";

    #[test]
    fn test_with_method() {
        let r = MockRequestConfiguration::new().with_method("get");
        assert_eq!(r.method(), Some("GET"));
    }

    #[test]
    fn test_with_address() {
        let r = MockRequestConfiguration::new().with_address(SITE);
        assert_eq!(r.address(), Some(SITE));
    }

    #[test]
    fn test_status_default_and_override() {
        assert_eq!(MockRequestConfiguration::new().status(), 200);
        assert_eq!(MockRequestConfiguration::new().with_status(202).status(), 202);
    }

    #[test]
    fn test_with_body_text_and_object() {
        let text = MockRequestConfiguration::new().with_body("content");
        assert_eq!(
            text.content(),
            Some(&ResponseContent::Text("content".to_string()))
        );

        let object = MockRequestConfiguration::new().with_json_body(&DummyObject { dummy_value: 3 });
        assert_eq!(
            object.content(),
            Some(&ResponseContent::Json(r#"{"dummy_value":3}"#.to_string()))
        );
    }

    #[test]
    fn test_later_setter_wins() {
        let r = MockRequestConfiguration::new()
            .with_method("GET")
            .with_method("POST");
        assert_eq!(r.method(), Some("POST"));
    }

    #[test]
    fn test_install_registers_exactly_one_rule() {
        let transport = MockTransport::new();
        MockRequestConfiguration::new().install(&transport).unwrap();
        assert_eq!(transport.rule_count(), 1);
        assert!(transport.verify().is_err());
    }

    #[test]
    fn test_install_rejects_invalid_address() {
        let transport = MockTransport::new();
        let err = MockRequestConfiguration::new()
            .with_address("nowhere")
            .install(&transport)
            .unwrap_err();
        assert!(matches!(err, MockError::InvalidAddress { .. }));
        assert_eq!(transport.rule_count(), 0);
    }

    #[test]
    fn test_install_rejects_invalid_status() {
        let transport = MockTransport::new();
        let err = MockRequestConfiguration::new()
            .with_status(99)
            .install(&transport)
            .unwrap_err();
        assert!(matches!(err, MockError::InvalidStatus(99)));
    }

    #[tokio::test]
    async fn test_no_criteria_matches_any_request() {
        let transport = MockTransport::new();
        MockRequestConfiguration::new().install(&transport).unwrap();

        for (method, address) in [("GET", SITE), ("DELETE", "http://other.example/x")] {
            let response = transport
                .send(HttpRequest::new(method, address).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
            assert!(response.body().is_none());
        }
        transport.verify().unwrap();
    }

    #[tokio::test]
    async fn test_method_only() {
        let transport = MockTransport::new();
        MockRequestConfiguration::new()
            .with_method("GET")
            .install(&transport)
            .unwrap();

        assert!(transport.send(HttpRequest::get(SITE).unwrap()).await.is_ok());
        assert!(transport
            .send(HttpRequest::get("http://other.example/").unwrap())
            .await
            .is_ok());
        let err = transport
            .send(HttpRequest::put(SITE).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, MockError::Unmatched { .. }));
    }

    #[tokio::test]
    async fn test_address_only() {
        let transport = MockTransport::new();
        MockRequestConfiguration::new()
            .with_address(SITE)
            .install(&transport)
            .unwrap();

        assert!(transport.send(HttpRequest::get(SITE).unwrap()).await.is_ok());
        assert!(transport.send(HttpRequest::delete(SITE).unwrap()).await.is_ok());
        assert!(transport
            .send(HttpRequest::get("http://www.somesite.com/other").unwrap())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_method_and_address_both_required() {
        let transport = MockTransport::new();
        MockRequestConfiguration::new()
            .with_method("POST")
            .with_address("http://x/")
            .install(&transport)
            .unwrap();

        assert!(transport.send(HttpRequest::post("http://x/").unwrap()).await.is_ok());
        assert!(transport.send(HttpRequest::put("http://x/").unwrap()).await.is_err());
        assert!(transport.send(HttpRequest::post("http://y/").unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_capture_request_once_per_call_before_response() {
        let transport = MockTransport::new();
        let calls = Arc::new(AtomicU32::new(0));
        let captured = Arc::new(Mutex::new(None));
        let (calls_hook, captured_hook) = (calls.clone(), captured.clone());

        MockRequestConfiguration::new()
            .capture_request(move |r| {
                calls_hook.fetch_add(1, Ordering::SeqCst);
                *captured_hook.lock().unwrap() = Some(r.clone());
            })
            .install(&transport)
            .unwrap();

        let sent = HttpRequest::get(SITE).unwrap().with_header("X-Id", "1");
        transport.send(sent.clone()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(captured.lock().unwrap().as_ref(), Some(&sent));

        transport.send(sent).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_capture_request_body_runs_after_capture_request() {
        let transport = MockTransport::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (first, second) = (order.clone(), order.clone());

        MockRequestConfiguration::new()
            .capture_request_body(move |body: DummyObject| {
                second.lock().unwrap().push(format!("body:{}", body.dummy_value))
            })
            .capture_request(move |_| first.lock().unwrap().push("request".to_string()))
            .install(&transport)
            .unwrap();

        let request = HttpRequest::post(SITE)
            .unwrap()
            .with_json(&DummyObject { dummy_value: 5 })
            .unwrap();
        transport.send(request).await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["request", "body:5"]);
    }

    #[tokio::test]
    async fn test_malformed_request_body_fails_loudly() {
        let transport = MockTransport::new();
        MockRequestConfiguration::new()
            .capture_request_body(|_: DummyObject| {})
            .install(&transport)
            .unwrap();

        let err = transport
            .send(HttpRequest::post(SITE).unwrap().with_text("not json"))
            .await
            .unwrap_err();
        assert!(matches!(err, MockError::RequestBody(_)));

        let err = transport
            .send(HttpRequest::post(SITE).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, MockError::RequestBody(_)));
    }

    #[tokio::test]
    async fn test_headers_and_delay() {
        let transport = MockTransport::new();
        MockRequestConfiguration::new()
            .with_header("X-Mocked", "true")
            .with_delay(Duration::from_millis(5))
            .install(&transport)
            .unwrap();

        let response = transport.send(HttpRequest::get(SITE).unwrap()).await.unwrap();
        assert_eq!(response.header("x-mocked"), Some("true"));
    }

    #[tokio::test]
    async fn test_sub_millisecond_delay_is_applied() {
        let transport = MockTransport::new();
        MockRequestConfiguration::new()
            .with_delay(Duration::from_micros(500))
            .install(&transport)
            .unwrap();

        let start = std::time::Instant::now();
        transport.send(HttpRequest::get(SITE).unwrap()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_micros(500));
    }

    #[test]
    fn test_unserializable_body_reported_at_install() {
        use std::collections::HashMap;

        // Non-string map keys cannot be represented in JSON.
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1);

        let transport = MockTransport::new();
        let err = MockRequestConfiguration::new()
            .with_json_body(&map)
            .install(&transport)
            .unwrap_err();
        assert!(matches!(err, MockError::Serialize(_)));
        assert_eq!(transport.rule_count(), 0);
    }
}
