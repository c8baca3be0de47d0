//! Minimal HTTP client driven by a [`Transport`].
//!
//! Code under test talks to an [`HttpClient`]; tests wire it to a
//! [`MockTransport`](crate::MockTransport) instead of the network.

use crate::error::{MockError, Result};
use crate::message::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// Client sending requests through a shared transport.
///
/// Dropping the client disposes its transport.
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    base_address: Option<Url>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_address", &self.base_address.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a client without a base address; every path must be absolute.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_address: None,
        }
    }

    /// Create a client resolving relative paths against `base_address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base address is not an absolute URL.
    pub fn with_base_address(transport: Arc<dyn Transport>, base_address: &str) -> Result<Self> {
        let base = Url::parse(base_address)
            .map_err(|e| MockError::invalid_address(base_address, e))?;

        Ok(Self {
            transport,
            base_address: Some(base),
        })
    }

    pub fn base_address(&self) -> Option<&Url> {
        self.base_address.as_ref()
    }

    /// Resolve `path` to an absolute URL.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        match Url::parse(path) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_address {
                Some(base) => base
                    .join(path)
                    .map_err(|e| MockError::invalid_address(path, e)),
                None => Err(MockError::invalid_address(
                    path,
                    url::ParseError::RelativeUrlWithoutBase,
                )),
            },
            Err(e) => Err(MockError::invalid_address(path, e)),
        }
    }

    /// Send a fully built request.
    #[tracing::instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.transport.send(request).await
    }

    /// Make a GET request.
    pub async fn get(&self, path: &str) -> Result<HttpResponse> {
        let url = self.resolve(path)?;
        self.send(HttpRequest::from_url("GET", url)).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<HttpResponse> {
        let url = self.resolve(path)?;
        self.send(HttpRequest::from_url("DELETE", url)).await
    }

    /// Make a POST request with a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<HttpResponse> {
        let url = self.resolve(path)?;
        let request = HttpRequest::from_url("POST", url).with_json(body)?;
        self.send(request).await
    }

    /// Make a PUT request with a JSON body.
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<HttpResponse> {
        let url = self.resolve(path)?;
        let request = HttpRequest::from_url("PUT", url).with_json(body)?;
        self.send(request).await
    }

    /// Make a POST request with a plain text body.
    pub async fn post_text(&self, path: &str, body: &str) -> Result<HttpResponse> {
        let url = self.resolve(path)?;
        self.send(HttpRequest::from_url("POST", url).with_text(body)).await
    }
}

impl Drop for HttpClient {
    fn drop(&mut self) {
        self.transport.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::times::Times;
    use crate::transport::{MockTransport, ResponseSetup};

    const BASE: &str = "http://www.site.com.br/";

    #[test]
    fn test_base_address() {
        let transport = MockTransport::new();
        let client = transport.create_client(Some(BASE)).unwrap();
        assert_eq!(client.base_address().map(Url::as_str), Some(BASE));
    }

    #[test]
    fn test_invalid_base_address() {
        let transport = MockTransport::new();
        let err = transport.create_client(Some("relative/path")).unwrap_err();
        assert!(matches!(err, MockError::InvalidAddress { .. }));
    }

    #[test]
    fn test_resolve() {
        let transport = MockTransport::new();
        let client = transport.create_client(Some("http://api.example.com/v1/")).unwrap();

        assert_eq!(
            client.resolve("users/7").unwrap().as_str(),
            "http://api.example.com/v1/users/7"
        );
        assert_eq!(
            client.resolve("http://other.example.com/x").unwrap().as_str(),
            "http://other.example.com/x"
        );

        let bare = transport.create_client(None).unwrap();
        assert!(bare.resolve("users/7").is_err());
    }

    #[tokio::test]
    async fn test_requests_go_through_transport() {
        let transport = MockTransport::new();
        transport
            .setup_response(ResponseSetup::new().content("pong"))
            .unwrap();
        let client = transport.create_client(Some(BASE)).unwrap();

        let response = client.get("ping").await.unwrap();
        assert_eq!(response.text().unwrap(), "pong");

        client.post_json("items", &serde_json::json!({"a": 1})).await.unwrap();
        client.put_json("items/1", &serde_json::json!({"a": 2})).await.unwrap();
        client.post_text("notes", "hi").await.unwrap();
        client.delete("items/1").await.unwrap();

        let methods: Vec<String> = transport
            .received_requests()
            .iter()
            .map(|r| r.method().to_string())
            .collect();
        assert_eq!(methods, vec!["GET", "POST", "PUT", "POST", "DELETE"]);

        let put = &transport.received_requests()[2];
        assert_eq!(put.url().as_str(), "http://www.site.com.br/items/1");
        assert_eq!(put.body_text(), Some(r#"{"a":2}"#));
    }

    #[test]
    fn test_drop_disposes_transport() {
        let transport = MockTransport::new();
        let client = transport.create_client(None).unwrap();
        transport.verify_disposed(Times::Never).unwrap();

        drop(client);
        transport.verify_disposed(Times::Once).unwrap();
    }
}
