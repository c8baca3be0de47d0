//! Request and response messages routed through a transport.

use crate::error::{MockError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use url::Url;

/// An outgoing HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: String,
    url: Url,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a request for an absolute address.
    pub fn new(method: &str, address: &str) -> Result<Self> {
        let url = Url::parse(address).map_err(|e| MockError::invalid_address(address, e))?;
        Ok(Self::from_url(method, url))
    }

    /// Create a request for an already parsed URL.
    pub fn from_url(method: &str, url: Url) -> Self {
        Self {
            method: method.to_uppercase(),
            url,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn get(address: &str) -> Result<Self> {
        Self::new("GET", address)
    }

    pub fn post(address: &str) -> Result<Self> {
        Self::new("POST", address)
    }

    pub fn put(address: &str) -> Result<Self> {
        Self::new("PUT", address)
    }

    pub fn delete(address: &str) -> Result<Self> {
        Self::new("DELETE", address)
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Set a raw body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a plain text body.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(text.into())
    }

    /// Set a JSON body serialized from `value`.
    pub fn with_json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value).map_err(MockError::Serialize)?;
        Ok(self
            .with_header("Content-Type", "application/json")
            .with_body(body))
    }

    /// Upper-case request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Body as UTF-8 text, if present and valid.
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Whether two requests address the same resource with the same payload.
    ///
    /// Headers are ignored since clients are free to add their own.
    pub fn same_as(&self, other: &HttpRequest) -> bool {
        self.method == other.method && self.url == other.url && self.body == other.body
    }
}

/// A response produced by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// True for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Raw content; `None` when the response carries no content at all.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Body as text. A response without content reads as an empty string.
    pub fn text(&self) -> Result<String> {
        let bytes = self.body.clone().unwrap_or_default();
        Ok(String::from_utf8(bytes)?)
    }

    /// Body deserialized from JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = self.body.as_deref().unwrap_or_default();
        serde_json::from_slice(bytes).map_err(MockError::ResponseJson)
    }
}

fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
