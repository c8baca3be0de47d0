//! Canned responses returned by intercept rules.

use crate::error::{MockError, Result};
use crate::message::HttpResponse;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// A response body given to a rule: either text used verbatim or a value
/// that was serialized to JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseContent {
    Text(String),
    Json(String),
    Bytes(Vec<u8>),
}

impl ResponseContent {
    /// Serialize any value to JSON content.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_string(value)
            .map(ResponseContent::Json)
            .map_err(MockError::Serialize)
    }

    fn content_type(&self) -> &'static str {
        match self {
            ResponseContent::Text(_) => "text/plain; charset=utf-8",
            ResponseContent::Json(_) => "application/json",
            ResponseContent::Bytes(_) => "application/octet-stream",
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            ResponseContent::Text(s) | ResponseContent::Json(s) => s.into_bytes(),
            ResponseContent::Bytes(b) => b,
        }
    }
}

impl From<&str> for ResponseContent {
    fn from(value: &str) -> Self {
        ResponseContent::Text(value.to_string())
    }
}

impl From<String> for ResponseContent {
    fn from(value: String) -> Self {
        ResponseContent::Text(value)
    }
}

impl From<serde_json::Value> for ResponseContent {
    fn from(value: serde_json::Value) -> Self {
        ResponseContent::Json(value.to_string())
    }
}

impl From<Vec<u8>> for ResponseContent {
    fn from(value: Vec<u8>) -> Self {
        ResponseContent::Bytes(value)
    }
}

/// Status, headers, body and optional latency of a canned response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTemplate {
    status: u16,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
    delay: Option<Duration>,
}

impl Default for ResponseTemplate {
    fn default() -> Self {
        Self::new(200)
    }
}

impl ResponseTemplate {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: None,
            delay: None,
        }
    }

    /// Add or replace a header (case-insensitive).
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Set the body and a matching `Content-Type` unless one is already set.
    pub fn with_content(mut self, content: impl Into<ResponseContent>) -> Self {
        let content = content.into();
        if !self.headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
            self = self.with_header("Content-Type", content.content_type());
        }
        self.body = Some(content.into_bytes());
        self
    }

    /// Set raw body bytes without touching headers.
    pub fn with_raw_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Hold the response back for `delay` before returning it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Reject status codes outside 100..=599.
    pub fn validate(&self) -> Result<()> {
        if !(100..=599).contains(&self.status) {
            return Err(MockError::InvalidStatus(self.status));
        }
        Ok(())
    }

    /// Produce a fresh response.
    pub fn build(&self) -> HttpResponse {
        let mut response = HttpResponse::new(self.status);
        for (name, value) in &self.headers {
            response = response.with_header(name, value);
        }
        if let Some(body) = &self.body {
            response = response.with_body(body.clone());
        }
        response
    }
}
