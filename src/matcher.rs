//! Request matching logic.
//!
//! Decides whether an intercepted request is handled by an intercept rule.

use crate::error::{MockError, Result};
use crate::message::HttpRequest;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Arbitrary predicate over an intercepted request.
pub type RequestPredicate = Arc<dyn Fn(&HttpRequest) -> bool + Send + Sync>;

/// The primary criterion of a rule.
#[derive(Clone)]
pub enum Criteria {
    /// Matches every request.
    Any,
    /// Method equality (case-insensitive).
    Method(String),
    /// Address equality.
    Address(Url),
    /// Method and address must both match.
    MethodAndAddress { method: String, url: Url },
    /// Same method, URL and body as the given request.
    Exact(HttpRequest),
    /// Caller supplied predicate.
    Predicate(RequestPredicate),
}

impl fmt::Debug for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::Any => f.write_str("Any"),
            Criteria::Method(m) => f.debug_tuple("Method").field(m).finish(),
            Criteria::Address(u) => f.debug_tuple("Address").field(&u.as_str()).finish(),
            Criteria::MethodAndAddress { method, url } => f
                .debug_struct("MethodAndAddress")
                .field("method", method)
                .field("url", &url.as_str())
                .finish(),
            Criteria::Exact(r) => f.debug_tuple("Exact").field(r).finish(),
            Criteria::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Matches requests against one [`Criteria`].
#[derive(Clone, Debug)]
pub struct RequestMatcher {
    criteria: Criteria,
}

impl RequestMatcher {
    fn with_criteria(criteria: Criteria) -> Self {
        Self { criteria }
    }

    pub fn any() -> Self {
        Self::with_criteria(Criteria::Any)
    }

    pub fn method(method: &str) -> Self {
        Self::with_criteria(Criteria::Method(method.to_uppercase()))
    }

    /// Match an absolute address. Fails when the address does not parse.
    pub fn address(address: &str) -> Result<Self> {
        let url = Url::parse(address).map_err(|e| MockError::invalid_address(address, e))?;
        Ok(Self::with_criteria(Criteria::Address(url)))
    }

    pub fn method_and_address(method: &str, address: &str) -> Result<Self> {
        let url = Url::parse(address).map_err(|e| MockError::invalid_address(address, e))?;
        Ok(Self::from_parts(Some(method), Some(url)))
    }

    /// Build the criterion from optional method and address.
    ///
    /// Neither set matches anything, one set matches on that alone, both set
    /// requires both.
    pub fn from_parts(method: Option<&str>, url: Option<Url>) -> Self {
        let criteria = match (method, url) {
            (None, None) => Criteria::Any,
            (Some(method), None) => Criteria::Method(method.to_uppercase()),
            (None, Some(url)) => Criteria::Address(url),
            (Some(method), Some(url)) => Criteria::MethodAndAddress {
                method: method.to_uppercase(),
                url,
            },
        };
        Self::with_criteria(criteria)
    }

    /// Match requests equal to `request` in method, URL and body.
    pub fn exact(request: HttpRequest) -> Self {
        Self::with_criteria(Criteria::Exact(request))
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&HttpRequest) -> bool + Send + Sync + 'static,
    {
        Self::with_criteria(Criteria::Predicate(Arc::new(predicate)))
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Check a request against the criterion.
    pub fn matches(&self, request: &HttpRequest) -> bool {
        match &self.criteria {
            Criteria::Any => true,
            Criteria::Method(method) => request.method().eq_ignore_ascii_case(method),
            Criteria::Address(url) => request.url() == url,
            Criteria::MethodAndAddress { method, url } => {
                request.method().eq_ignore_ascii_case(method) && request.url() == url
            }
            Criteria::Exact(expected) => expected.same_as(request),
            Criteria::Predicate(predicate) => predicate(request),
        }
    }
}

impl Default for RequestMatcher {
    fn default() -> Self {
        Self::any()
    }
}
