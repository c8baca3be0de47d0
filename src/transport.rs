//! Interceptable mock transport.
//!
//! [`MockTransport`] stands in for the component that puts requests on the
//! wire. Tests install intercept rules on it; every request sent through it is
//! recorded and either answered by the newest matching rule or rejected.

use crate::client::HttpClient;
use crate::error::{MockError, Result};
use crate::matcher::RequestMatcher;
use crate::message::{HttpRequest, HttpResponse};
use crate::response::{ResponseContent, ResponseTemplate};
use crate::times::Times;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, warn};

/// Sends requests and produces responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for its response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Release the transport. Called when an owning client is dropped.
    fn dispose(&self) {}
}

/// Callback run against a matched request before the response is returned.
pub type RequestHook = Arc<dyn Fn(&HttpRequest) -> Result<()> + Send + Sync>;

/// A matcher paired with the response it produces.
#[derive(Clone)]
pub struct InterceptRule {
    matcher: RequestMatcher,
    response: ResponseTemplate,
    hooks: Vec<RequestHook>,
    verifiable: bool,
}

impl InterceptRule {
    pub fn new(matcher: RequestMatcher, response: ResponseTemplate) -> Self {
        Self {
            matcher,
            response,
            hooks: Vec::new(),
            verifiable: false,
        }
    }

    /// Append a hook. Hooks run in the order they were added.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Require the rule to fire at least once for [`MockTransport::verify`].
    pub fn verifiable(mut self) -> Self {
        self.verifiable = true;
        self
    }

    pub fn is_verifiable(&self) -> bool {
        self.verifiable
    }

    pub fn matcher(&self) -> &RequestMatcher {
        &self.matcher
    }

    pub fn response(&self) -> &ResponseTemplate {
        &self.response
    }
}

impl fmt::Debug for InterceptRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptRule")
            .field("matcher", &self.matcher)
            .field("response", &self.response)
            .field("hooks", &self.hooks.len())
            .field("verifiable", &self.verifiable)
            .finish()
    }
}

/// Shorthand response configuration used by the `setup_response*` family.
pub struct ResponseSetup {
    status: u16,
    content: Option<ResponseContent>,
    action: Option<Arc<dyn Fn(&HttpRequest) + Send + Sync>>,
    verifiable_dispose: bool,
}

impl Default for ResponseSetup {
    fn default() -> Self {
        Self {
            status: 200,
            content: None,
            action: None,
            verifiable_dispose: true,
        }
    }
}

impl ResponseSetup {
    /// 200 with no content, dispose verifiable.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn content(mut self, content: impl Into<ResponseContent>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Receive every matched request.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&HttpRequest) + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Whether [`MockTransport::verify`] should also require a dispose.
    pub fn verifiable_dispose(mut self, verifiable: bool) -> Self {
        self.verifiable_dispose = verifiable;
        self
    }
}

struct RegisteredRule {
    rule: InterceptRule,
    calls: AtomicU32,
}

#[derive(Default)]
struct Inner {
    rules: RwLock<Vec<Arc<RegisteredRule>>>,
    received: Mutex<Vec<HttpRequest>>,
    disposed: AtomicU32,
    dispose_verifiable: AtomicBool,
}

impl Inner {
    fn received(&self) -> MutexGuard<'_, Vec<HttpRequest>> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find_rule(&self, request: &HttpRequest) -> Option<Arc<RegisteredRule>> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        rules
            .iter()
            .rev()
            .find(|r| r.rule.matcher.matches(request))
            .cloned()
    }
}

/// Strict in-process transport. Cheap to clone; clones share rules and
/// recorded calls.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("rules", &self.rule_count())
            .field("received", &self.inner.received().len())
            .finish_non_exhaustive()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an intercept rule. Later rules take precedence over earlier
    /// ones when both match.
    pub fn setup(&self, rule: InterceptRule) {
        debug!(
            criteria = ?rule.matcher.criteria(),
            status = rule.response.status(),
            verifiable = rule.verifiable,
            "Installing intercept rule"
        );
        let mut rules = self
            .inner
            .rules
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        rules.push(Arc::new(RegisteredRule {
            rule,
            calls: AtomicU32::new(0),
        }));
    }

    /// Number of installed rules.
    pub fn rule_count(&self) -> usize {
        self.inner
            .rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Answer any request.
    pub fn setup_response(&self, setup: ResponseSetup) -> Result<()> {
        self.setup_shorthand(RequestMatcher::any(), setup)
    }

    /// Answer requests equal to `request` in method, URL and body.
    pub fn setup_response_for(&self, request: HttpRequest, setup: ResponseSetup) -> Result<()> {
        self.setup_shorthand(RequestMatcher::exact(request), setup)
    }

    /// Answer requests accepted by `predicate`.
    pub fn setup_response_when<F>(&self, predicate: F, setup: ResponseSetup) -> Result<()>
    where
        F: Fn(&HttpRequest) -> bool + Send + Sync + 'static,
    {
        self.setup_shorthand(RequestMatcher::predicate(predicate), setup)
    }

    fn setup_shorthand(&self, matcher: RequestMatcher, setup: ResponseSetup) -> Result<()> {
        let mut template = ResponseTemplate::new(setup.status);
        if let Some(content) = setup.content {
            template = template.with_content(content);
        }
        template.validate()?;

        let mut rule = InterceptRule::new(matcher, template).verifiable();
        if let Some(action) = setup.action {
            rule = rule.with_hook(move |request| {
                action(request);
                Ok(())
            });
        }
        self.setup(rule);

        if setup.verifiable_dispose {
            self.mark_dispose_verifiable();
        }
        Ok(())
    }

    /// Make [`verify`](Self::verify) also require the transport to have been
    /// disposed.
    pub fn mark_dispose_verifiable(&self) {
        self.inner.dispose_verifiable.store(true, Ordering::SeqCst);
    }

    /// A client that sends through this transport.
    pub fn create_client(&self, base_address: Option<&str>) -> Result<HttpClient> {
        let transport: Arc<dyn Transport> = Arc::new(self.clone());
        match base_address {
            Some(base) => HttpClient::with_base_address(transport, base),
            None => Ok(HttpClient::new(transport)),
        }
    }

    /// Every request sent so far, in order.
    pub fn received_requests(&self) -> Vec<HttpRequest> {
        self.inner.received().clone()
    }

    /// How many times the transport was disposed.
    pub fn dispose_count(&self) -> u32 {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Check that every verifiable rule fired at least once and, if marked,
    /// that the transport was disposed.
    pub fn verify(&self) -> Result<()> {
        let rules = self
            .inner
            .rules
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let uncalled: Vec<String> = rules
            .iter()
            .filter(|r| r.rule.verifiable && r.calls.load(Ordering::SeqCst) == 0)
            .map(|r| format!("{:?}", r.rule.matcher.criteria()))
            .collect();

        if !uncalled.is_empty() {
            warn!(rules = ?uncalled, "Verifiable rules were never invoked");
            return Err(MockError::Verification(format!(
                "{} verifiable rule(s) were never invoked: {}",
                uncalled.len(),
                uncalled.join(", ")
            )));
        }

        if self.inner.dispose_verifiable.load(Ordering::SeqCst) && self.dispose_count() == 0 {
            warn!("Transport was expected to be disposed");
            return Err(MockError::Verification(
                "transport was never disposed".to_string(),
            ));
        }

        Ok(())
    }

    /// Check how many received requests satisfy `predicate`.
    pub fn verify_calls<F>(&self, predicate: F, times: Times) -> Result<()>
    where
        F: Fn(&HttpRequest) -> bool,
    {
        let count = self
            .inner
            .received()
            .iter()
            .filter(|&r| predicate(r))
            .count() as u32;

        if times.matches(count) {
            Ok(())
        } else {
            Err(MockError::Verification(format!(
                "expected matching requests {}, but saw {}",
                times, count
            )))
        }
    }

    /// Check how many times the transport was disposed.
    pub fn verify_disposed(&self, times: Times) -> Result<()> {
        let count = self.dispose_count();
        if times.matches(count) {
            Ok(())
        } else {
            Err(MockError::Verification(format!(
                "expected dispose {}, but saw {}",
                times, count
            )))
        }
    }

    /// Drop all rules, recorded requests and dispose state.
    pub fn reset(&self) {
        self.inner
            .rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.inner.received().clear();
        self.inner.disposed.store(0, Ordering::SeqCst);
        self.inner.dispose_verifiable.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.inner.received().push(request.clone());

        let Some(registered) = self.inner.find_rule(&request) else {
            warn!(
                method = %request.method(),
                url = %request.url(),
                "No intercept rule matches request"
            );
            return Err(MockError::Unmatched {
                method: request.method().to_string(),
                url: request.url().to_string(),
            });
        };

        registered.calls.fetch_add(1, Ordering::SeqCst);
        debug!(
            method = %request.method(),
            url = %request.url(),
            criteria = ?registered.rule.matcher.criteria(),
            "Request matched intercept rule"
        );

        for hook in &registered.rule.hooks {
            hook(&request)?;
        }

        if let Some(delay) = registered.rule.response.delay() {
            debug!(delay = ?delay, "Applying delay");
            tokio::time::sleep(delay).await;
        }

        Ok(registered.rule.response.build())
    }

    fn dispose(&self) {
        self.inner.disposed.fetch_add(1, Ordering::SeqCst);
    }
}
