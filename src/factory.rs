//! Named client factory and its mock.

use crate::client::HttpClient;
use crate::error::{MockError, Result};
use crate::times::Times;
use crate::transport::MockTransport;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, warn};

/// Name used when a caller does not ask for a specific client.
pub const DEFAULT_CLIENT_NAME: &str = "";

/// Produces named clients.
pub trait ClientFactory: Send + Sync {
    fn create_client(&self, name: &str) -> Result<Arc<HttpClient>>;

    /// Client registered under [`DEFAULT_CLIENT_NAME`].
    fn create_default_client(&self) -> Result<Arc<HttpClient>> {
        self.create_client(DEFAULT_CLIENT_NAME)
    }
}

#[derive(Default)]
struct FactoryInner {
    bindings: RwLock<HashMap<String, Arc<HttpClient>>>,
    requested: Mutex<HashMap<String, u32>>,
}

/// Strict factory returning pre-bound clients. Unbound names are an error.
#[derive(Clone, Default)]
pub struct MockClientFactory {
    inner: Arc<FactoryInner>,
}

impl std::fmt::Debug for MockClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bindings = self
            .inner
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MockClientFactory")
            .field("names", &bindings.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MockClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `client` for the default name.
    pub fn bind_client(&self, client: Arc<HttpClient>) {
        self.bind_client_named(client, DEFAULT_CLIENT_NAME);
    }

    /// Return `client` for `name`. Rebinding a name replaces the client.
    pub fn bind_client_named(&self, client: Arc<HttpClient>, name: &str) {
        debug!(name = %name, "Binding client");
        self.inner
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), client);
    }

    /// Build a client over `transport` and bind it to the default name.
    pub fn bind_new_client(
        &self,
        transport: &MockTransport,
        base_address: &str,
    ) -> Result<Arc<HttpClient>> {
        self.bind_new_client_named(transport, base_address, DEFAULT_CLIENT_NAME)
    }

    /// Build a client over `transport` and bind it to `name`.
    pub fn bind_new_client_named(
        &self,
        transport: &MockTransport,
        base_address: &str,
        name: &str,
    ) -> Result<Arc<HttpClient>> {
        let client = Arc::new(transport.create_client(Some(base_address))?);
        self.bind_client_named(client.clone(), name);
        Ok(client)
    }

    /// How many times `name` was requested, bound or not.
    pub fn created_count(&self, name: &str) -> u32 {
        self.inner
            .requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Check how many times `name` was requested.
    pub fn verify_created(&self, name: &str, times: Times) -> Result<()> {
        let count = self.created_count(name);
        if times.matches(count) {
            Ok(())
        } else {
            Err(MockError::Verification(format!(
                "expected client '{}' to be created {}, but saw {}",
                name, times, count
            )))
        }
    }
}

impl ClientFactory for MockClientFactory {
    fn create_client(&self, name: &str) -> Result<Arc<HttpClient>> {
        *self
            .inner
            .requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_insert(0) += 1;

        let bindings = self
            .inner
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        match bindings.get(name) {
            Some(client) => Ok(client.clone()),
            None => {
                warn!(name = %name, "No client bound to name");
                Err(MockError::UnmatchedClient {
                    name: name.to_string(),
                })
            }
        }
    }
}
