//! Error types for mock transport and client factory operations.

use thiserror::Error;

/// Errors raised while configuring or exercising the mocks.
#[derive(Debug, Error)]
pub enum MockError {
    /// No installed rule matched the request (strict mock behavior).
    #[error("No intercept rule matches {method} {url}")]
    Unmatched { method: String, url: String },

    /// The client factory was asked for a name nothing is bound to.
    #[error("No client is bound to name '{name}'")]
    UnmatchedClient { name: String },

    /// The request body could not be deserialized for a body hook.
    #[error("Failed to deserialize request body: {0}")]
    RequestBody(#[source] serde_json::Error),

    /// The configured response value could not be serialized.
    #[error("Failed to serialize response body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The response body is not the JSON the caller expected.
    #[error("Failed to parse response body: {0}")]
    ResponseJson(#[source] serde_json::Error),

    /// The response body is not valid UTF-8 text.
    #[error("Response body is not valid UTF-8: {0}")]
    ResponseBody(#[from] std::string::FromUtf8Error),

    /// Invalid request or base address.
    #[error("Invalid address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    /// Status code outside 100..=599.
    #[error("Invalid status code: {0}")]
    InvalidStatus(u16),

    /// A call-count expectation was not met.
    #[error("Verification failed: {0}")]
    Verification(String),
}

impl MockError {
    pub(crate) fn invalid_address(address: &str, source: url::ParseError) -> Self {
        Self::InvalidAddress {
            address: address.to_string(),
            source,
        }
    }
}

/// Result type alias for mock operations.
pub type Result<T> = core::result::Result<T, MockError>;
