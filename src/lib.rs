//! Mock HTTP Handler
//!
//! Test helpers that let unit tests simulate HTTP interactions without a
//! network: a strict in-process transport with intercept rules, a small client
//! that sends through it, and a mock named-client factory.
//!
//! # Features
//!
//! - **Request Matching**: Match by method, address, both, an exact request,
//!   or any predicate
//! - **Canned Responses**: Status code plus text or JSON content
//! - **Request Capture**: Callbacks receive the raw request and the
//!   deserialized request body
//! - **Verification**: Check that rules fired, count calls, check disposal
//! - **Named Clients**: Bind clients to names on a mock factory
//!
//! # Example
//!
//! ```
//! use mock_http_handler::{ClientFactory, MockClientFactory, MockRequestConfiguration, MockTransport};
//!
//! # async fn example() -> mock_http_handler::Result<()> {
//! let transport = MockTransport::new();
//! MockRequestConfiguration::new()
//!     .with_method("GET")
//!     .with_body("Hello, World!")
//!     .install(&transport)?;
//!
//! let factory = MockClientFactory::new();
//! factory.bind_new_client(&transport, "http://api.example.com/")?;
//!
//! // Code under test asks the factory for its client.
//! let client = factory.create_default_client()?;
//! let response = client.get("hello").await?;
//! assert_eq!(response.text()?, "Hello, World!");
//!
//! transport.verify()?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod configuration;
pub mod error;
pub mod factory;
pub mod logging;
pub mod matcher;
pub mod message;
pub mod response;
pub mod times;
pub mod transport;

pub use client::HttpClient;
pub use configuration::MockRequestConfiguration;
pub use error::{MockError, Result};
pub use factory::{ClientFactory, MockClientFactory, DEFAULT_CLIENT_NAME};
pub use logging::init_test_tracing;
pub use matcher::RequestMatcher;
pub use message::{HttpRequest, HttpResponse};
pub use response::{ResponseContent, ResponseTemplate};
pub use times::Times;
pub use transport::{InterceptRule, MockTransport, ResponseSetup, Transport};
