//! Gratitude journal backend library.
//!
//! The crate follows a hexagonal layout: `domain` holds the model, ports and
//! services; `inbound` drives them over HTTP and change streams; `outbound`
//! implements the driven ports for storage, crypto, mail and queueing.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
