//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: the key-value store, in memory or DynamoDB (feature-gated)
//! - **crypto**: AES-GCM secret sealing and HS256 session tokens
//! - **mail**: login-code delivery
//! - **queue**: the review queue between sharing and the sentiment gate
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod crypto;
pub mod mail;
pub mod persistence;
pub mod queue;
