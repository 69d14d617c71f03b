//! Inbound adapters that translate external triggers into domain calls while
//! keeping framework details at the edge.
//!
//! HTTP handlers live under [`http`]; the change-stream and review-queue
//! consumers live under [`events`].

pub mod events;
pub mod http;
