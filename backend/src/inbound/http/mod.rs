//! HTTP inbound adapter exposing the journal REST endpoints.

pub mod auth;
pub mod error;
pub mod health;
pub mod journal;
pub mod reactions;
pub mod scores;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::{ApiResult, json_error_handler};

use actix_web::web;

/// Register every journal API route on `cfg`.
///
/// Handlers expect `web::Data<HttpState>` and the JSON error handler to be
/// installed by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(users::register)
        .service(users::login)
        .service(users::confirm_login)
        .service(users::me)
        .service(journal::submit_entries)
        .service(journal::share_entries)
        .service(journal::todays_entries)
        .service(journal::social_feed)
        .service(reactions::liked_entries)
        .service(reactions::react)
        .service(scores::influence)
        .service(scores::streak);
}
