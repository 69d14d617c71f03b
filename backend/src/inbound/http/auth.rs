//! Bearer-token authentication for journal endpoints.
//!
//! [`AuthenticatedUser`] verifies the `Authorization: Bearer <jwt>` header
//! against the session token port held in [`HttpState`] and hands the
//! handler the `userId` claim.

use std::future::{Ready, ready};

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use tracing::debug;

use crate::domain::{Error, UserId};
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// The caller identified by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(UserId);

impl AuthenticatedUser {
    pub fn user_id(&self) -> &UserId {
        &self.0
    }

    pub fn into_inner(self) -> UserId {
        self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))?;
    let token = bearer_token(req).ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let claims = state.sessions.verify(token).map_err(|err| {
        debug!(error = %err, "session token rejected");
        Error::unauthorized("invalid session token")
    })?;
    let raw = claims
        .user_id
        .ok_or_else(|| Error::invalid_request("no user id supplied"))?;
    UserId::new(raw)
        .map(AuthenticatedUser)
        .map_err(|_| Error::invalid_request("user id in token is not valid"))
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
