//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::{TimeDelta, Utc};

use crate::domain::SessionClaims;
use crate::domain::ports::{
    MockJournalCommand, MockJournalQuery, MockOtpLogin, MockReactionLedger, MockScoreQuery,
    MockSessionTokens, MockUserAccounts, SessionTokenError,
};
use crate::inbound::http::json_error_handler;
use crate::inbound::http::state::HttpState;

pub const USER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
pub const TOKEN: &str = "test-token";
pub const BEARER: &str = "Bearer test-token";

/// One mock per port, configured by each test before building the app.
#[derive(Default)]
pub struct StateMocks {
    pub accounts: MockUserAccounts,
    pub login: MockOtpLogin,
    pub journal: MockJournalCommand,
    pub journal_query: MockJournalQuery,
    pub reactions: MockReactionLedger,
    pub scores: MockScoreQuery,
    pub sessions: MockSessionTokens,
}

impl StateMocks {
    /// Mocks whose session port accepts [`TOKEN`] for [`USER_ID`].
    pub fn authenticated() -> Self {
        let mut mocks = Self::default();
        mocks.sessions.expect_verify().returning(|token| {
            if token == TOKEN {
                Ok(SessionClaims {
                    user_id: Some(USER_ID.to_owned()),
                    expires_at: Utc::now() + TimeDelta::hours(1),
                })
            } else {
                Err(SessionTokenError::invalid("unknown token"))
            }
        });
        mocks
    }

    pub fn into_state(self) -> HttpState {
        HttpState {
            accounts: Arc::new(self.accounts),
            login: Arc::new(self.login),
            journal: Arc::new(self.journal),
            journal_query: Arc::new(self.journal_query),
            reactions: Arc::new(self.reactions),
            scores: Arc::new(self.scores),
            sessions: Arc::new(self.sessions),
        }
    }
}

/// App carrying the mocked state and the JSON error handler.
pub fn test_app(
    mocks: StateMocks,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(mocks.into_state()))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
}
