//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    JournalCommand, JournalQuery, OtpLogin, ReactionLedger, ScoreQuery, SessionTokens,
    UserAccounts,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn UserAccounts>,
    pub login: Arc<dyn OtpLogin>,
    pub journal: Arc<dyn JournalCommand>,
    pub journal_query: Arc<dyn JournalQuery>,
    pub reactions: Arc<dyn ReactionLedger>,
    pub scores: Arc<dyn ScoreQuery>,
    /// Verifies bearer tokens for [`super::auth::AuthenticatedUser`].
    pub sessions: Arc<dyn SessionTokens>,
}
