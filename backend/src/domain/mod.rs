//! Domain primitives, aggregates and services.
//!
//! Purpose: Define the strongly typed journal, account and login model, the
//! ports the hexagon talks through, and the services implementing the
//! driving ports. Adapters live in `inbound` and `outbound`.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User, Email, UserId: account identity.
//! - JournalEntry, Submission, TodayEntries, SocialPage: journal views.
//! - Service types wired by the server: `AccountService`, `OtpLoginService`,
//!   `JournalService`, `ReactionService`, `ScoreService`, and the event-driven
//!   `StreakAggregator`, `InfluenceAggregator` and `SentimentGate`.

pub mod error;
pub mod events;
pub mod ports;
pub mod records;
pub(crate) mod service_support;

mod accounts_service;
mod auth;
mod influence;
mod influence_aggregator;
mod journal;
mod journal_service;
mod login_service;
mod reaction_service;
mod score_service;
mod sentiment;
mod sentiment_gate;
mod streak;
mod streak_aggregator;
mod trace_id;
mod user;

pub use self::accounts_service::AccountService;
pub use self::auth::{
    AuthToken, LoginAttempts, LoginValidationError, OTP_DIGITS, OtpCode, SessionClaims,
    SessionToken, TokenId,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::events::{ChangeEvent, ChangeKind};
pub use self::influence::InfluenceTally;
pub use self::influence_aggregator::InfluenceAggregator;
pub use self::journal::{
    ENTRIES_PER_SUBMISSION, EntryId, EntryIndex, JournalEntry, JournalValidationError,
    SharedEntryView, SocialPage, Submission, TodayEntries,
};
pub use self::journal_service::{DEFAULT_SOCIAL_PAGE_SIZE, JournalService};
pub use self::login_service::{LoginCollaborators, LoginPolicy, OtpLoginService};
pub use self::reaction_service::ReactionService;
pub use self::score_service::ScoreService;
pub use self::sentiment::{DEFAULT_OVERRIDES, SentimentAnalyzer};
pub use self::sentiment_gate::{ReviewOutcome, SentimentGate};
pub use self::streak::Streak;
pub use self::streak_aggregator::{AggregateOutcome, StreakAggregator};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DISPLAY_NAME_MAX, DisplayName, Email, Registration, User, UserId, UserProfile,
    UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use gratitude_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
