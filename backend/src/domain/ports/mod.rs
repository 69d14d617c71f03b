//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (store, cipher, session tokens, mailer, queue) are implemented
//! in `outbound`; driving ports are implemented by the domain services and
//! consumed by the HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod entry_queue;
mod journal_command;
mod journal_query;
mod key_value_store;
mod login_mailer;
mod otp_login;
mod reaction_ledger;
mod score_query;
mod secret_cipher;
mod session_tokens;
mod user_accounts;

#[cfg(test)]
pub use entry_queue::MockEntryQueue;
pub use entry_queue::{EntryQueue, EntryQueueError, QueuedMessage};
#[cfg(test)]
pub use journal_command::MockJournalCommand;
pub use journal_command::{JournalCommand, ShareOutcome};
#[cfg(test)]
pub use journal_query::MockJournalQuery;
pub use journal_query::JournalQuery;
#[cfg(test)]
pub use key_value_store::MockKeyValueStore;
pub use key_value_store::{
    BATCH_GET_LIMIT, BATCH_WRITE_LIMIT, BatchGetOutput, BatchWriteOutput, IndexQuery,
    KeyValueStore, KeyValueStoreError, QueryPage, SecondaryIndex,
};
#[cfg(test)]
pub use login_mailer::MockLoginMailer;
pub use login_mailer::{LOGIN_EMAIL_SUBJECT, LoginMailer, LoginMailerError, login_email_body};
#[cfg(test)]
pub use otp_login::MockOtpLogin;
pub use otp_login::{LoginConfirmation, OtpLogin};
#[cfg(test)]
pub use reaction_ledger::MockReactionLedger;
pub use reaction_ledger::{Reaction, ReactionLedger};
#[cfg(test)]
pub use score_query::MockScoreQuery;
pub use score_query::ScoreQuery;
#[cfg(test)]
pub use secret_cipher::MockSecretCipher;
pub use secret_cipher::{SecretCipher, SecretCipherError};
#[cfg(test)]
pub use session_tokens::MockSessionTokens;
pub use session_tokens::{SessionTokenError, SessionTokens};
#[cfg(test)]
pub use user_accounts::MockUserAccounts;
pub use user_accounts::UserAccounts;
