//! Login-code delivery adapters.

mod logging_mailer;

pub use logging_mailer::LoggingMailer;
