//! Mapping of payload validation failures onto `400` responses.
//!
//! Each error carries `details.field` and `details.code` so clients can point
//! at the offending input.

use serde_json::json;

use crate::domain::{Error, JournalValidationError, LoginValidationError, UserValidationError};

pub(crate) fn invalid_field(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

/// Reject a missing required field.
pub(crate) fn require<T>(value: Option<T>, field: &str) -> Result<T, Error> {
    value.ok_or_else(|| invalid_field(field, "missing", format!("{field} is required")))
}

pub(crate) fn map_user_validation(field: &str, err: &UserValidationError) -> Error {
    let code = match err {
        UserValidationError::EmptyId | UserValidationError::InvalidId => "invalid_user_id",
        UserValidationError::EmptyEmail
        | UserValidationError::MalformedEmail
        | UserValidationError::EmailInvalidCharacters => "invalid_email",
        UserValidationError::EmptyDisplayName => "empty_display_name",
        UserValidationError::DisplayNameTooLong { .. } => "display_name_too_long",
    };
    invalid_field(field, code, err.to_string())
}

pub(crate) fn map_login_validation(err: &LoginValidationError) -> Error {
    let (field, code) = match err {
        LoginValidationError::EmptyTokenId | LoginValidationError::InvalidTokenId => {
            ("tokenId", "invalid_token_id")
        }
        LoginValidationError::EmptyOtp => ("token", "missing"),
        LoginValidationError::MalformedOtp => ("token", "malformed_token"),
    };
    invalid_field(field, code, err.to_string())
}

pub(crate) fn map_journal_validation(field: &str, err: &JournalValidationError) -> Error {
    let (field, code) = match err {
        JournalValidationError::MissingEntry { field } => (*field, "missing"),
        JournalValidationError::IndexOutOfRange(_) => (field, "invalid_index"),
        JournalValidationError::EmptyEntryId | JournalValidationError::InvalidEntryId => {
            (field, "invalid_entry_id")
        }
    };
    invalid_field(field, code, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn missing_fields_name_the_field() {
        let err = require::<String>(None, "email").expect_err("missing");
        assert_eq!(err.message(), "email is required");
        assert_eq!(err.details().map(|d| d["field"].clone()), Some("email".into()));
    }

    #[rstest]
    #[case(LoginValidationError::MalformedOtp, "token", "malformed_token")]
    #[case(LoginValidationError::EmptyTokenId, "tokenId", "invalid_token_id")]
    fn login_errors_point_at_their_field(
        #[case] err: LoginValidationError,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let mapped = map_login_validation(&err);
        let details = mapped.details().expect("details present");
        assert_eq!(details["field"], field);
        assert_eq!(details["code"], code);
    }
}
