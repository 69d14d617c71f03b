//! One-time-password login primitives.
//!
//! A login attempt is an `AuthToken` record holding the sealed OTP, the
//! number of confirmation attempts so far and an expiry. The types here keep
//! the attempt arithmetic and OTP comparison out of the service code.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::UserId;

/// Number of digits in a login OTP.
pub const OTP_DIGITS: usize = 6;

/// Validation errors for login payload values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    #[error("token id must not be empty")]
    EmptyTokenId,
    #[error("token id must not contain '/'")]
    InvalidTokenId,
    #[error("token must not be empty")]
    EmptyOtp,
    #[error("token must be {OTP_DIGITS} digits")]
    MalformedOtp,
}

/// A six-digit one-time password.
///
/// The plaintext is wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(Zeroizing<String>);

impl OtpCode {
    /// Draw a uniformly random code in `100000..=999999`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let value: u32 = rng.gen_range(100_000..1_000_000);
        Self(Zeroizing::new(value.to_string()))
    }

    /// Parse a code supplied by a caller or recovered from the cipher.
    pub fn parse(raw: &str) -> Result<Self, LoginValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LoginValidationError::EmptyOtp);
        }
        if trimmed.len() != OTP_DIGITS || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LoginValidationError::MalformedOtp);
        }
        Ok(Self(Zeroizing::new(trimmed.to_owned())))
    }

    /// Plain digits, for sealing and for the login email.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Compare without short-circuiting on the first differing digit.
    pub fn matches(&self, other: &Self) -> bool {
        let left = self.0.as_bytes();
        let right = other.0.as_bytes();
        left.len() == right.len()
            && left
                .iter()
                .zip(right)
                .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

/// Opaque identifier of a login attempt, returned by `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenId(String);

impl TokenId {
    /// Generate a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validate a caller-supplied identifier.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, LoginValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(LoginValidationError::EmptyTokenId);
        }
        if trimmed.contains('/') {
            return Err(LoginValidationError::InvalidTokenId);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for TokenId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Confirmation attempts recorded against a login token.
///
/// ## Invariants
/// - The count never decreases.
/// - A token is exhausted once the count exceeds the configured ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct LoginAttempts(u32);

impl LoginAttempts {
    pub const fn new(count: u32) -> Self {
        Self(count)
    }

    pub const fn count(self) -> u32 {
        self.0
    }

    /// Whether the token must be refused without checking the code.
    pub const fn is_exhausted(self, max_attempts: u32) -> bool {
        self.0 > max_attempts
    }

    /// Count after a wrong code.
    #[must_use]
    pub const fn after_mismatch(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Count after a correct code: raised by `max_attempts` and pushed past
    /// the ceiling so the same token can never confirm twice.
    #[must_use]
    pub fn after_match(self, max_attempts: u32) -> Self {
        let raised = self.0.saturating_add(max_attempts);
        Self(raised.max(max_attempts.saturating_add(1)))
    }
}

/// A login attempt as persisted in the auth table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token_id: TokenId,
    /// OTP sealed by the secret cipher, base64 encoded.
    pub sealed_otp: String,
    pub attempts: LoginAttempts,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Signed bearer token issued after a successful OTP confirmation.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

impl From<SessionToken> for String {
    fn from(value: SessionToken) -> Self {
        value.0
    }
}

/// Claims recovered from a verified session token.
///
/// `user_id` is optional because a correctly signed token may still lack the
/// claim; handlers reject that case as a bad request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    #[rstest]
    fn generated_codes_have_six_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = OtpCode::generate(&mut rng);
            assert_eq!(code.expose().len(), OTP_DIGITS);
            assert!(OtpCode::parse(code.expose()).is_ok());
        }
    }

    #[rstest]
    #[case("", LoginValidationError::EmptyOtp)]
    #[case("12345", LoginValidationError::MalformedOtp)]
    #[case("1234567", LoginValidationError::MalformedOtp)]
    #[case("12a456", LoginValidationError::MalformedOtp)]
    fn rejects_malformed_codes(#[case] raw: &str, #[case] expected: LoginValidationError) {
        assert_eq!(OtpCode::parse(raw), Err(expected));
    }

    #[rstest]
    fn codes_compare_by_value() {
        let left = OtpCode::parse("123456").expect("valid");
        assert!(left.matches(&OtpCode::parse(" 123456 ").expect("valid")));
        assert!(!left.matches(&OtpCode::parse("123457").expect("valid")));
    }

    #[rstest]
    fn debug_output_hides_digits() {
        let code = OtpCode::parse("123456").expect("valid");
        assert!(!format!("{code:?}").contains("123456"));
    }

    #[rstest]
    #[case(0, 3, false)]
    #[case(3, 3, false)]
    #[case(4, 3, true)]
    fn exhaustion_is_strictly_above_ceiling(
        #[case] count: u32,
        #[case] max: u32,
        #[case] exhausted: bool,
    ) {
        assert_eq!(LoginAttempts::new(count).is_exhausted(max), exhausted);
    }

    #[rstest]
    #[case(0, 3)]
    #[case(2, 3)]
    #[case(3, 3)]
    #[case(0, 0)]
    fn matched_token_is_exhausted_afterwards(#[case] count: u32, #[case] max: u32) {
        let before = LoginAttempts::new(count);
        let after = before.after_match(max);
        assert!(after.count() >= count + max);
        assert!(after.is_exhausted(max));
    }

    #[rstest]
    fn mismatch_adds_one() {
        assert_eq!(LoginAttempts::new(2).after_mismatch(), LoginAttempts::new(3));
    }

    #[rstest]
    #[case("", LoginValidationError::EmptyTokenId)]
    #[case("a/b", LoginValidationError::InvalidTokenId)]
    fn rejects_bad_token_ids(#[case] raw: &str, #[case] expected: LoginValidationError) {
        assert_eq!(TokenId::new(raw), Err(expected));
    }
}
