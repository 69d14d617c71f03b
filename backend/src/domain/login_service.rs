//! One-time-password login service.
//!
//! `initiate` seals a fresh code into an auth-table record and emails the
//! plaintext; `confirm` checks a supplied code against that record, counting
//! attempts, and signs a session token on a match.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use rand::rngs::OsRng;
use tracing::{info, warn};

use crate::domain::ports::{
    KeyValueStore, LoginConfirmation, LoginMailer, OtpLogin, SecretCipher, SessionTokens,
};
use crate::domain::records::{AuthTokenRecord, Table, UserRecord};
use crate::domain::service_support::{
    decode, encode, map_cipher_error, map_mailer_error, map_session_token_error,
    map_store_error,
};
use crate::domain::{
    AuthToken, Email, Error, LoginAttempts, OtpCode, SessionToken, TokenId,
};

/// Limits applied to login tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginPolicy {
    /// Minutes before an unconfirmed token expires.
    pub token_ttl_minutes: u32,
    /// Wrong codes tolerated before a token is refused outright.
    pub max_attempts: u32,
}

impl Default for LoginPolicy {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 15,
            max_attempts: 3,
        }
    }
}

/// Collaborators of [`OtpLoginService`] other than the store.
#[derive(Clone)]
pub struct LoginCollaborators {
    pub cipher: Arc<dyn SecretCipher>,
    pub sessions: Arc<dyn SessionTokens>,
    pub mailer: Arc<dyn LoginMailer>,
    pub clock: Arc<dyn Clock>,
}

/// OTP login flow over the auth table.
#[derive(Clone)]
pub struct OtpLoginService<S: ?Sized> {
    store: Arc<S>,
    deps: LoginCollaborators,
    policy: LoginPolicy,
}

impl<S: ?Sized> OtpLoginService<S> {
    pub fn new(store: Arc<S>, deps: LoginCollaborators, policy: LoginPolicy) -> Self {
        Self {
            store,
            deps,
            policy,
        }
    }
}

impl<S: ?Sized> OtpLoginService<S>
where
    S: KeyValueStore,
{
    async fn save_token(&self, email: &Email, token: &AuthToken) -> Result<(), Error> {
        let item = encode(&AuthTokenRecord::from_token(email, token))?;
        self.store
            .put(Table::Auth, item)
            .await
            .map_err(map_store_error)
    }

    async fn load_token(&self, email: &Email, token_id: &TokenId) -> Result<AuthToken, Error> {
        let key = AuthTokenRecord::key(email, token_id);
        let item = self
            .store
            .get(Table::Auth, &key)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found("login token not found"))?;
        let token = decode::<AuthTokenRecord>(item)?
            .into_token()
            .map_err(|err| Error::internal(err.to_string()))?;
        // The store's TTL sweep is lazy; an expired token may still be read.
        if token.is_expired(self.deps.clock.utc()) {
            return Err(Error::not_found("login token has expired"));
        }
        Ok(token)
    }

    async fn stored_code(&self, token: &AuthToken) -> Result<OtpCode, Error> {
        let plaintext = self
            .deps
            .cipher
            .decrypt(&token.sealed_otp)
            .await
            .map_err(map_cipher_error)?;
        std::str::from_utf8(&plaintext)
            .ok()
            .and_then(|text| OtpCode::parse(text).ok())
            .ok_or_else(|| Error::internal("stored login token is malformed"))
    }
}

#[async_trait]
impl<S: ?Sized> OtpLogin for OtpLoginService<S>
where
    S: KeyValueStore,
{
    async fn initiate(&self, email: &Email) -> Result<TokenId, Error> {
        let item = self
            .store
            .get(Table::Auth, &UserRecord::key(email))
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found("no account exists for this email"))?;
        let user = decode::<UserRecord>(item)?
            .into_user()
            .map_err(|err| Error::internal(err.to_string()))?;

        let code = OtpCode::generate(&mut OsRng);
        let sealed_otp = self
            .deps
            .cipher
            .encrypt(code.expose().as_bytes())
            .await
            .map_err(map_cipher_error)?;
        let token = AuthToken {
            token_id: TokenId::random(),
            sealed_otp,
            attempts: LoginAttempts::default(),
            user_id: user.id,
            expires_at: self.deps.clock.utc()
                + Duration::minutes(i64::from(self.policy.token_ttl_minutes)),
        };
        self.save_token(email, &token).await?;

        self.deps
            .mailer
            .send_login_code(email, &code, self.policy.token_ttl_minutes)
            .await
            .map_err(map_mailer_error)?;
        info!(user_id = %token.user_id, token_id = %token.token_id, "login token issued");
        Ok(token.token_id)
    }

    async fn confirm(&self, confirmation: LoginConfirmation) -> Result<SessionToken, Error> {
        let LoginConfirmation {
            email,
            token_id,
            code,
        } = confirmation;
        let mut token = self.load_token(&email, &token_id).await?;

        if token.attempts.is_exhausted(self.policy.max_attempts) {
            warn!(
                token_id = %token_id,
                attempts = token.attempts.count(),
                "login token refused after too many attempts"
            );
            return Err(Error::unauthorized("too many login attempts"));
        }

        let expected = self.stored_code(&token).await?;
        if !expected.matches(&code) {
            token.attempts = token.attempts.after_mismatch();
            self.save_token(&email, &token).await?;
            warn!(
                token_id = %token_id,
                attempts = token.attempts.count(),
                "login token mismatch"
            );
            return Err(Error::unauthorized("login token did not match"));
        }

        token.attempts = token.attempts.after_match(self.policy.max_attempts);
        self.save_token(&email, &token).await?;
        let session = self
            .deps
            .sessions
            .issue(&token.user_id)
            .map_err(map_session_token_error)?;
        info!(user_id = %token.user_id, "login confirmed");
        Ok(session)
    }
}

#[cfg(test)]
#[path = "login_service_tests.rs"]
mod tests;
