//! HS256 session tokens via `jsonwebtoken`.
//!
//! Issue and expiry checks both read the injected clock; `jsonwebtoken`
//! validates signature, issuer and audience only.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{SessionTokenError, SessionTokens};
use crate::domain::{SessionClaims, SessionToken, UserId};

/// Signing parameters shared by issuance and verification.
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: Vec<u8>,
    pub issuer: String,
    pub audience: String,
    pub ttl: TimeDelta,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    iss: String,
    aud: String,
    iat: i64,
    exp: i64,
}

pub struct JwtSessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl JwtSessionTokens {
    pub fn new(settings: TokenSettings, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_exp = false;
        Self {
            encoding: EncodingKey::from_secret(&settings.secret),
            decoding: DecodingKey::from_secret(&settings.secret),
            validation,
            issuer: settings.issuer,
            audience: settings.audience,
            ttl: settings.ttl,
            clock,
        }
    }
}

impl SessionTokens for JwtSessionTokens {
    fn issue(&self, user_id: &UserId) -> Result<SessionToken, SessionTokenError> {
        let now = self.clock.utc();
        let claims = Claims {
            user_id: Some(user_id.to_string()),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map(SessionToken::new)
            .map_err(|err| SessionTokenError::signing(err.to_string()))
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, SessionTokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| SessionTokenError::invalid(err.to_string()))?;
        let expires_at = DateTime::from_timestamp(data.claims.exp, 0)
            .ok_or_else(|| SessionTokenError::invalid("expiry out of range"))?;
        if expires_at <= self.clock.utc() {
            return Err(SessionTokenError::invalid("token expired"));
        }
        Ok(SessionClaims {
            user_id: data.claims.user_id,
            expires_at,
        })
    }
}
