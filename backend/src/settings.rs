//! Application settings loaded via OrthoConfig.
//!
//! Values come from `GRATITUDE_*` environment variables, CLI flags or a
//! config file. [`AppSettings::validate`] turns them into [`RuntimeConfig`]
//! once at start-up, so a missing secret fails the process before it binds.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::{Email, LoginPolicy};
use crate::inbound::events::BatchConfig;
use crate::outbound::crypto::{KEY_LEN, TokenSettings};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ISSUER: &str = "gratitude";
const DEFAULT_AUDIENCE: &str = "gratitude-app";

/// Raw settings as supplied by the environment.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GRATITUDE")]
pub struct AppSettings {
    /// HTTP listener address.
    pub bind_addr: Option<String>,
    /// HMAC secret for session tokens.
    pub jwt_secret: Option<String>,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    #[ortho_config(default = 12)]
    pub session_ttl_hours: u32,
    #[ortho_config(default = 15)]
    pub token_ttl_minutes: u32,
    #[ortho_config(default = 3)]
    pub max_login_attempts: u32,
    /// Hex-encoded 32-byte key sealing login codes.
    pub otp_key: Option<String>,
    /// Sender address for login emails.
    pub source_email: Option<String>,
    #[ortho_config(default = 25)]
    pub social_page_size: usize,
    #[ortho_config(default = 100)]
    pub stream_batch_size: usize,
    #[ortho_config(default = 250)]
    pub stream_flush_millis: u64,
    /// Journal table name; selects the DynamoDB store when built with `dynamo`.
    pub dynamo_table: Option<String>,
    /// Auth table name for the DynamoDB store.
    pub auth_table: Option<String>,
}

/// Start-up configuration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {name}")]
    Missing { name: &'static str },
    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Validated configuration handed to the server builders.
#[derive(Clone)]
pub struct RuntimeConfig {
    pub bind_addr: SocketAddr,
    pub tokens: TokenSettings,
    pub otp_key: Zeroizing<[u8; KEY_LEN]>,
    pub source_email: Email,
    pub login: LoginPolicy,
    pub social_page_size: usize,
    pub stream: BatchConfig,
    pub store: StoreSelection,
}

/// Which key-value store backs the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSelection {
    InMemory,
    Dynamo { journal: String, auth: String },
}

fn required(value: Option<&String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(str::to_owned)
        .ok_or(ConfigError::Missing { name })
}

fn positive(value: u64, name: &'static str) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(name, "must be greater than zero"));
    }
    Ok(value)
}

fn parse_otp_key(raw: &str) -> Result<Zeroizing<[u8; KEY_LEN]>, ConfigError> {
    let bytes = Zeroizing::new(
        hex::decode(raw).map_err(|err| ConfigError::invalid("otp_key", err.to_string()))?,
    );
    let mut key = Zeroizing::new([0_u8; KEY_LEN]);
    if bytes.len() != KEY_LEN {
        return Err(ConfigError::invalid(
            "otp_key",
            format!("expected {KEY_LEN} bytes, got {}", bytes.len()),
        ));
    }
    key.copy_from_slice(&bytes);
    Ok(key)
}

impl AppSettings {
    pub fn validate(&self) -> Result<RuntimeConfig, ConfigError> {
        let bind_addr = self
            .bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::invalid("bind_addr", err.to_string()))?;
        let jwt_secret = required(self.jwt_secret.as_ref(), "jwt_secret")?;
        let otp_key = parse_otp_key(&required(self.otp_key.as_ref(), "otp_key")?)?;
        let source_email = Email::new(required(self.source_email.as_ref(), "source_email")?)
            .map_err(|err| ConfigError::invalid("source_email", err.to_string()))?;
        let ttl_hours = positive(u64::from(self.session_ttl_hours), "session_ttl_hours")?;
        positive(u64::from(self.token_ttl_minutes), "token_ttl_minutes")?;
        positive(u64::from(self.max_login_attempts), "max_login_attempts")?;
        let stream_batch = positive(self.stream_batch_size as u64, "stream_batch_size")?;
        let social_page_size = positive(self.social_page_size as u64, "social_page_size")?;

        let store = match (&self.dynamo_table, &self.auth_table) {
            (None, None) => StoreSelection::InMemory,
            (Some(journal), Some(auth)) => StoreSelection::Dynamo {
                journal: journal.clone(),
                auth: auth.clone(),
            },
            (Some(_), None) => return Err(ConfigError::Missing { name: "auth_table" }),
            (None, Some(_)) => return Err(ConfigError::Missing { name: "dynamo_table" }),
        };

        Ok(RuntimeConfig {
            bind_addr,
            tokens: TokenSettings {
                secret: jwt_secret.into_bytes(),
                issuer: self.jwt_issuer.clone().unwrap_or_else(|| DEFAULT_ISSUER.to_owned()),
                audience: self
                    .jwt_audience
                    .clone()
                    .unwrap_or_else(|| DEFAULT_AUDIENCE.to_owned()),
                ttl: TimeDelta::hours(i64::try_from(ttl_hours).unwrap_or(i64::MAX)),
            },
            otp_key,
            source_email,
            login: LoginPolicy {
                token_ttl_minutes: self.token_ttl_minutes,
                max_attempts: self.max_login_attempts,
            },
            social_page_size: usize::try_from(social_page_size).unwrap_or(usize::MAX),
            stream: BatchConfig {
                max_batch: usize::try_from(stream_batch).unwrap_or(usize::MAX),
                flush_interval: Duration::from_millis(self.stream_flush_millis.max(1)),
            },
            store,
        })
    }
}
