//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`). Only
//! compiled for tests or with the `test-support` feature.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{LoginMailer, LoginMailerError};
use crate::domain::{Email, OtpCode};

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Clock that tests move forward explicitly.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Mailer remembering the last code sent to each address.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<HashMap<String, String>>,
}

impl RecordingMailer {
    /// Most recent code delivered to `email`, if any.
    pub fn last_code(&self, email: &str) -> Option<String> {
        self.lock_sent().get(email).cloned()
    }

    fn lock_sent(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.sent.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("mailer mutex"),
        }
    }
}

#[async_trait]
impl LoginMailer for RecordingMailer {
    async fn send_login_code(
        &self,
        to: &Email,
        code: &OtpCode,
        _ttl_minutes: u32,
    ) -> Result<(), LoginMailerError> {
        self.lock_sent()
            .insert(to.as_ref().to_owned(), code.expose().to_owned());
        Ok(())
    }
}
