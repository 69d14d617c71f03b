//! Journal entries: the three daily gratitude lines and their shared views.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;

/// Number of entries in one daily submission.
pub const ENTRIES_PER_SUBMISSION: usize = 3;

/// Validation errors for journal payload values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JournalValidationError {
    #[error("entry id must not be empty")]
    EmptyEntryId,
    #[error("entry id must not contain '/'")]
    InvalidEntryId,
    #[error("entry index must be between 0 and 2, got {0}")]
    IndexOutOfRange(i64),
    #[error("{field} is required")]
    MissingEntry { field: &'static str },
}

/// Identifier shared by the three entries of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(String);

impl EntryId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(raw: impl AsRef<str>) -> Result<Self, JournalValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(JournalValidationError::EmptyEntryId);
        }
        if trimmed.contains('/') {
            return Err(JournalValidationError::InvalidEntryId);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EntryId> for String {
    fn from(value: EntryId) -> Self {
        value.0
    }
}

impl TryFrom<String> for EntryId {
    type Error = JournalValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Position of an entry within its submission, `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct EntryIndex(u8);

impl EntryIndex {
    /// Every index of a submission, in order.
    pub const ALL: [Self; ENTRIES_PER_SUBMISSION] = [Self(0), Self(1), Self(2)];

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Field name used by the `{entry1, entry2, entry3}` payloads.
    pub const fn field_name(self) -> &'static str {
        match self.0 {
            0 => "entry1",
            1 => "entry2",
            _ => "entry3",
        }
    }
}

impl TryFrom<i64> for EntryIndex {
    type Error = JournalValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(index) if usize::from(index) < ENTRIES_PER_SUBMISSION => Ok(Self(index)),
            _ => Err(JournalValidationError::IndexOutOfRange(value)),
        }
    }
}

impl From<EntryIndex> for u8 {
    fn from(value: EntryIndex) -> Self {
        value.0
    }
}

impl fmt::Display for EntryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated daily submission. `id` is `None` for a fresh submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: Option<EntryId>,
    pub texts: [String; ENTRIES_PER_SUBMISSION],
}

impl Submission {
    /// Build a submission from the optional payload fields.
    ///
    /// Each text must be present; empty strings are kept as written.
    pub fn try_from_parts(
        id: Option<&str>,
        texts: [Option<String>; ENTRIES_PER_SUBMISSION],
    ) -> Result<Self, JournalValidationError> {
        let id = id.map(EntryId::new).transpose()?;
        let [first, second, third] = texts;
        let require = |text: Option<String>, index: EntryIndex| {
            text.ok_or(JournalValidationError::MissingEntry {
                field: index.field_name(),
            })
        };
        Ok(Self {
            id,
            texts: [
                require(first, EntryIndex(0))?,
                require(second, EntryIndex(1))?,
                require(third, EntryIndex(2))?,
            ],
        })
    }
}

/// One stored journal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub user_id: UserId,
    pub id: EntryId,
    pub index: EntryIndex,
    pub text: String,
    pub written_on: NaiveDate,
    /// Set once the entry passes the sentiment gate.
    pub shared_on: Option<NaiveDate>,
}

/// Response body for `GET /journal/today`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TodayEntries {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "6a3f0d1e-1d2b-4cde-9c6b-0d0b7c6f6f01")]
    pub id: Option<String>,
    pub entry1: String,
    pub entry2: String,
    pub entry3: String,
}

impl TodayEntries {
    /// Fold stored entries into the three-slot view. Later entries for the
    /// same index replace earlier ones.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a JournalEntry>) -> Self {
        entries.into_iter().fold(Self::default(), |mut view, entry| {
            let slot = match entry.index.get() {
                0 => &mut view.entry1,
                1 => &mut view.entry2,
                _ => &mut view.entry3,
            };
            slot.clone_from(&entry.text);
            view.id = Some(entry.id.to_string());
            view
        })
    }
}

/// A shared entry as shown on the social feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedEntryView {
    pub entry: String,
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub user_id: String,
    pub id: String,
    #[schema(example = 0)]
    pub index: u8,
}

impl From<&JournalEntry> for SharedEntryView {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            entry: entry.text.clone(),
            user_id: entry.user_id.to_string(),
            id: entry.id.to_string(),
            index: entry.index.get(),
        }
    }
}

/// One page of the social feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SocialPage {
    pub entries: Vec<SharedEntryView>,
    /// Opaque cursor for the next page; absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}
