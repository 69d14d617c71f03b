//! Stored document shapes and key layouts.
//!
//! Every record lives in a key-value table addressed by `(_pk, _sk)`. The
//! structs here are the exact attribute layout; conversion to and from the
//! domain types is the only place key strings are built or parsed.
//!
//! | record | `_pk` | `_sk` |
//! |---|---|---|
//! | user | `user/<email>` | `USER` |
//! | auth token | `user/<email>/token` | `<tokenId>` |
//! | entry | `journal/<userId>/entry` | `<entryId>/<index>` |
//! | reaction | `reaction/<entryId>/<index>` | `<likedById>` |
//! | influence score | `<userId>` | `INFLUENCE_SCORE` |
//! | streak | `<userId>` | `STREAK` |

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    AuthToken, DisplayName, Email, EntryId, EntryIndex, JournalEntry, LoginAttempts, Streak,
    TokenId, User, UserId,
};

/// Partition key attribute.
pub const PK: &str = "_pk";
/// Sort key attribute.
pub const SK: &str = "_sk";
/// Expiry attribute, epoch seconds.
pub const TTL: &str = "_ttl";

const USER_SK: &str = "USER";
const STREAK_SK: &str = "STREAK";
const INFLUENCE_SK: &str = "INFLUENCE_SCORE";
const REACTION_PREFIX: &str = "reaction/";
const SOCIAL_PREFIX: &str = "social/";

/// Tables the records are spread across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Users and pending login tokens.
    Auth,
    /// Entries, reactions, streaks and influence scores.
    Journal,
}

/// A stored document: attribute name to JSON value.
pub type Item = Map<String, Value>;

/// Primary key of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    #[serde(rename = "_pk")]
    pub pk: String,
    #[serde(rename = "_sk")]
    pub sk: String,
}

impl ItemKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    /// Read the key attributes of a stored item.
    pub fn of(item: &Item) -> Option<Self> {
        let pk = item.get(PK)?.as_str()?;
        let sk = item.get(SK)?.as_str()?;
        Some(Self::new(pk, sk))
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.pk, self.sk)
    }
}

/// Failure converting between a stored item and a domain value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("stored item could not be decoded: {message}")]
    Decode { message: String },
    #[error("record could not be encoded: {message}")]
    Encode { message: String },
    #[error("stored item has an unexpected key `{key}`")]
    UnexpectedKey { key: String },
}

impl RecordError {
    fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }
}

/// Encode a record as a stored item.
pub fn to_item<T: Serialize>(record: &T) -> Result<Item, RecordError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RecordError::Encode {
            message: format!("expected an object, got {other}"),
        }),
        Err(err) => Err(RecordError::Encode {
            message: err.to_string(),
        }),
    }
}

/// Decode a stored item into a record.
pub fn from_item<T: DeserializeOwned>(item: Item) -> Result<T, RecordError> {
    serde_json::from_value(Value::Object(item)).map_err(RecordError::decode)
}

/// Calendar day `YYYY-MM-DD` used in index keys.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn parse_day(raw: &str) -> Result<NaiveDate, RecordError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(RecordError::decode)
}

fn unexpected(key: &str) -> RecordError {
    RecordError::UnexpectedKey {
        key: key.to_owned(),
    }
}

/// Account record, one per email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_pk")]
    pub pk: String,
    #[serde(rename = "_sk")]
    pub sk: String,
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_date: DateTime<Utc>,
    /// Secondary lookup by user id.
    pub gsi1: String,
    #[serde(default)]
    pub verified: bool,
}

impl UserRecord {
    pub fn key(email: &Email) -> ItemKey {
        ItemKey::new(format!("user/{email}"), USER_SK)
    }

    pub fn from_user(user: &User) -> Self {
        let key = Self::key(&user.email);
        Self {
            pk: key.pk,
            sk: key.sk,
            id: user.id.to_string(),
            email: user.email.to_string(),
            display_name: user.display_name.to_string(),
            created_date: user.created_date,
            gsi1: user.id.to_string(),
            verified: user.verified,
        }
    }

    pub fn into_user(self) -> Result<User, RecordError> {
        Ok(User {
            id: UserId::new(&self.id).map_err(RecordError::decode)?,
            email: Email::new(&self.email).map_err(RecordError::decode)?,
            display_name: DisplayName::new(&self.display_name).map_err(RecordError::decode)?,
            created_date: self.created_date,
            verified: self.verified,
        })
    }
}

/// Pending login attempt; expires through `_ttl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokenRecord {
    #[serde(rename = "_pk")]
    pub pk: String,
    #[serde(rename = "_sk")]
    pub sk: String,
    /// Sealed OTP, base64.
    pub token: String,
    pub attempts: u32,
    pub user_id: String,
    #[serde(rename = "_ttl")]
    pub ttl: i64,
}

impl AuthTokenRecord {
    pub fn key(email: &Email, token_id: &TokenId) -> ItemKey {
        ItemKey::new(format!("user/{email}/token"), token_id.to_string())
    }

    pub fn from_token(email: &Email, token: &AuthToken) -> Self {
        let key = Self::key(email, &token.token_id);
        Self {
            pk: key.pk,
            sk: key.sk,
            token: token.sealed_otp.clone(),
            attempts: token.attempts.count(),
            user_id: token.user_id.to_string(),
            ttl: token.expires_at.timestamp(),
        }
    }

    pub fn into_token(self) -> Result<AuthToken, RecordError> {
        let expires_at = DateTime::<Utc>::from_timestamp(self.ttl, 0)
            .ok_or_else(|| RecordError::decode(format!("ttl {} out of range", self.ttl)))?;
        Ok(AuthToken {
            token_id: TokenId::new(&self.sk).map_err(RecordError::decode)?,
            sealed_otp: self.token,
            attempts: LoginAttempts::new(self.attempts),
            user_id: UserId::new(&self.user_id).map_err(RecordError::decode)?,
            expires_at,
        })
    }
}

/// One journal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    #[serde(rename = "_pk")]
    pub pk: String,
    #[serde(rename = "_sk")]
    pub sk: String,
    pub entry: String,
    pub id: String,
    pub index: u8,
    /// `<userId>/<date>`: the author's entries for a day.
    pub gsi1: String,
    /// `social/<date>`: present once the entry is shared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gsi2: Option<String>,
}

impl EntryRecord {
    pub fn partition(user_id: &UserId) -> String {
        format!("journal/{user_id}/entry")
    }

    /// Author id encoded in an entry partition key.
    pub fn author_of(pk: &str) -> Option<&str> {
        pk.strip_prefix("journal/")?
            .strip_suffix("/entry")
            .filter(|user| !user.is_empty() && !user.contains('/'))
    }

    pub fn day_index(user_id: &UserId, day: NaiveDate) -> String {
        format!("{user_id}/{}", day_key(day))
    }

    pub fn social_index(day: NaiveDate) -> String {
        format!("{SOCIAL_PREFIX}{}", day_key(day))
    }

    pub fn from_entry(entry: &JournalEntry) -> Self {
        Self {
            pk: Self::partition(&entry.user_id),
            sk: format!("{}/{}", entry.id, entry.index),
            entry: entry.text.clone(),
            id: entry.id.to_string(),
            index: entry.index.get(),
            gsi1: Self::day_index(&entry.user_id, entry.written_on),
            gsi2: entry.shared_on.map(Self::social_index),
        }
    }

    pub fn into_entry(self) -> Result<JournalEntry, RecordError> {
        let author = Self::author_of(&self.pk).ok_or_else(|| unexpected(&self.pk))?;
        let user_id = UserId::new(author).map_err(RecordError::decode)?;
        let written_on = self
            .gsi1
            .rsplit_once('/')
            .map(|(_, day)| parse_day(day))
            .ok_or_else(|| unexpected(&self.gsi1))??;
        let shared_on = self
            .gsi2
            .as_deref()
            .map(|key| {
                key.strip_prefix(SOCIAL_PREFIX)
                    .ok_or_else(|| unexpected(key))
                    .and_then(parse_day)
            })
            .transpose()?;
        Ok(JournalEntry {
            user_id,
            id: EntryId::new(&self.id).map_err(RecordError::decode)?,
            index: EntryIndex::try_from(i64::from(self.index)).map_err(RecordError::decode)?,
            text: self.entry,
            written_on,
            shared_on,
        })
    }
}

/// One user's like of one entry line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRecord {
    #[serde(rename = "_pk")]
    pub pk: String,
    #[serde(rename = "_sk")]
    pub sk: String,
    pub liked_by_id: String,
    pub creator_id: String,
    pub id: String,
    pub index: u8,
    pub value: u32,
}

impl ReactionRecord {
    pub fn key(entry_id: &EntryId, index: EntryIndex, liked_by: &UserId) -> ItemKey {
        ItemKey::new(format!("{REACTION_PREFIX}{entry_id}/{index}"), liked_by.to_string())
    }

    /// Key read by the liked-entries lookup: `reaction/<id>` with the
    /// caller-supplied id used verbatim.
    pub fn lookup_key(id: &str, liked_by: &UserId) -> ItemKey {
        ItemKey::new(format!("{REACTION_PREFIX}{id}"), liked_by.to_string())
    }

    /// Reverse of [`Self::lookup_key`] on a partition key.
    pub fn liked_id(pk: &str) -> Option<&str> {
        pk.strip_prefix(REACTION_PREFIX)
    }

    pub fn is_reaction_partition(pk: &str) -> bool {
        pk.starts_with(REACTION_PREFIX)
    }

    pub fn new(
        creator: &UserId,
        entry_id: &EntryId,
        index: EntryIndex,
        liked_by: &UserId,
    ) -> Self {
        let key = Self::key(entry_id, index, liked_by);
        Self {
            pk: key.pk,
            sk: key.sk,
            liked_by_id: liked_by.to_string(),
            creator_id: creator.to_string(),
            id: entry_id.to_string(),
            index: index.get(),
            value: 1,
        }
    }
}

/// Running count of reactions received by a creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfluenceScoreRecord {
    #[serde(rename = "_pk")]
    pub pk: String,
    #[serde(rename = "_sk")]
    pub sk: String,
    pub score: u64,
}

impl InfluenceScoreRecord {
    pub fn key(creator: &UserId) -> ItemKey {
        ItemKey::new(creator.to_string(), INFLUENCE_SK)
    }

    pub fn new(creator: &UserId, score: u64) -> Self {
        let key = Self::key(creator);
        Self {
            pk: key.pk,
            sk: key.sk,
            score,
        }
    }
}

/// Consecutive-day submission streak for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    #[serde(rename = "_pk")]
    pub pk: String,
    #[serde(rename = "_sk")]
    pub sk: String,
    pub streak_start_date: NaiveDate,
    pub streak_end_date: NaiveDate,
    pub current_streak: u32,
    pub max_streak: u32,
}

impl StreakRecord {
    pub fn key(user_id: &UserId) -> ItemKey {
        ItemKey::new(user_id.to_string(), STREAK_SK)
    }

    pub fn from_streak(user_id: &UserId, streak: &Streak) -> Self {
        let key = Self::key(user_id);
        Self {
            pk: key.pk,
            sk: key.sk,
            streak_start_date: streak.start,
            streak_end_date: streak.end,
            current_streak: streak.current,
            max_streak: streak.max,
        }
    }

    pub fn streak(&self) -> Streak {
        Streak {
            start: self.streak_start_date,
            end: self.streak_end_date,
            current: self.current_streak,
            max: self.max_streak,
        }
    }
}
