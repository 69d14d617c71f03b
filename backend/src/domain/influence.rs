//! Influence scores: reactions received per creator.

use std::collections::BTreeMap;

use super::UserId;

/// Reactions per creator within one event batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfluenceTally(BTreeMap<UserId, u64>);

impl InfluenceTally {
    pub fn record(&mut self, creator: UserId) {
        let count = self.0.entry(creator).or_default();
        *count = count.saturating_add(1);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn creators(&self) -> impl Iterator<Item = &UserId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, u64)> {
        self.0.iter().map(|(creator, count)| (creator, *count))
    }

    /// New score for `creator` given its stored score, or zero if none.
    pub fn apply(&self, creator: &UserId, stored: Option<u64>) -> u64 {
        let gained = self.0.get(creator).copied().unwrap_or_default();
        stored.unwrap_or_default().saturating_add(gained)
    }
}

impl FromIterator<UserId> for InfluenceTally {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        let mut tally = Self::default();
        for creator in iter {
            tally.record(creator);
        }
        tally
    }
}
