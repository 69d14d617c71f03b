//! Change events emitted by the journal store and the filters that route
//! them to the aggregators.

use serde::{Deserialize, Serialize};

use super::records::{EntryRecord, Item, PK, ReactionRecord, Table};
use super::UserId;

/// What happened to the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Modify,
    Remove,
}

/// One item-level change, with images before and after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub event_name: ChangeKind,
    pub table: Table,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_image: Option<Item>,
}

impl ChangeEvent {
    pub fn insert(table: Table, item: Item) -> Self {
        Self {
            event_name: ChangeKind::Insert,
            table,
            new_image: Some(item),
            old_image: None,
        }
    }

    pub fn modify(table: Table, old: Item, new: Item) -> Self {
        Self {
            event_name: ChangeKind::Modify,
            table,
            new_image: Some(new),
            old_image: Some(old),
        }
    }

    pub fn remove(table: Table, old: Item) -> Self {
        Self {
            event_name: ChangeKind::Remove,
            table,
            new_image: None,
            old_image: Some(old),
        }
    }

    fn inserted_journal_item(&self) -> Option<&Item> {
        match (self.event_name, self.table) {
            (ChangeKind::Insert, Table::Journal) => self.new_image.as_ref(),
            _ => None,
        }
    }
}

fn partition_key(item: &Item) -> Option<&str> {
    item.get(PK)?.as_str()
}

/// Author of a newly written journal entry.
///
/// Overwrites (`MODIFY`) do not count, so resubmitting or sharing an entry
/// never advances a streak.
pub fn submitted_entry_author(event: &ChangeEvent) -> Option<UserId> {
    let item = event.inserted_journal_item()?;
    let author = EntryRecord::author_of(partition_key(item)?)?;
    UserId::new(author).ok()
}

/// Creator credited by a newly written reaction.
///
/// Re-reacting overwrites the existing record and so credits no one.
pub fn reacted_creator(event: &ChangeEvent) -> Option<UserId> {
    let item = event.inserted_journal_item()?;
    if !ReactionRecord::is_reaction_partition(partition_key(item)?) {
        return None;
    }
    UserId::new(item.get("creatorId")?.as_str()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};

    const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn item(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            _ => Item::new(),
        }
    }

    fn entry_item() -> Item {
        item(json!({"_pk": format!("journal/{USER}/entry"), "_sk": "s/0", "entry": "x"}))
    }

    fn reaction_item() -> Item {
        item(json!({"_pk": "reaction/s/0", "_sk": "someone", "creatorId": USER}))
    }

    #[rstest]
    fn entry_insert_yields_author() {
        let event = ChangeEvent::insert(Table::Journal, entry_item());
        assert_eq!(submitted_entry_author(&event), UserId::new(USER).ok());
        assert_eq!(reacted_creator(&event), None);
    }

    #[rstest]
    fn reaction_insert_yields_creator() {
        let event = ChangeEvent::insert(Table::Journal, reaction_item());
        assert_eq!(reacted_creator(&event), UserId::new(USER).ok());
        assert_eq!(submitted_entry_author(&event), None);
    }

    #[rstest]
    #[case(ChangeEvent::modify(Table::Journal, entry_item(), entry_item()))]
    #[case(ChangeEvent::remove(Table::Journal, entry_item()))]
    #[case(ChangeEvent::insert(Table::Auth, entry_item()))]
    #[case(ChangeEvent::insert(Table::Journal, item(json!({"_pk": USER, "_sk": "STREAK"}))))]
    fn other_changes_are_ignored(#[case] event: ChangeEvent) {
        assert_eq!(submitted_entry_author(&event), None);
        assert_eq!(reacted_creator(&event), None);
    }

    #[rstest]
    fn reaction_without_valid_creator_is_ignored() {
        let event = ChangeEvent::insert(
            Table::Journal,
            item(json!({"_pk": "reaction/s/0", "_sk": "x", "creatorId": "nope"})),
        );
        assert_eq!(reacted_creator(&event), None);
    }

    #[rstest]
    fn envelope_uses_stream_field_names() {
        let event = ChangeEvent::insert(Table::Journal, reaction_item());
        let value = serde_json::to_value(&event).expect("serialise");
        assert_eq!(value["eventName"], "INSERT");
        assert_eq!(value["newImage"]["_pk"], "reaction/s/0");
        assert!(value.get("oldImage").is_none());
    }
}
