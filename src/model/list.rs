use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a list. Orderable; allocated by [`next_list_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(pub u64);

/// Identifier of an item, unique across every list in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ListId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ListId)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ItemId)
    }
}

/// A single checkable entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl Item {
    pub fn new(id: ItemId, text: String) -> Self {
        Item {
            id,
            text,
            done: false,
        }
    }
}

/// A named, ordered collection of items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: ListId,
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
    /// Missing in data written before creation times were tracked;
    /// back-filled on load.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_pinned: bool,
}

impl List {
    /// Create an empty, unpinned list stamped with `created_at`.
    pub fn new(id: ListId, name: String, created_at: DateTime<Utc>) -> Self {
        List {
            id,
            name,
            items: Vec::new(),
            created_at: Some(created_at),
            is_pinned: false,
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn item_index(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    /// Number of items marked done
    pub fn done_count(&self) -> usize {
        self.items.iter().filter(|i| i.done).count()
    }
}

/// Next free list id: one past the highest id in the collection.
pub fn next_list_id(lists: &[List]) -> ListId {
    ListId(lists.iter().map(|l| l.id.0).max().map_or(1, |m| m + 1))
}

/// Next free item id across all lists, so items can move between lists
/// without colliding.
pub fn next_item_id(lists: &[List]) -> ItemId {
    ItemId(
        lists
            .iter()
            .flat_map(|l| l.items.iter())
            .map(|i| i.id.0)
            .max()
            .map_or(1, |m| m + 1),
    )
}

/// Trim user input; `None` when nothing is left.
pub fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_legacy_shape() {
        // Lists written before pinning and creation times existed
        let json = r#"[{"id":1718000000000,"name":"Groceries","items":[{"id":1718000000001,"text":"Milk","done":true}]}]"#;
        let lists: Vec<List> = serde_json::from_str(json).unwrap();
        assert_eq!(lists[0].id, ListId(1718000000000));
        assert!(!lists[0].is_pinned);
        assert!(lists[0].created_at.is_none());
        assert!(lists[0].items[0].done);
    }

    #[test]
    fn serializes_camel_case_keys() {
        let list = List::new(ListId(3), "Chores".into(), Utc::now());
        let json = serde_json::to_string(&list).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"isPinned\":false"));
        assert!(json.contains("\"id\":3"));
    }

    #[test]
    fn item_defaults_to_not_done() {
        let item: Item = serde_json::from_str(r#"{"id":7,"text":"Eggs"}"#).unwrap();
        assert!(!item.done);
    }

    #[test]
    fn next_ids_are_one_past_max() {
        assert_eq!(next_list_id(&[]), ListId(1));
        assert_eq!(next_item_id(&[]), ItemId(1));

        let mut a = List::new(ListId(4), "A".into(), Utc::now());
        a.items.push(Item::new(ItemId(10), "x".into()));
        let mut b = List::new(ListId(2), "B".into(), Utc::now());
        b.items.push(Item::new(ItemId(12), "y".into()));
        let lists = vec![a, b];
        assert_eq!(next_list_id(&lists), ListId(5));
        assert_eq!(next_item_id(&lists), ItemId(13));
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank("  New  "), Some("New"));
        assert_eq!(non_blank(" \t\n"), None);
        assert_eq!(non_blank(""), None);
    }

    #[test]
    fn parse_ids() {
        assert_eq!("42".parse::<ListId>().unwrap(), ListId(42));
        assert_eq!(" 7 ".parse::<ItemId>().unwrap(), ItemId(7));
        assert!("abc".parse::<ListId>().is_err());
    }
}
