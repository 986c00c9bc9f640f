use chrono::{DateTime, Utc};

use crate::model::list::{List, ListId, next_list_id, non_blank};

/// Error type for list operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error("list not found: {0}")]
    NotFound(ListId),
    #[error("list name cannot be blank")]
    BlankName,
}

/// What was removed by [`delete_list`], needed to pick the next selection.
#[derive(Debug, Clone)]
pub struct DeletedList {
    pub index: usize,
    pub list: List,
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Insert a new empty list at the front of the collection.
pub fn create_list(
    lists: &mut Vec<List>,
    name: &str,
    now: DateTime<Utc>,
) -> Result<ListId, ListError> {
    let name = non_blank(name).ok_or(ListError::BlankName)?;
    let id = next_list_id(lists);
    lists.insert(0, List::new(id, name.to_string(), now));
    tracing::debug!(list = %id, "created list");
    Ok(id)
}

/// Replace a list's name in place. Items, id, creation time, pin state and
/// position are untouched.
pub fn rename_list(lists: &mut [List], id: ListId, name: &str) -> Result<(), ListError> {
    let name = non_blank(name).ok_or(ListError::BlankName)?;
    let list = find_by_id_mut(lists, id).ok_or(ListError::NotFound(id))?;
    list.name = name.to_string();
    Ok(())
}

pub fn delete_list(lists: &mut Vec<List>, id: ListId) -> Result<DeletedList, ListError> {
    let index = lists
        .iter()
        .position(|l| l.id == id)
        .ok_or(ListError::NotFound(id))?;
    let list = lists.remove(index);
    tracing::debug!(list = %id, index, "deleted list");
    Ok(DeletedList { index, list })
}

/// Flip the pin flag. Pinning never moves the list in the collection.
pub fn toggle_pin(lists: &mut [List], id: ListId) -> Result<bool, ListError> {
    let list = find_by_id_mut(lists, id).ok_or(ListError::NotFound(id))?;
    list.is_pinned = !list.is_pinned;
    Ok(list.is_pinned)
}

pub fn find_by_id(lists: &[List], id: ListId) -> Option<&List> {
    lists.iter().find(|l| l.id == id)
}

pub fn find_by_id_mut(lists: &mut [List], id: ListId) -> Option<&mut List> {
    lists.iter_mut().find(|l| l.id == id)
}

// ---------------------------------------------------------------------------
// Presentation helpers
// ---------------------------------------------------------------------------

/// Split lists into (pinned, unpinned), each in collection order.
pub fn partition_by_pin(lists: &[List]) -> (Vec<&List>, Vec<&List>) {
    lists.iter().partition(|l| l.is_pinned)
}

/// Pick the list to select after the selected list was deleted.
///
/// `remaining` is the collection after removal and `deleted` what was removed.
/// Stays within the deleted list's pinned/unpinned group when possible:
/// nearest earlier, then nearest later. Falls back to the other group: the
/// newest unpinned list when a pinned list was deleted, the oldest pinned list
/// when an unpinned one was.
pub fn selection_after_delete(remaining: &[List], deleted: &DeletedList) -> Option<ListId> {
    let pinned = deleted.list.is_pinned;
    let same_group = |l: &&List| l.is_pinned == pinned;

    let earlier = remaining[..deleted.index.min(remaining.len())]
        .iter()
        .rev()
        .find(same_group);
    if let Some(l) = earlier {
        return Some(l.id);
    }

    let later = remaining
        .get(deleted.index..)
        .unwrap_or(&[])
        .iter()
        .find(same_group);
    if let Some(l) = later {
        return Some(l.id);
    }

    let others = remaining.iter().filter(|l| l.is_pinned != pinned);
    let fallback = if pinned {
        others.max_by_key(|l| (l.created_at, l.id))
    } else {
        others.min_by_key(|l| (l.created_at, l.id))
    };
    fallback.map(|l| l.id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::list::{Item, ItemId};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn list(id: u64, name: &str, pinned: bool, created: i64) -> List {
        let mut l = List::new(ListId(id), name.into(), at(created));
        l.is_pinned = pinned;
        l
    }

    fn ids(lists: &[&List]) -> Vec<u64> {
        lists.iter().map(|l| l.id.0).collect()
    }

    fn delete_and_select(lists: &mut Vec<List>, id: u64) -> Option<ListId> {
        let deleted = delete_list(lists, ListId(id)).unwrap();
        selection_after_delete(lists, &deleted)
    }

    // --- CRUD ---

    #[test]
    fn create_inserts_at_front() {
        let mut lists = vec![list(1, "Old", false, 0)];
        let id = create_list(&mut lists, "  Groceries ", at(5)).unwrap();
        assert_eq!(id, ListId(2));
        assert_eq!(lists[0].name, "Groceries");
        assert!(lists[0].items.is_empty());
        assert!(!lists[0].is_pinned);
        assert_eq!(lists[0].created_at, Some(at(5)));
        assert_eq!(lists[1].name, "Old");
    }

    #[test]
    fn create_blank_name_leaves_collection_unchanged() {
        let mut lists = vec![list(1, "Old", false, 0)];
        let before = lists.clone();
        assert_eq!(create_list(&mut lists, "   ", at(1)), Err(ListError::BlankName));
        assert_eq!(create_list(&mut lists, "", at(1)), Err(ListError::BlankName));
        assert_eq!(lists, before);
    }

    #[test]
    fn rename_trims_and_preserves_other_fields() {
        let mut l = list(1, "Old", true, 3);
        l.items.push(Item::new(ItemId(9), "Milk".into()));
        let mut lists = vec![list(2, "Other", false, 0), l.clone()];

        rename_list(&mut lists, ListId(1), "  New  ").unwrap();
        let renamed = &lists[1];
        assert_eq!(renamed.name, "New");
        assert_eq!(renamed.items, l.items);
        assert_eq!(renamed.id, l.id);
        assert_eq!(renamed.created_at, l.created_at);
        assert!(renamed.is_pinned);
    }

    #[test]
    fn rename_blank_or_missing() {
        let mut lists = vec![list(1, "Old", false, 0)];
        assert_eq!(rename_list(&mut lists, ListId(1), " "), Err(ListError::BlankName));
        assert_eq!(
            rename_list(&mut lists, ListId(8), "X"),
            Err(ListError::NotFound(ListId(8)))
        );
        assert_eq!(lists[0].name, "Old");
    }

    #[test]
    fn toggle_pin_keeps_position_and_contents() {
        let mut lists = vec![list(1, "A", true, 0), list(2, "B", false, 1)];
        lists[1].items.push(Item::new(ItemId(1), "x".into()));
        let items_before = lists[1].items.clone();

        assert!(toggle_pin(&mut lists, ListId(2)).unwrap());
        assert_eq!(lists[1].id, ListId(2));
        assert_eq!(lists[1].items, items_before);

        let (pinned, unpinned) = partition_by_pin(&lists);
        assert_eq!(ids(&pinned), vec![1, 2]);
        assert!(unpinned.is_empty());

        assert!(!toggle_pin(&mut lists, ListId(2)).unwrap());
        let (pinned, unpinned) = partition_by_pin(&lists);
        assert_eq!(ids(&pinned), vec![1]);
        assert_eq!(ids(&unpinned), vec![2]);
    }

    #[test]
    fn find_by_id_present_and_absent() {
        let lists = vec![list(1, "A", false, 0)];
        assert_eq!(find_by_id(&lists, ListId(1)).map(|l| l.name.as_str()), Some("A"));
        assert!(find_by_id(&lists, ListId(2)).is_none());
    }

    // --- Deletion tie-break ---

    #[test]
    fn delete_only_list_selects_nothing() {
        let mut lists = vec![list(1, "A", false, 0)];
        assert_eq!(delete_and_select(&mut lists, 1), None);
        assert!(lists.is_empty());
    }

    #[test]
    fn delete_pinned_prefers_earlier_pinned() {
        // Unpinned list 5 is newer and adjacent, but a pinned list exists earlier
        let mut lists = vec![
            list(1, "P1", true, 0),
            list(5, "U", false, 50),
            list(2, "P2", true, 10),
            list(3, "P3", true, 20),
        ];
        assert_eq!(delete_and_select(&mut lists, 2), Some(ListId(1)));
    }

    #[test]
    fn delete_pinned_falls_back_to_later_pinned() {
        let mut lists = vec![
            list(1, "U", false, 0),
            list(2, "P", true, 10),
            list(3, "U2", false, 20),
            list(4, "P2", true, 30),
        ];
        assert_eq!(delete_and_select(&mut lists, 2), Some(ListId(4)));
    }

    #[test]
    fn delete_last_pinned_selects_newest_unpinned() {
        let mut lists = vec![
            list(1, "U-old", false, 0),
            list(2, "P", true, 10),
            list(3, "U-new", false, 99),
            list(4, "U-mid", false, 50),
        ];
        assert_eq!(delete_and_select(&mut lists, 2), Some(ListId(3)));
    }

    #[test]
    fn delete_unpinned_prefers_earlier_then_later_unpinned() {
        let mut lists = vec![
            list(1, "U1", false, 0),
            list(2, "P", true, 10),
            list(3, "U3", false, 20),
        ];
        assert_eq!(delete_and_select(&mut lists, 3), Some(ListId(1)));

        let mut lists = vec![
            list(2, "P", true, 10),
            list(3, "U3", false, 20),
            list(4, "U4", false, 30),
        ];
        assert_eq!(delete_and_select(&mut lists, 3), Some(ListId(4)));
    }

    #[test]
    fn delete_last_unpinned_selects_oldest_pinned() {
        let mut lists = vec![
            list(1, "P-new", true, 90),
            list(2, "U", false, 10),
            list(3, "P-old", true, 5),
        ];
        assert_eq!(delete_and_select(&mut lists, 2), Some(ListId(3)));
    }

    #[test]
    fn missing_created_at_sorts_oldest() {
        let mut legacy = list(3, "P-legacy", true, 0);
        legacy.created_at = None;
        let mut lists = vec![list(1, "P", true, 10), list(2, "U", false, 20), legacy];
        assert_eq!(delete_and_select(&mut lists, 2), Some(ListId(3)));
    }

    #[test]
    fn delete_missing_list_is_not_found() {
        let mut lists = vec![list(1, "A", false, 0)];
        assert!(matches!(
            delete_list(&mut lists, ListId(9)),
            Err(ListError::NotFound(ListId(9)))
        ));
        assert_eq!(lists.len(), 1);
    }
}
