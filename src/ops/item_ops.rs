use std::collections::HashSet;

use crate::model::list::{Item, ItemId, List, non_blank};

/// Error type for item operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error("item not found: {0}")]
    NotFound(ItemId),
    #[error("item text cannot be blank")]
    BlankText,
}

/// Where to put items moved within their own list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
}

// ---------------------------------------------------------------------------
// Single-item edits
// ---------------------------------------------------------------------------

/// Append a new, not-done item with the given id.
pub fn add_item(list: &mut List, id: ItemId, text: &str) -> Result<ItemId, ItemError> {
    let text = non_blank(text).ok_or(ItemError::BlankText)?;
    list.items.push(Item::new(id, text.to_string()));
    Ok(id)
}

/// Replace an item's text in place, keeping `done` and position.
pub fn edit_item(list: &mut List, id: ItemId, text: &str) -> Result<(), ItemError> {
    let text = non_blank(text).ok_or(ItemError::BlankText)?;
    let item = list.item_mut(id).ok_or(ItemError::NotFound(id))?;
    item.text = text.to_string();
    Ok(())
}

/// Flip `done`. Returns the new value.
pub fn toggle_item(list: &mut List, id: ItemId) -> Result<bool, ItemError> {
    let item = list.item_mut(id).ok_or(ItemError::NotFound(id))?;
    item.done = !item.done;
    Ok(item.done)
}

/// Remove an item, returning it with the index it occupied.
pub fn delete_item(list: &mut List, id: ItemId) -> Result<(usize, Item), ItemError> {
    let index = list.item_index(id).ok_or(ItemError::NotFound(id))?;
    Ok((index, list.items.remove(index)))
}

/// Put an item back at `index`, clamped to the current length.
pub fn restore_item(list: &mut List, index: usize, item: Item) {
    let index = index.min(list.items.len());
    list.items.insert(index, item);
}

/// Move `active` to the slot currently held by `over`, shifting the items in
/// between. Returns false (and changes nothing) when the ids are equal or
/// either is missing.
pub fn reorder(list: &mut List, active: ItemId, over: ItemId) -> bool {
    if active == over {
        return false;
    }
    let (Some(from), Some(to)) = (list.item_index(active), list.item_index(over)) else {
        return false;
    };
    let item = list.items.remove(from);
    list.items.insert(to, item);
    true
}

// ---------------------------------------------------------------------------
// Bulk edits
// ---------------------------------------------------------------------------

/// Set `done` on every selected item. Returns how many actually changed.
pub fn set_done_many(list: &mut List, ids: &HashSet<ItemId>, done: bool) -> usize {
    let mut changed = 0;
    for item in list.items.iter_mut().filter(|i| ids.contains(&i.id)) {
        if item.done != done {
            item.done = done;
            changed += 1;
        }
    }
    changed
}

/// Remove the selected items, returning them in their list order.
pub fn take_many(list: &mut List, ids: &HashSet<ItemId>) -> Vec<Item> {
    let (taken, kept): (Vec<Item>, Vec<Item>) = list
        .items
        .drain(..)
        .partition(|i| ids.contains(&i.id));
    list.items = kept;
    taken
}

/// Move the selected items to one end of the list, keeping their relative order.
pub fn move_to_edge(list: &mut List, ids: &HashSet<ItemId>, edge: Edge) {
    let taken = take_many(list, ids);
    match edge {
        Edge::Top => {
            list.items.splice(0..0, taken);
        }
        Edge::Bottom => list.items.extend(taken),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::list::ListId;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn sample_list() -> List {
        let mut list = List::new(ListId(1), "Groceries".into(), Utc::now());
        for (id, text) in [(1, "Milk"), (2, "Eggs"), (3, "Bread"), (4, "Jam"), (5, "Tea")] {
            list.items.push(Item::new(ItemId(id), text.into()));
        }
        list
    }

    fn order(list: &List) -> Vec<u64> {
        list.items.iter().map(|i| i.id.0).collect()
    }

    fn set(ids: &[u64]) -> HashSet<ItemId> {
        ids.iter().map(|&i| ItemId(i)).collect()
    }

    #[test]
    fn add_appends_trimmed_not_done() {
        let mut list = sample_list();
        add_item(&mut list, ItemId(6), "  Butter ").unwrap();
        let last = list.items.last().unwrap();
        assert_eq!(last.text, "Butter");
        assert!(!last.done);
        assert_eq!(last.id, ItemId(6));
    }

    #[test]
    fn add_blank_is_rejected() {
        let mut list = sample_list();
        assert_eq!(add_item(&mut list, ItemId(6), "  "), Err(ItemError::BlankText));
        assert_eq!(list.items.len(), 5);
    }

    #[test]
    fn edit_keeps_done_and_position() {
        let mut list = sample_list();
        list.items[1].done = true;
        edit_item(&mut list, ItemId(2), " Free-range eggs ").unwrap();
        assert_eq!(list.items[1].text, "Free-range eggs");
        assert!(list.items[1].done);
        assert_eq!(order(&list), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn edit_to_whitespace_leaves_text() {
        let mut list = sample_list();
        assert_eq!(edit_item(&mut list, ItemId(2), " \t "), Err(ItemError::BlankText));
        assert_eq!(list.items[1].text, "Eggs");
    }

    #[test]
    fn toggle_flips() {
        let mut list = sample_list();
        assert!(toggle_item(&mut list, ItemId(3)).unwrap());
        assert!(!toggle_item(&mut list, ItemId(3)).unwrap());
        assert_eq!(toggle_item(&mut list, ItemId(99)), Err(ItemError::NotFound(ItemId(99))));
    }

    #[test]
    fn delete_then_restore_round_trips() {
        let mut list = sample_list();
        let before = list.clone();
        let (index, item) = delete_item(&mut list, ItemId(3)).unwrap();
        assert_eq!(index, 2);
        assert_eq!(order(&list), vec![1, 2, 4, 5]);
        restore_item(&mut list, index, item);
        assert_eq!(list, before);
    }

    #[test]
    fn restore_clamps_index() {
        let mut list = sample_list();
        restore_item(&mut list, 40, Item::new(ItemId(9), "Late".into()));
        assert_eq!(list.items.last().unwrap().id, ItemId(9));
    }

    #[test]
    fn reorder_forward_and_back() {
        let mut list = sample_list();
        assert!(reorder(&mut list, ItemId(1), ItemId(4)));
        assert_eq!(order(&list), vec![2, 3, 4, 1, 5]);
        assert!(reorder(&mut list, ItemId(1), ItemId(2)));
        assert_eq!(order(&list), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn reorder_adjacent_is_self_inverse() {
        let mut list = sample_list();
        reorder(&mut list, ItemId(2), ItemId(3));
        assert_eq!(order(&list), vec![1, 3, 2, 4, 5]);
        reorder(&mut list, ItemId(3), ItemId(2));
        assert_eq!(order(&list), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn reorder_noops() {
        let mut list = sample_list();
        assert!(!reorder(&mut list, ItemId(2), ItemId(2)));
        assert!(!reorder(&mut list, ItemId(2), ItemId(42)));
        assert!(!reorder(&mut list, ItemId(42), ItemId(2)));
        assert_eq!(order(&list), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn set_done_many_counts_changes() {
        let mut list = sample_list();
        list.items[0].done = true;
        assert_eq!(set_done_many(&mut list, &set(&[1, 2, 4]), true), 2);
        assert!(list.items[0].done && list.items[1].done && list.items[3].done);
        assert!(!list.items[2].done);
        assert_eq!(set_done_many(&mut list, &set(&[1, 2]), false), 2);
    }

    #[test]
    fn take_many_preserves_list_order() {
        let mut list = sample_list();
        let taken = take_many(&mut list, &set(&[5, 2, 4]));
        let taken_ids: Vec<u64> = taken.iter().map(|i| i.id.0).collect();
        assert_eq!(taken_ids, vec![2, 4, 5]);
        assert_eq!(order(&list), vec![1, 3]);
    }

    #[test]
    fn move_to_top_and_bottom() {
        let mut list = sample_list();
        move_to_edge(&mut list, &set(&[4, 2]), Edge::Top);
        assert_eq!(order(&list), vec![2, 4, 1, 3, 5]);

        move_to_edge(&mut list, &set(&[2, 1]), Edge::Bottom);
        assert_eq!(order(&list), vec![4, 3, 5, 2, 1]);
    }
}
