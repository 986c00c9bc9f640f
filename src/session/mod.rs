//! The composed list/item state: canonical collection, selected list id,
//! undo buffer and multi-edit selection, persisted through an injected store.
//!
//! The selected list is held only as an id and resolved by lookup, so there
//! is no second copy of a list to fall out of sync. Every operation checks
//! its inputs before touching the collection; a rejected operation leaves
//! the state exactly as it was.

mod bulk;

pub use bulk::{BulkAction, ConfirmRequest, MoveTarget};

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::io::storage::{KeyValueStore, Storage, StorageError};
use crate::model::list::{Item, ItemId, List, ListId, next_item_id};
use crate::ops::item_ops::{self, ItemError};
use crate::ops::list_ops::{self, ListError};
use crate::ops::undo::{UndoBuffer, UndoRecord};

/// A side effect the consuming view is expected to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Scroll the item list to its end (after an add)
    ScrollToEnd,
    /// Input was refused; show the message as a warning
    Rejected(String),
    /// Show "N item(s) deleted" with an Undo action
    UndoToast { count: usize },
    /// The undo buffer emptied; dismiss the undo notification
    UndoDismissed,
}

impl Effect {
    /// Text a view would show for this effect, if any
    pub fn message(&self) -> Option<String> {
        match self {
            Effect::ScrollToEnd => None,
            Effect::Rejected(msg) => Some(msg.clone()),
            Effect::UndoToast { count } => Some(format!(
                "{} item{} deleted",
                count,
                if *count > 1 { "s" } else { "" }
            )),
            Effect::UndoDismissed => Some("All deletions undone".to_string()),
        }
    }
}

pub type SessionResult = Result<Vec<Effect>, StorageError>;

pub struct Session<S: KeyValueStore> {
    storage: Storage<S>,
    lists: Vec<List>,
    selected: Option<ListId>,
    undo: UndoBuffer,
    /// `Some` while in multi-edit mode: the checked items of the selected list
    multi_edit: Option<HashSet<ItemId>>,
}

impl<S: KeyValueStore> Session<S> {
    /// Load the persisted state from `store`.
    pub fn open(store: S, undo_limit: usize) -> Self {
        Self::open_at(store, undo_limit, Utc::now())
    }

    /// Like [`Session::open`], with lists lacking a creation time stamped `now`.
    pub fn open_at(store: S, undo_limit: usize, now: DateTime<Utc>) -> Self {
        let storage = Storage::new(store);
        let snapshot = storage.load(now);
        let mut undo = UndoBuffer::from_records(snapshot.undo, undo_limit);
        // Records whose list is gone can never be restored
        let stale: HashSet<ListId> = undo
            .records()
            .iter()
            .map(|r| r.list_id)
            .filter(|id| list_ops::find_by_id(&snapshot.lists, *id).is_none())
            .collect();
        for id in stale {
            undo.forget_list(id);
        }
        tracing::debug!(
            lists = snapshot.lists.len(),
            selected = ?snapshot.selected,
            pending_undo = undo.len(),
            "session opened"
        );
        Session {
            storage,
            lists: snapshot.lists,
            selected: snapshot.selected,
            undo,
            multi_edit: None,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn lists(&self) -> &[List] {
        &self.lists
    }

    pub fn find_by_id(&self, id: ListId) -> Option<&List> {
        list_ops::find_by_id(&self.lists, id)
    }

    pub fn selected_id(&self) -> Option<ListId> {
        self.selected
    }

    /// The selected list, looked up in the collection
    pub fn selected(&self) -> Option<&List> {
        self.selected.and_then(|id| self.find_by_id(id))
    }

    pub fn undo_buffer(&self) -> &UndoBuffer {
        &self.undo
    }

    pub fn storage(&self) -> &Storage<S> {
        &self.storage
    }

    // -----------------------------------------------------------------------
    // Lists
    // -----------------------------------------------------------------------

    /// Create a list at the front of the collection and select it.
    pub fn create_list(&mut self, name: &str) -> SessionResult {
        self.create_list_at(name, Utc::now())
    }

    pub fn create_list_at(&mut self, name: &str, now: DateTime<Utc>) -> SessionResult {
        match list_ops::create_list(&mut self.lists, name, now) {
            Ok(id) => {
                self.set_selected(Some(id));
                self.persist()?;
                Ok(Vec::new())
            }
            Err(e) => Ok(vec![rejected_list(e)]),
        }
    }

    pub fn rename_list(&mut self, id: ListId, name: &str) -> SessionResult {
        match list_ops::rename_list(&mut self.lists, id, name) {
            Ok(()) => {
                self.persist()?;
                Ok(Vec::new())
            }
            Err(e) => Ok(vec![rejected_list(e)]),
        }
    }

    /// Delete a list. If it was selected, the next selection stays in the
    /// same pinned/unpinned group when possible. Deleting the last list
    /// clears the persisted state.
    pub fn delete_list(&mut self, id: ListId) -> SessionResult {
        let deleted = match list_ops::delete_list(&mut self.lists, id) {
            Ok(deleted) => deleted,
            Err(e) => return Ok(vec![rejected_list(e)]),
        };

        if self.selected == Some(id) {
            let next = list_ops::selection_after_delete(&self.lists, &deleted);
            self.set_selected(next);
        }

        let had_undo = !self.undo.is_empty();
        self.undo.forget_list(id);
        let mut effects = Vec::new();
        if had_undo && self.undo.is_empty() {
            effects.push(Effect::UndoDismissed);
        }

        if self.lists.is_empty() {
            self.storage.clear()?;
        } else {
            self.persist()?;
        }
        Ok(effects)
    }

    /// Flip a list's pin flag; its position in the collection is unchanged.
    pub fn toggle_pin(&mut self, id: ListId) -> SessionResult {
        match list_ops::toggle_pin(&mut self.lists, id) {
            Ok(_) => {
                self.persist()?;
                Ok(Vec::new())
            }
            Err(e) => Ok(vec![rejected_list(e)]),
        }
    }

    /// Make another list the current one. Leaves multi-edit mode.
    pub fn select(&mut self, id: ListId) -> SessionResult {
        if self.find_by_id(id).is_none() {
            return Ok(vec![rejected_list(ListError::NotFound(id))]);
        }
        self.set_selected(Some(id));
        self.persist()?;
        Ok(Vec::new())
    }

    /// Add a list built elsewhere (e.g. pulled from the remote service) as a
    /// new, selected list. Blank entries are skipped; item ids are fresh.
    pub fn import_list(&mut self, name: &str, entries: &[(String, bool)]) -> SessionResult {
        let id = match list_ops::create_list(&mut self.lists, name, Utc::now()) {
            Ok(id) => id,
            Err(e) => return Ok(vec![rejected_list(e)]),
        };
        let mut next = self.fresh_item_id().0;
        if let Some(list) = list_ops::find_by_id_mut(&mut self.lists, id) {
            for (text, done) in entries {
                if item_ops::add_item(list, ItemId(next), text).is_ok() {
                    if let Some(item) = list.items.last_mut() {
                        item.done = *done;
                    }
                    next += 1;
                }
            }
        }
        self.set_selected(Some(id));
        self.persist()?;
        Ok(Vec::new())
    }

    // -----------------------------------------------------------------------
    // Items of the selected list
    // -----------------------------------------------------------------------

    pub fn add_item(&mut self, text: &str) -> SessionResult {
        let id = self.fresh_item_id();
        let result = match self.selected_list_mut() {
            Some(list) => item_ops::add_item(list, id, text),
            None => return Ok(vec![no_selection()]),
        };
        match result {
            Ok(_) => {
                self.persist()?;
                Ok(vec![Effect::ScrollToEnd])
            }
            Err(e) => Ok(vec![rejected_item(e)]),
        }
    }

    /// Replace an item's text. Blank text is refused with a warning and the
    /// original text stays.
    pub fn edit_item(&mut self, id: ItemId, text: &str) -> SessionResult {
        let result = match self.selected_list_mut() {
            Some(list) => item_ops::edit_item(list, id, text),
            None => return Ok(vec![no_selection()]),
        };
        self.finish_item_edit(result)
    }

    pub fn toggle_item(&mut self, id: ItemId) -> SessionResult {
        let result = match self.selected_list_mut() {
            Some(list) => item_ops::toggle_item(list, id).map(|_| ()),
            None => return Ok(vec![no_selection()]),
        };
        self.finish_item_edit(result)
    }

    /// Delete one item and remember it for [`Session::undo_delete`].
    pub fn delete_item(&mut self, id: ItemId) -> SessionResult {
        let Some(list_id) = self.selected else {
            return Ok(vec![no_selection()]);
        };
        let result = match self.selected_list_mut() {
            Some(list) => item_ops::delete_item(list, id),
            None => return Ok(vec![no_selection()]),
        };
        let (index, item) = match result {
            Ok(removed) => removed,
            Err(e) => return Ok(vec![rejected_item(e)]),
        };
        if let Some(selection) = self.multi_edit.as_mut() {
            selection.remove(&id);
        }
        self.undo.push(UndoRecord {
            list_id,
            index,
            item,
        });
        self.persist()?;
        Ok(vec![Effect::UndoToast {
            count: self.undo.len(),
        }])
    }

    /// Restore the most recent deletion, if it was made in the selected list.
    pub fn undo_delete(&mut self) -> SessionResult {
        let Some(list_id) = self.selected else {
            return Ok(vec![no_selection()]);
        };
        let Some(record) = self.undo.pop_for(list_id) else {
            return Ok(vec![Effect::Rejected("Nothing to undo in this list".into())]);
        };
        if let Some(list) = self.selected_list_mut() {
            item_ops::restore_item(list, record.index, record.item);
        }
        self.persist()?;
        if self.undo.is_empty() {
            Ok(vec![Effect::UndoDismissed])
        } else {
            Ok(vec![Effect::UndoToast {
                count: self.undo.len(),
            }])
        }
    }

    /// Drag-reorder: move `active` to `over`'s position.
    pub fn reorder(&mut self, active: ItemId, over: ItemId) -> SessionResult {
        let moved = match self.selected_list_mut() {
            Some(list) => item_ops::reorder(list, active, over),
            None => return Ok(vec![no_selection()]),
        };
        if moved {
            self.persist()?;
        }
        Ok(Vec::new())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn selected_list_mut(&mut self) -> Option<&mut List> {
        let id = self.selected?;
        list_ops::find_by_id_mut(&mut self.lists, id)
    }

    /// Next item id not used by any list or by a deletion that can still be
    /// undone.
    fn fresh_item_id(&self) -> ItemId {
        let listed = next_item_id(&self.lists);
        let pending = self
            .undo
            .records()
            .iter()
            .map(|r| r.item.id.0 + 1)
            .max()
            .unwrap_or(1);
        ItemId(listed.0.max(pending))
    }

    fn set_selected(&mut self, id: Option<ListId>) {
        if self.selected != id {
            self.multi_edit = None;
        }
        self.selected = id;
    }

    fn finish_item_edit(&mut self, result: Result<(), ItemError>) -> SessionResult {
        match result {
            Ok(()) => {
                self.persist()?;
                Ok(Vec::new())
            }
            Err(e) => Ok(vec![rejected_item(e)]),
        }
    }

    /// Write the collection, selected id and undo records. An empty
    /// collection is left unwritten.
    fn persist(&mut self) -> Result<(), StorageError> {
        if self.lists.is_empty() {
            return Ok(());
        }
        self.storage.save(&self.lists)?;
        self.storage.save_selected_id(self.selected)?;
        self.storage.save_undo(self.undo.records())
    }
}

fn rejected_list(e: ListError) -> Effect {
    tracing::debug!(error = %e, "list operation rejected");
    match e {
        ListError::BlankName => Effect::Rejected("List name cannot be empty".into()),
        ListError::NotFound(id) => Effect::Rejected(format!("List {} not found", id)),
    }
}

fn rejected_item(e: ItemError) -> Effect {
    tracing::debug!(error = %e, "item operation rejected");
    match e {
        ItemError::BlankText => Effect::Rejected("Item text cannot be empty".into()),
        ItemError::NotFound(id) => Effect::Rejected(format!("Item {} not found", id)),
    }
}

fn no_selection() -> Effect {
    Effect::Rejected("No list selected".into())
}

/// Collect items of `list` whose ids are in `ids`, in list order.
fn items_in_order<'a>(list: &'a List, ids: &HashSet<ItemId>) -> Vec<&'a Item> {
    list.items.iter().filter(|i| ids.contains(&i.id)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::{LISTS_KEY, MemoryStore, SELECTED_KEY};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn session() -> Session<MemoryStore> {
        Session::open(MemoryStore::new(), 500)
    }

    fn item_texts(session: &Session<MemoryStore>) -> Vec<String> {
        session
            .selected()
            .map(|l| l.items.iter().map(|i| i.text.clone()).collect())
            .unwrap_or_default()
    }

    fn item_id(session: &Session<MemoryStore>, text: &str) -> ItemId {
        session
            .selected()
            .and_then(|l| l.items.iter().find(|i| i.text == text))
            .map(|i| i.id)
            .unwrap()
    }

    #[test]
    fn create_selects_new_list() {
        let mut s = session();
        s.create_list("Groceries").unwrap();
        s.create_list("Chores").unwrap();
        assert_eq!(s.lists()[0].name, "Chores");
        assert_eq!(s.selected().unwrap().name, "Chores");
    }

    #[test]
    fn create_blank_is_rejected_without_change() {
        let mut s = session();
        let effects = s.create_list("   ").unwrap();
        assert!(matches!(effects.as_slice(), [Effect::Rejected(_)]));
        assert!(s.lists().is_empty());
        assert!(s.selected().is_none());
        assert!(!s.storage().store().contains(LISTS_KEY));
    }

    #[test]
    fn rename_is_visible_through_selection() {
        let mut s = session();
        s.create_list("Old").unwrap();
        let id = s.selected_id().unwrap();
        s.rename_list(id, "  New  ").unwrap();
        assert_eq!(s.selected().unwrap().name, "New");
    }

    #[test]
    fn delete_only_list_clears_everything() {
        let mut s = session();
        s.create_list("Only").unwrap();
        s.add_item("Milk").unwrap();
        let id = s.selected_id().unwrap();
        s.delete_list(id).unwrap();
        assert!(s.lists().is_empty());
        assert!(s.selected().is_none());
        assert!(!s.storage().store().contains(LISTS_KEY));
        assert!(!s.storage().store().contains(SELECTED_KEY));
    }

    #[test]
    fn delete_unselected_list_keeps_selection() {
        let mut s = session();
        s.create_list("A").unwrap();
        let a = s.selected_id().unwrap();
        s.create_list("B").unwrap();
        let b = s.selected_id().unwrap();
        s.delete_list(a).unwrap();
        assert_eq!(s.selected_id(), Some(b));
    }

    #[test]
    fn delete_list_drops_its_undo_records() {
        let mut s = session();
        s.create_list("A").unwrap();
        let a = s.selected_id().unwrap();
        s.add_item("x").unwrap();
        s.delete_item(item_id(&s, "x")).unwrap();
        s.create_list("B").unwrap();
        let effects = s.delete_list(a).unwrap();
        assert_eq!(effects, vec![Effect::UndoDismissed]);
        assert!(s.undo_buffer().is_empty());
    }

    #[test]
    fn select_missing_list_is_rejected() {
        let mut s = session();
        s.create_list("A").unwrap();
        let before = s.selected_id();
        let effects = s.select(ListId(99)).unwrap();
        assert!(matches!(effects.as_slice(), [Effect::Rejected(_)]));
        assert_eq!(s.selected_id(), before);
    }

    #[test]
    fn add_item_scrolls_and_uses_fresh_ids() {
        let mut s = session();
        s.create_list("A").unwrap();
        assert_eq!(s.add_item("Milk").unwrap(), vec![Effect::ScrollToEnd]);
        s.add_item("Eggs").unwrap();
        let ids: Vec<ItemId> = s.selected().unwrap().items.iter().map(|i| i.id).collect();
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn item_ops_without_selection() {
        let mut s = session();
        assert_eq!(
            s.add_item("Milk").unwrap(),
            vec![Effect::Rejected("No list selected".into())]
        );
    }

    #[test]
    fn edit_to_whitespace_is_rejected() {
        let mut s = session();
        s.create_list("A").unwrap();
        s.add_item("Milk").unwrap();
        let id = item_id(&s, "Milk");
        let effects = s.edit_item(id, "   ").unwrap();
        assert_eq!(
            effects,
            vec![Effect::Rejected("Item text cannot be empty".into())]
        );
        assert_eq!(item_texts(&s), vec!["Milk"]);
    }

    #[test]
    fn delete_then_undo_restores_position() {
        let mut s = session();
        s.create_list("A").unwrap();
        for t in ["a", "b", "c"] {
            s.add_item(t).unwrap();
        }
        let before = s.selected().unwrap().items.clone();
        let effects = s.delete_item(item_id(&s, "b")).unwrap();
        assert_eq!(effects, vec![Effect::UndoToast { count: 1 }]);
        assert_eq!(item_texts(&s), vec!["a", "c"]);

        let effects = s.undo_delete().unwrap();
        assert_eq!(effects, vec![Effect::UndoDismissed]);
        assert_eq!(s.selected().unwrap().items, before);
    }

    #[test]
    fn undo_restores_most_recent_first() {
        let mut s = session();
        s.create_list("A").unwrap();
        for t in ["a", "b", "c"] {
            s.add_item(t).unwrap();
        }
        s.delete_item(item_id(&s, "a")).unwrap();
        let effects = s.delete_item(item_id(&s, "c")).unwrap();
        assert_eq!(effects, vec![Effect::UndoToast { count: 2 }]);

        assert_eq!(s.undo_delete().unwrap(), vec![Effect::UndoToast { count: 1 }]);
        assert_eq!(item_texts(&s), vec!["b", "c"]);
        s.undo_delete().unwrap();
        assert_eq!(item_texts(&s), vec!["a", "b", "c"]);
    }

    #[test]
    fn add_after_delete_does_not_reuse_pending_id() {
        let mut s = session();
        s.create_list("Groceries").unwrap();
        s.add_item("Milk").unwrap();
        s.add_item("Eggs").unwrap();
        let eggs = item_id(&s, "Eggs");
        s.delete_item(eggs).unwrap();
        s.add_item("Bread").unwrap();
        assert_ne!(item_id(&s, "Bread"), eggs);

        s.undo_delete().unwrap();
        let ids: HashSet<ItemId> = s.selected().unwrap().items.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(item_texts(&s), vec!["Milk", "Eggs", "Bread"]);
    }

    #[test]
    fn import_skips_ids_waiting_for_undo() {
        let mut s = session();
        s.create_list("Local").unwrap();
        s.add_item("x").unwrap();
        let x = item_id(&s, "x");
        s.delete_item(x).unwrap();
        s.import_list("Trip", &[("Tickets".to_string(), false)]).unwrap();
        assert_ne!(item_id(&s, "Tickets"), x);
    }

    #[test]
    fn undo_is_scoped_to_selected_list() {
        let mut s = session();
        s.create_list("A").unwrap();
        let a = s.selected_id().unwrap();
        s.add_item("x").unwrap();
        s.delete_item(item_id(&s, "x")).unwrap();

        s.create_list("B").unwrap();
        let effects = s.undo_delete().unwrap();
        assert!(matches!(effects.as_slice(), [Effect::Rejected(_)]));
        assert_eq!(s.undo_buffer().len(), 1);

        s.select(a).unwrap();
        s.undo_delete().unwrap();
        assert_eq!(item_texts(&s), vec!["x"]);
    }

    #[test]
    fn reorder_persists() {
        let mut s = session();
        s.create_list("A").unwrap();
        for t in ["a", "b", "c"] {
            s.add_item(t).unwrap();
        }
        s.reorder(item_id(&s, "c"), item_id(&s, "a")).unwrap();
        assert_eq!(item_texts(&s), vec!["c", "a", "b"]);

        let reopened = Session::open(s.storage().store().clone(), 500);
        assert_eq!(item_texts(&reopened), vec!["c", "a", "b"]);
    }

    #[test]
    fn state_survives_reopen() {
        let mut s = session();
        s.create_list_at("A", at(0)).unwrap();
        s.add_item("x").unwrap();
        s.delete_item(item_id(&s, "x")).unwrap();
        s.create_list_at("B", at(10)).unwrap();
        let b = s.selected_id().unwrap();

        let reopened = Session::open(s.storage().store().clone(), 500);
        assert_eq!(reopened.lists(), s.lists());
        assert_eq!(reopened.selected_id(), Some(b));
        assert_eq!(reopened.undo_buffer().len(), 1);
    }

    #[test]
    fn import_list_skips_blank_entries() {
        let mut s = session();
        s.create_list("Local").unwrap();
        s.add_item("keep").unwrap();
        let entries = vec![
            ("Tickets".to_string(), true),
            ("   ".to_string(), false),
            ("Passport".to_string(), false),
        ];
        s.import_list("Trip", &entries).unwrap();
        let list = s.selected().unwrap();
        assert_eq!(list.name, "Trip");
        assert_eq!(list.items.len(), 2);
        assert!(list.items[0].done);
        assert_eq!(list.items[1].text, "Passport");
        // ids never collide with existing items
        let all: HashSet<ItemId> = s
            .lists()
            .iter()
            .flat_map(|l| l.items.iter().map(|i| i.id))
            .collect();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn effect_messages() {
        assert_eq!(
            Effect::UndoToast { count: 1 }.message().as_deref(),
            Some("1 item deleted")
        );
        assert_eq!(
            Effect::UndoToast { count: 3 }.message().as_deref(),
            Some("3 items deleted")
        );
        assert_eq!(
            Effect::UndoDismissed.message().as_deref(),
            Some("All deletions undone")
        );
        assert!(Effect::ScrollToEnd.message().is_none());
    }
}
