//! Multi-edit mode: a checked subset of the selected list's items that bulk
//! actions apply to.

use std::collections::HashSet;

use chrono::Utc;

use super::{Effect, Session, SessionResult, items_in_order, no_selection, rejected_list};
use crate::io::storage::KeyValueStore;
use crate::model::list::{ItemId, ListId};
use crate::ops::item_ops::{self, Edge};
use crate::ops::list_ops::{self, ListError};

/// A bulk action that needs confirmation before it commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Delete,
    MarkDone,
    MarkNotDone,
}

/// Pending bulk action, handed to the view for a yes/no prompt and back to
/// [`Session::confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub action: BulkAction,
    pub list_id: ListId,
    pub item_ids: Vec<ItemId>,
    pub title: String,
    pub description: String,
}

/// Where [`Session::bulk_move`] sends the checked items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    Top,
    Bottom,
    List(ListId),
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "item" } else { "items" }
}

impl<S: KeyValueStore> Session<S> {
    pub fn is_multi_edit(&self) -> bool {
        self.multi_edit.is_some()
    }

    /// Checked items, in list order
    pub fn checked_items(&self) -> Vec<ItemId> {
        match (&self.multi_edit, self.selected()) {
            (Some(ids), Some(list)) => items_in_order(list, ids).iter().map(|i| i.id).collect(),
            _ => Vec::new(),
        }
    }

    /// Start multi-edit with nothing checked. No-op without a selected list.
    pub fn enter_multi_edit(&mut self) {
        if self.selected().is_some() && self.multi_edit.is_none() {
            self.multi_edit = Some(HashSet::new());
        }
    }

    pub fn exit_multi_edit(&mut self) {
        self.multi_edit = None;
    }

    /// Toggle an item's membership in the checked set.
    pub fn select_item(&mut self, id: ItemId) {
        let exists = self.selected().is_some_and(|l| l.item(id).is_some());
        if let (true, Some(ids)) = (exists, self.multi_edit.as_mut()) {
            if !ids.remove(&id) {
                ids.insert(id);
            }
        }
    }

    /// Check every item of the selected list, or clear the checked set.
    pub fn select_all(&mut self, checked: bool) {
        let all: HashSet<ItemId> = match self.selected() {
            Some(list) if checked => list.items.iter().map(|i| i.id).collect(),
            _ => HashSet::new(),
        };
        if let Some(ids) = self.multi_edit.as_mut() {
            *ids = all;
        }
    }

    pub fn bulk_delete(&self) -> Option<ConfirmRequest> {
        self.request_bulk(BulkAction::Delete)
    }

    pub fn bulk_mark_done(&self) -> Option<ConfirmRequest> {
        self.request_bulk(BulkAction::MarkDone)
    }

    pub fn bulk_mark_not_done(&self) -> Option<ConfirmRequest> {
        self.request_bulk(BulkAction::MarkNotDone)
    }

    /// Build the confirmation for `action` over the checked items. `None`
    /// outside multi-edit or when nothing is checked.
    pub fn request_bulk(&self, action: BulkAction) -> Option<ConfirmRequest> {
        let list_id = self.selected_id()?;
        let item_ids = self.checked_items();
        if item_ids.is_empty() {
            return None;
        }
        let n = item_ids.len();
        let (title, description) = match action {
            BulkAction::Delete => (
                format!("Delete {} {}?", n, plural(n)),
                "This cannot be undone.".to_string(),
            ),
            BulkAction::MarkDone => (
                format!("Mark {} {} as done?", n, plural(n)),
                "The selected items will be checked off.".to_string(),
            ),
            BulkAction::MarkNotDone => (
                format!("Mark {} {} as not done?", n, plural(n)),
                "The selected items will be unchecked.".to_string(),
            ),
        };
        Some(ConfirmRequest {
            action,
            list_id,
            item_ids,
            title,
            description,
        })
    }

    /// Commit a confirmed bulk action. A request made for a list that is no
    /// longer selected is dropped. Bulk deletes are not undoable.
    pub fn confirm(&mut self, request: ConfirmRequest) -> SessionResult {
        if self.selected != Some(request.list_id) {
            return Ok(vec![Effect::Rejected(
                "Selection changed; bulk action dropped".into(),
            )]);
        }
        let ids: HashSet<ItemId> = request.item_ids.iter().copied().collect();
        let Some(list) = self.selected_list_mut() else {
            return Ok(vec![no_selection()]);
        };
        match request.action {
            BulkAction::Delete => {
                let removed = item_ops::take_many(list, &ids);
                tracing::debug!(list = %request.list_id, count = removed.len(), "bulk delete");
                if let Some(checked) = self.multi_edit.as_mut() {
                    checked.retain(|id| !ids.contains(id));
                }
            }
            BulkAction::MarkDone => {
                item_ops::set_done_many(list, &ids, true);
            }
            BulkAction::MarkNotDone => {
                item_ops::set_done_many(list, &ids, false);
            }
        }
        self.persist()?;
        Ok(Vec::new())
    }

    /// Move the checked items to the top or bottom of their list (staying in
    /// multi-edit), or append them to another list (leaving multi-edit).
    pub fn bulk_move(&mut self, target: MoveTarget) -> SessionResult {
        let Some(source_id) = self.selected else {
            return Ok(Vec::new());
        };
        let ids: HashSet<ItemId> = match &self.multi_edit {
            Some(ids) if !ids.is_empty() => ids.clone(),
            _ => return Ok(Vec::new()),
        };

        match target {
            MoveTarget::Top | MoveTarget::Bottom => {
                let edge = if target == MoveTarget::Top {
                    Edge::Top
                } else {
                    Edge::Bottom
                };
                if let Some(list) = self.selected_list_mut() {
                    item_ops::move_to_edge(list, &ids, edge);
                }
            }
            MoveTarget::List(target_id) => {
                if target_id == source_id {
                    return Ok(vec![Effect::Rejected(
                        "Items are already in that list".into(),
                    )]);
                }
                if self.find_by_id(target_id).is_none() {
                    return Ok(vec![rejected_list(ListError::NotFound(target_id))]);
                }
                let moved = match self.selected_list_mut() {
                    Some(list) => item_ops::take_many(list, &ids),
                    None => return Ok(vec![no_selection()]),
                };
                tracing::debug!(from = %source_id, to = %target_id, count = moved.len(), "moved items");
                if let Some(target) = list_ops::find_by_id_mut(&mut self.lists, target_id) {
                    target.items.extend(moved);
                }
                self.exit_multi_edit();
            }
        }
        self.persist()?;
        Ok(Vec::new())
    }

    /// Create a list named `name` holding the given items of the selected
    /// list (in their list order), remove them from the source and select
    /// the new list.
    pub fn split_to_new_list(&mut self, name: &str, ids: &HashSet<ItemId>) -> SessionResult {
        let Some(source_id) = self.selected else {
            return Ok(vec![no_selection()]);
        };
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let present = self
            .find_by_id(source_id)
            .map(|source| !items_in_order(source, ids).is_empty())
            .unwrap_or(false);
        if !present {
            return Ok(vec![Effect::Rejected(
                "None of those items are in this list".into(),
            )]);
        }
        let new_id = match list_ops::create_list(&mut self.lists, name, Utc::now()) {
            Ok(id) => id,
            Err(e) => return Ok(vec![rejected_list(e)]),
        };
        let moved = match list_ops::find_by_id_mut(&mut self.lists, source_id) {
            Some(source) => item_ops::take_many(source, ids),
            None => Vec::new(),
        };
        tracing::debug!(from = %source_id, to = %new_id, count = moved.len(), "split list");
        if let Some(list) = list_ops::find_by_id_mut(&mut self.lists, new_id) {
            list.items = moved;
        }
        self.exit_multi_edit();
        self.set_selected(Some(new_id));
        self.persist()?;
        Ok(Vec::new())
    }
}
