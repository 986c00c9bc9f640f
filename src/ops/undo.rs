use serde::{Deserialize, Serialize};

use crate::model::list::{Item, ListId};

const UNDO_STACK_LIMIT: usize = 500;

/// A deleted item and where it was
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoRecord {
    pub list_id: ListId,
    pub index: usize,
    pub item: Item,
}

/// LIFO of single-item deletions, shared by all lists.
///
/// Only the top record can be restored, and only while its list is the one
/// being viewed. A record for another list blocks the stack until that list
/// is selected again.
#[derive(Debug, Clone)]
pub struct UndoBuffer {
    records: Vec<UndoRecord>,
    limit: usize,
}

impl Default for UndoBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoBuffer {
    pub fn new() -> Self {
        Self::with_limit(UNDO_STACK_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        UndoBuffer {
            records: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Rebuild from persisted records, dropping the oldest past the limit.
    pub fn from_records(records: Vec<UndoRecord>, limit: usize) -> Self {
        let mut buffer = Self::with_limit(limit);
        for record in records {
            buffer.push(record);
        }
        buffer
    }

    pub fn push(&mut self, record: UndoRecord) {
        self.records.push(record);
        if self.records.len() > self.limit {
            self.records.drain(..self.records.len() - self.limit);
        }
    }

    /// Pop the top record if it belongs to `list_id`.
    pub fn pop_for(&mut self, list_id: ListId) -> Option<UndoRecord> {
        if self.records.last()?.list_id != list_id {
            return None;
        }
        self.records.pop()
    }

    /// Drop every record of a list that no longer exists.
    pub fn forget_list(&mut self, list_id: ListId) {
        self.records.retain(|r| r.list_id != list_id);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[UndoRecord] {
        &self.records
    }
}
