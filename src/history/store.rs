//! The record collection, its pure history operations and the store object
//! that owns the collection and the current selection.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HistoryError;
use crate::history::record::{ImageRecord, RecordId, RecordPatch, RecordState};

/// Ordered, immutable sequence of records.
///
/// Every operation returns a new collection; records that did not change
/// are shared with the previous one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    records: Vec<Arc<ImageRecord>>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ImageRecord>) -> Self {
        Self {
            records: records.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageRecord> {
        self.records.get(index).map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.iter().map(Arc::as_ref)
    }

    /// Index of the record with the given id.
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.iter().position(|record| record.id() == id)
    }

    /// Whether `other` holds the very same record allocation at `index`.
    pub fn shares_record(&self, other: &Self, index: usize) -> bool {
        match (self.records.get(index), other.records.get(index)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// New collection with `record` appended.
    pub fn appended(&self, record: ImageRecord) -> Self {
        let mut records = self.records.clone();
        records.push(Arc::new(record));
        Self { records }
    }

    fn record(&self, index: usize) -> Result<&ImageRecord, HistoryError> {
        self.get(index).ok_or(HistoryError::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    fn replaced(&self, index: usize, record: ImageRecord) -> Self {
        let mut records = self.records.clone();
        records[index] = Arc::new(record);
        Self { records }
    }
}

/// Commits `patch` to the record at `index`.
///
/// The pre-commit state (without its history) is pushed onto the undo
/// stack and the redo stack is cleared.
///
/// # Errors
///
/// * `HistoryError::IndexOutOfRange` - When `index` addresses no record
pub fn commit(
    collection: &Collection,
    index: usize,
    patch: RecordPatch,
) -> Result<Collection, HistoryError> {
    let current = collection.record(index)?;

    let mut edit_history = current.edit_history.clone();
    edit_history.push(current.state.clone());

    let mut state = current.state.clone();
    patch.apply(&mut state);

    Ok(collection.replaced(
        index,
        ImageRecord {
            state,
            edit_history,
            redo_history: Vec::new(),
        },
    ))
}

/// Restores the most recent undo snapshot of the record at `index`.
///
/// # Errors
///
/// * `HistoryError::IndexOutOfRange` - When `index` addresses no record
/// * `HistoryError::NothingToUndo` - When the undo stack is empty
pub fn undo(collection: &Collection, index: usize) -> Result<Collection, HistoryError> {
    let current = collection.record(index)?;

    let mut edit_history = current.edit_history.clone();
    let restored = edit_history.pop().ok_or(HistoryError::NothingToUndo)?;

    let mut redo_history = current.redo_history.clone();
    redo_history.push(current.state.clone());

    Ok(collection.replaced(
        index,
        ImageRecord {
            state: restored,
            edit_history,
            redo_history,
        },
    ))
}

/// Re-applies the most recent redo snapshot of the record at `index`.
///
/// # Errors
///
/// * `HistoryError::IndexOutOfRange` - When `index` addresses no record
/// * `HistoryError::NothingToRedo` - When the redo stack is empty
pub fn redo(collection: &Collection, index: usize) -> Result<Collection, HistoryError> {
    let current = collection.record(index)?;

    let mut redo_history = current.redo_history.clone();
    let restored = redo_history.pop().ok_or(HistoryError::NothingToRedo)?;

    let mut edit_history = current.edit_history.clone();
    edit_history.push(current.state.clone());

    Ok(collection.replaced(
        index,
        ImageRecord {
            state: restored,
            edit_history,
            redo_history,
        },
    ))
}

/// Removes the record at `index`.
///
/// # Errors
///
/// * `HistoryError::IndexOutOfRange` - When `index` addresses no record
pub fn delete(collection: &Collection, index: usize) -> Result<Collection, HistoryError> {
    collection.record(index)?;
    let mut records = collection.records.clone();
    records.remove(index);
    Ok(Collection { records })
}

/// Receives the collection after every change.
pub trait StoreSubscriber {
    fn collection_changed(&mut self, collection: &Collection);
}

/// Owner of the collection and the current selection.
///
/// Mutation goes through `append`, `commit`, `undo`, `redo` and `delete`;
/// after each successful one the subscribers are notified.
#[derive(Default)]
pub struct EditorStore {
    collection: Collection,
    current_index: usize,
    next_id: u64,
    subscribers: Vec<Box<dyn StoreSubscriber>>,
}

impl std::fmt::Debug for EditorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorStore")
            .field("len", &self.collection.len())
            .field("current_index", &self.current_index)
            .field("next_id", &self.next_id)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EditorStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Store over a loaded collection.
    ///
    /// Records without an id, or with an id already taken, receive a fresh
    /// one; their history snapshots follow.
    pub fn with_collection(collection: Collection) -> Self {
        let mut next_id = collection
            .iter()
            .map(|record| record.id().0)
            .max()
            .unwrap_or(0)
            + 1;

        let mut seen = HashSet::new();
        let records = collection
            .iter()
            .map(|record| {
                let id = record.id();
                if id.is_assigned() && seen.insert(id) {
                    return record.clone();
                }
                let fresh = RecordId(next_id);
                next_id += 1;
                seen.insert(fresh);
                let mut record = record.clone();
                record.state.id = fresh;
                for snapshot in record
                    .edit_history
                    .iter_mut()
                    .chain(record.redo_history.iter_mut())
                {
                    snapshot.id = fresh;
                }
                record
            })
            .collect::<Vec<_>>();

        Self {
            collection: Collection::from_records(records),
            current_index: 0,
            next_id,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn StoreSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&ImageRecord> {
        self.collection.get(self.current_index)
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Reserves a new record id.
    pub fn allocate_id(&mut self) -> RecordId {
        let id = RecordId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    /// Selects a record; out-of-range indices are clamped.
    pub fn select(&mut self, index: usize) -> usize {
        self.current_index = index.min(self.collection.len().saturating_sub(1));
        self.current_index
    }

    /// Appends a new record and selects it.
    pub fn append(&mut self, state: RecordState) -> usize {
        let collection = self.collection.appended(ImageRecord::new(state));
        let index = collection.len() - 1;
        self.replace(collection);
        self.current_index = index;
        index
    }

    /// Commits to the current record.
    ///
    /// # Errors
    ///
    /// * `HistoryError::IndexOutOfRange` - When the collection is empty
    pub fn commit(&mut self, patch: RecordPatch) -> Result<(), HistoryError> {
        let collection = commit(&self.collection, self.current_index, patch)?;
        self.replace(collection);
        Ok(())
    }

    /// # Errors
    ///
    /// * `HistoryError::NothingToUndo` - When the current record has no history
    pub fn undo(&mut self) -> Result<(), HistoryError> {
        let collection = undo(&self.collection, self.current_index)?;
        self.replace(collection);
        Ok(())
    }

    /// # Errors
    ///
    /// * `HistoryError::NothingToRedo` - When the current record has no redo history
    pub fn redo(&mut self) -> Result<(), HistoryError> {
        let collection = redo(&self.collection, self.current_index)?;
        self.replace(collection);
        Ok(())
    }

    /// Deletes a record and keeps the selection in range.
    ///
    /// Deleting the current record selects the one before it; deleting an
    /// earlier record keeps the same record selected.
    ///
    /// # Errors
    ///
    /// * `HistoryError::IndexOutOfRange` - When `index` addresses no record
    pub fn delete(&mut self, index: usize) -> Result<(), HistoryError> {
        let collection = delete(&self.collection, index)?;

        let current = self.current_index;
        let selected = if index == current {
            current.saturating_sub(1)
        } else if index < current {
            current - 1
        } else {
            current
        };

        self.replace(collection);
        self.select(selected);
        Ok(())
    }

    fn replace(&mut self, collection: Collection) {
        self.collection = collection;
        debug!(
            len = self.collection.len(),
            current = self.current_index,
            "Collection changed"
        );
        for subscriber in &mut self.subscribers {
            subscriber.collection_changed(&self.collection);
        }
    }
}
