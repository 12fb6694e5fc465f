//! Reference-counted buffer storage

use crate::tensor::{DataId, TensorData};
use std::collections::HashMap;

#[derive(Debug)]
struct DataEntry {
    values: TensorData,
    ref_count: usize,
}

/// Process-wide buffer arena owned by the engine.
///
/// Every live tensor handle holds one reference to its buffer. A buffer is
/// freed as soon as its count reaches zero.
#[derive(Debug, Default)]
pub struct DataStore {
    entries: HashMap<DataId, DataEntry>,
    next_id: DataId,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `values` with a reference count of one.
    pub fn insert(&mut self, values: TensorData) -> DataId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(
            id,
            DataEntry {
                values,
                ref_count: 1,
            },
        );
        id
    }

    pub fn get(&self, id: DataId) -> Option<&TensorData> {
        self.entries.get(&id).map(|e| &e.values)
    }

    pub fn contains(&self, id: DataId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn ref_count(&self, id: DataId) -> usize {
        self.entries.get(&id).map_or(0, |e| e.ref_count)
    }

    pub fn inc_ref(&mut self, id: DataId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.ref_count += 1;
        }
    }

    /// Drop one reference. Returns true when the buffer was freed.
    pub fn dec_ref(&mut self, id: DataId) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count == 0 {
            self.entries.remove(&id);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn num_bytes(&self) -> usize {
        self.entries.values().map(|e| e.values.byte_size()).sum()
    }
}
