//! Object table: associative lookup from object id to object record.
//!
//! The table is the only mechanism used to detect hits and to
//! short-circuit duplicate inserts. Eviction order lives in the owning
//! queue, keyed back into the table through each record's stamp.

use hashbrown::HashMap;

use crate::object::CacheObject;

/// Id → record map scoped to a single FIFO.
#[derive(Debug, Default)]
pub struct ObjectTable {
    records: HashMap<u64, CacheObject>,
}

impl ObjectTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record by id.
    #[must_use]
    pub fn find(&self, obj_id: u64) -> Option<&CacheObject> {
        self.records.get(&obj_id)
    }

    /// Look up a record by id for mutation.
    pub fn find_mut(&mut self, obj_id: u64) -> Option<&mut CacheObject> {
        self.records.get_mut(&obj_id)
    }

    /// Insert a record. The caller guarantees the id is not present.
    pub fn insert(&mut self, obj: CacheObject) {
        let displaced = self.records.insert(obj.obj_id, obj);
        debug_assert!(displaced.is_none(), "duplicate id in object table");
    }

    /// Remove and return the record for `obj_id`, if present.
    pub fn remove(&mut self, obj_id: u64) -> Option<CacheObject> {
        self.records.remove(&obj_id)
    }

    #[must_use]
    pub fn contains(&self, obj_id: u64) -> bool {
        self.records.contains_key(&obj_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate all records, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &CacheObject> {
        self.records.values()
    }
}
