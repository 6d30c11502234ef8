//! FIFO cache primitive.
//!
//! Strictly insertion-ordered: hits never reorder and there is no
//! promotion-to-front. The same type doubles as the ghost history when
//! its capacity is assigned to ids that are no longer resident.

use std::collections::VecDeque;

use crate::cache::Cache;
use crate::object::CacheObject;
use crate::request::Request;
use crate::table::ObjectTable;

/// Pairing of an order slot with the record generation it refers to.
/// A slot whose stamp no longer matches the table record is stale and
/// is discarded when it surfaces at the head.
#[derive(Debug, Clone, Copy)]
struct OrderSlot {
    obj_id: u64,
    stamp: u64,
}

/// Insertion-ordered cache over an [`ObjectTable`].
///
/// `remove` runs in expected O(1): the order entry is left behind as a
/// stale slot and reclaimed lazily once it reaches the head, so
/// remove-heavy callers (the ghost history, main-queue recirculation)
/// never pay a linear scan.
#[derive(Debug)]
pub struct FifoCache {
    name: String,
    capacity: u64,
    table: ObjectTable,
    order: VecDeque<OrderSlot>,
    occupied_bytes: u64,
    next_stamp: u64,
}

impl FifoCache {
    /// Create a FIFO cache with the given byte capacity.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self::with_name("FIFO", capacity)
    }

    /// Create a named FIFO cache, e.g. `FIFO-ghost`.
    #[must_use]
    pub fn with_name(name: impl Into<String>, capacity: u64) -> Self {
        Self {
            name: name.into(),
            capacity,
            table: ObjectTable::new(),
            order: VecDeque::new(),
            occupied_bytes: 0,
            next_stamp: 0,
        }
    }

    /// Whether `obj_id` is resident.
    #[must_use]
    pub fn contains(&self, obj_id: u64) -> bool {
        self.table.contains(obj_id)
    }

    /// Read-only view of a resident record.
    #[must_use]
    pub fn object(&self, obj_id: u64) -> Option<&CacheObject> {
        self.table.find(obj_id)
    }

    /// Iterate all resident records, in no particular order.
    pub fn objects(&self) -> impl Iterator<Item = &CacheObject> {
        self.table.iter()
    }

    /// Append a record at the tail.
    ///
    /// The caller is responsible for having made room; a duplicate id
    /// is a caller bug.
    pub fn push_tail(&mut self, mut obj: CacheObject) {
        debug_assert!(
            !self.table.contains(obj.obj_id),
            "duplicate id {} pushed into {}",
            obj.obj_id,
            self.name
        );
        obj.stamp = self.next_stamp;
        self.next_stamp += 1;
        self.order.push_back(OrderSlot {
            obj_id: obj.obj_id,
            stamp: obj.stamp,
        });
        self.occupied_bytes += obj.obj_size;
        self.table.insert(obj);
    }

    /// The head record in insertion order. Never removes it, but may
    /// reclaim stale order slots sitting in front of it.
    pub fn peek_head(&mut self) -> Option<&CacheObject> {
        self.skip_stale_head();
        let slot = self.order.front()?;
        self.table.find(slot.obj_id)
    }

    /// Remove and return the head record.
    pub fn pop_head(&mut self) -> Option<CacheObject> {
        self.skip_stale_head();
        let slot = self.order.pop_front()?;
        let obj = self
            .table
            .remove(slot.obj_id)
            .expect("live head slot must resolve through the table");
        self.occupied_bytes -= obj.obj_size;
        Some(obj)
    }

    fn skip_stale_head(&mut self) {
        while let Some(slot) = self.order.front() {
            match self.table.find(slot.obj_id) {
                Some(obj) if obj.stamp == slot.stamp => break,
                _ => {
                    self.order.pop_front();
                }
            }
        }
    }
}

impl Cache for FifoCache {
    fn name(&self) -> &str {
        &self.name
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn occupied_bytes(&self) -> u64 {
        self.occupied_bytes
    }

    fn n_objects(&self) -> u64 {
        self.table.len() as u64
    }

    fn find(&mut self, req: &Request, _update: bool) -> Option<&mut CacheObject> {
        // FIFO order never changes on a hit; frequency updates belong
        // to the caller, through the returned record.
        self.table.find_mut(req.obj_id)
    }

    fn can_insert(&mut self, req: &Request) -> bool {
        req.obj_size <= self.capacity
    }

    fn insert(&mut self, req: &Request) -> &mut CacheObject {
        self.push_tail(CacheObject::new(req));
        self.table
            .find_mut(req.obj_id)
            .expect("record inserted above")
    }

    fn evict(&mut self, req: &Request) {
        while self.occupied_bytes + req.obj_size > self.capacity {
            self.pop_head()
                .expect("eviction requested on an empty FIFO");
        }
    }

    fn to_evict(&mut self, _req: &Request) -> Option<&CacheObject> {
        self.peek_head()
    }

    fn remove(&mut self, obj_id: u64) -> bool {
        // The order slot stays behind; its stamp no longer resolves,
        // so it is reclaimed when it reaches the head.
        match self.table.remove(obj_id) {
            Some(obj) => {
                self.occupied_bytes -= obj.obj_size;
                true
            }
            None => false,
        }
    }
}
