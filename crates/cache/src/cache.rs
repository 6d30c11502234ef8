//! The uniform cache capability set.

use crate::object::CacheObject;
use crate::request::Request;

/// Capability set shared by every cache.
///
/// The top-level engine and the sub-queues it composes expose the same
/// contract, so an engine never depends on which concrete
/// implementation backs a queue slot: the default is a plain FIFO, but
/// any cache honoring the contract may substitute.
///
/// Caches are single-threaded within an instance; every operation
/// takes `&mut self` and completes synchronously.
pub trait Cache {
    /// Human-readable cache name, e.g. `S3FIFOSize-0.1000-1`.
    fn name(&self) -> &str;

    /// Configured byte capacity.
    fn capacity(&self) -> u64;

    /// Sum of the sizes of all resident records.
    fn occupied_bytes(&self) -> u64;

    /// Number of resident records.
    fn n_objects(&self) -> u64;

    /// Look the object up without admitting it.
    ///
    /// With `update`, the implementation may mutate the returned
    /// record's metadata (typically its frequency); without it, the
    /// lookup never mutates.
    fn find(&mut self, req: &Request, update: bool) -> Option<&mut CacheObject>;

    /// Admission decision for `req`. Declining is not an error.
    fn can_insert(&mut self, req: &Request) -> bool;

    /// Place a record for `req`.
    ///
    /// The caller guarantees enough free space (eviction has already
    /// run) and a non-duplicate id.
    fn insert(&mut self, req: &Request) -> &mut CacheObject;

    /// Remove records until `req.obj_size` additional bytes fit.
    fn evict(&mut self, req: &Request);

    /// The next eviction victim, without removing it.
    ///
    /// Optional capability: policies whose victim selection cannot be
    /// decoupled from the eviction side effects panic here.
    fn to_evict(&mut self, req: &Request) -> Option<&CacheObject>;

    /// User-driven removal, distinct from eviction.
    ///
    /// Returns `true` iff the id was present.
    fn remove(&mut self, obj_id: u64) -> bool;

    /// Process one reference: report hit or miss; on an admissible
    /// miss, evict until the object fits, then insert it.
    fn get(&mut self, req: &Request) -> bool {
        let hit = self.find(req, true).is_some();
        if !hit && self.can_insert(req) {
            self.evict(req);
            self.insert(req);
        }
        hit
    }
}
