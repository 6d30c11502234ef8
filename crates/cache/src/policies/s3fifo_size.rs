//! Size-aware S3-FIFO.
//!
//! Three FIFO queues cooperate: a small admission queue, a long-lived
//! main queue, and a ghost history of ids recently demoted from small.
//! Promotion, admission, and recirculation all normalize an object's
//! frequency by its size relative to the current mean object size, so
//! a small warm object survives more readily than a large one of the
//! same warmth.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::cache::Cache;
use crate::error::CacheResult;
use crate::fifo::FifoCache;
use crate::object::{CacheObject, FREQ_CAP};
use crate::request::Request;
use crate::stats::EngineStats;

use super::params::{S3FifoSizeParams, SmallAdmission};

/// Occupancy denominators are clamped to this floor so the mean object
/// size stays finite while a queue is empty.
const MEAN_SIZE_FLOOR: f64 = 1e-8;

/// Size-aware S3-FIFO engine.
///
/// Owns its three inner queues exclusively; the queues hold no
/// reference back. All state fits one owner, so the engine is `Send`
/// and single-threaded by construction — run one engine per worker for
/// parallel trace replays.
pub struct S3FifoSize {
    name: String,
    capacity: u64,
    small: FifoCache,
    main: FifoCache,
    ghost: Option<FifoCache>,
    params: S3FifoSizeParams,
    /// Set once the engine performs its first eviction; before that,
    /// fresh inserts overflow into main while small is already full.
    has_evicted: bool,
    stats: EngineStats,
    rng: SmallRng,
}

impl S3FifoSize {
    /// Build an engine over `capacity_bytes`, parsing `spec` over the
    /// default parameters when given.
    pub fn new(capacity_bytes: u64, spec: Option<&str>) -> CacheResult<Self> {
        let mut params = S3FifoSizeParams::default();
        if let Some(spec) = spec {
            params.apply(spec)?;
        }
        Ok(Self::build(capacity_bytes, params, SmallRng::from_os_rng()))
    }

    /// Build an engine from already-validated parameters.
    #[must_use]
    pub fn from_params(capacity_bytes: u64, params: S3FifoSizeParams) -> Self {
        Self::build(capacity_bytes, params, SmallRng::from_os_rng())
    }

    /// Like [`from_params`](Self::from_params), with a fixed
    /// admission-RNG seed so replays of the same reference stream are
    /// reproducible.
    #[must_use]
    pub fn with_seed(capacity_bytes: u64, params: S3FifoSizeParams, seed: u64) -> Self {
        Self::build(capacity_bytes, params, SmallRng::seed_from_u64(seed))
    }

    fn build(capacity: u64, params: S3FifoSizeParams, rng: SmallRng) -> Self {
        let small_capacity = (capacity as f64 * params.small_size_ratio) as u64;
        let main_capacity = capacity - small_capacity;
        let ghost_capacity = (capacity as f64 * params.ghost_size_ratio) as u64;

        let name = format!(
            "S3FIFOSize-{:.4}-{}",
            params.small_size_ratio, params.move_to_main_threshold
        );
        debug!(
            cache = %name,
            capacity,
            small_capacity,
            main_capacity,
            ghost_capacity,
            "created cache"
        );

        Self {
            name,
            capacity,
            small: FifoCache::with_name("FIFO", small_capacity),
            main: FifoCache::with_name("FIFO", main_capacity),
            ghost: (ghost_capacity > 0)
                .then(|| FifoCache::with_name("FIFO-ghost", ghost_capacity)),
            params,
            has_evicted: false,
            stats: EngineStats::default(),
            rng,
        }
    }

    /// Engine parameters as resolved at construction.
    #[must_use]
    pub fn params(&self) -> &S3FifoSizeParams {
        &self.params
    }

    /// Flow counters since construction (or the last reset).
    #[must_use]
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Reset the flow counters. Cache contents are untouched.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// The small admission queue.
    #[must_use]
    pub fn small(&self) -> &FifoCache {
        &self.small
    }

    /// The long-lived main queue.
    #[must_use]
    pub fn main(&self) -> &FifoCache {
        &self.main
    }

    /// The ghost history, when a non-zero ghost ratio was configured.
    #[must_use]
    pub fn ghost(&self) -> Option<&FifoCache> {
        self.ghost.as_ref()
    }

    /// Mean size of resident objects across both queues.
    fn mean_size_overall(&self) -> f64 {
        let n = self.small.n_objects() + self.main.n_objects();
        (self.small.occupied_bytes() + self.main.occupied_bytes()) as f64
            / (n as f64).max(MEAN_SIZE_FLOOR)
    }

    /// Mean size of the small queue's residents. Admission tests use
    /// this denominator: a readmission candidate is weighed against
    /// the queue it has to survive, before it has had any chance to
    /// accumulate hits in main.
    fn mean_size_in_small(&self) -> f64 {
        self.small.occupied_bytes() as f64
            / (self.small.n_objects() as f64).max(MEAN_SIZE_FLOOR)
    }

    fn meets_threshold(&self, freq: u8, size_ratio: f64) -> bool {
        f64::from(freq) / size_ratio >= f64::from(self.params.move_to_main_threshold)
    }

    /// Frequency recorded for `req.obj_id` in the ghost history, if
    /// the id is there.
    fn ghost_freq(&mut self, req: &Request) -> Option<u8> {
        self.ghost
            .as_mut()
            .and_then(|ghost| ghost.find(req, false))
            .map(|entry| entry.freq)
    }

    fn can_insert_to_small(&mut self, req: &Request) -> bool {
        match self.params.admission {
            SmallAdmission::Probabilistic => {
                let reject_p = req.obj_size as f64 / self.small.capacity() as f64;
                self.rng.random::<f64>() >= reject_p
            }
            SmallAdmission::Hard => req.obj_size < self.small.capacity(),
            SmallAdmission::Disabled => true,
        }
    }

    /// One small-queue victim: promote it to main when its normalized
    /// frequency clears the threshold, otherwise demote its id to the
    /// ghost history.
    fn evict_small(&mut self, req: &Request) {
        let victim = *self
            .small
            .to_evict(req)
            .expect("small-queue eviction requires a resident head");
        let ratio = victim.obj_size as f64 / self.mean_size_overall();

        if self.meets_threshold(victim.freq, ratio) {
            trace!(obj_id = victim.obj_id, freq = victim.freq, "promote to main");
            self.stats.n_obj_move_to_main += 1;
            self.stats.n_bytes_move_to_main += victim.obj_size;
            let promoted = self.main.insert(&victim.as_request());
            promoted.freq = 1;
        } else if let Some(ghost) = self.ghost.as_mut() {
            trace!(obj_id = victim.obj_id, freq = victim.freq, "demote to ghost");
            let ghost_req = victim.as_request();
            ghost.get(&ghost_req);
            // The history keeps the frequency the object had built up;
            // a ghost too small for the entry simply forgets it.
            if let Some(entry) = ghost.find(&ghost_req, false) {
                entry.freq = victim.freq;
            }
        }

        let removed = self.small.remove(victim.obj_id);
        assert!(removed, "small queue lost id {} mid-eviction", victim.obj_id);
    }

    /// One main-queue victim: recirculate it with a decayed counter
    /// when its normalized frequency clears the threshold, otherwise
    /// drop it. Main demotions never populate the ghost.
    fn evict_main(&mut self, req: &Request) {
        let victim = *self
            .main
            .to_evict(req)
            .expect("main-queue eviction requires a resident head");
        let ratio = victim.obj_size as f64 / self.mean_size_overall();

        let removed = self.main.remove(victim.obj_id);
        assert!(removed, "main queue lost id {} mid-eviction", victim.obj_id);

        if self.meets_threshold(victim.freq, ratio) {
            trace!(obj_id = victim.obj_id, freq = victim.freq, "recirculate in main");
            // Clock with a 2-bit counter: the reinserted record decays
            // so an unhit object cannot recirculate forever.
            let recirculated = self.main.insert(&victim.as_request());
            recirculated.freq = victim.freq.min(FREQ_CAP) - 1;
        } else {
            trace!(obj_id = victim.obj_id, "drop from main");
        }
    }
}

impl Cache for S3FifoSize {
    fn name(&self) -> &str {
        &self.name
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn occupied_bytes(&self) -> u64 {
        self.small.occupied_bytes() + self.main.occupied_bytes()
    }

    fn n_objects(&self) -> u64 {
        self.small.n_objects() + self.main.n_objects()
    }

    fn get(&mut self, req: &Request) -> bool {
        debug_assert!(
            self.small.occupied_bytes() + self.main.occupied_bytes() <= self.capacity,
            "resident bytes exceed capacity"
        );
        self.stats.n_req += 1;

        let hit = self.find(req, true).is_some();
        if hit {
            self.stats.n_hit += 1;
        } else {
            self.stats.n_miss += 1;
            if self.can_insert(req) {
                self.evict(req);
                self.insert(req);
            } else {
                trace!(obj_id = req.obj_id, obj_size = req.obj_size, "admission declined");
            }
        }
        hit
    }

    fn find(&mut self, req: &Request, update: bool) -> Option<&mut CacheObject> {
        if !update {
            if self.small.contains(req.obj_id) {
                return self.small.find(req, false);
            }
            return self.main.find(req, false);
        }

        let small_capacity = self.small.capacity();
        let admitted = self.stats.n_bytes_admit_to_small;
        if self.small.contains(req.obj_id) {
            let gate = self.params.small_hit_age_filter;
            let obj = self.small.find(req, true).expect("resident in small");
            // With the age gate, only objects that survived past the
            // half-capacity mark (in admitted bytes) earn frequency.
            if !gate || admitted.saturating_sub(obj.insertion_bytes) > small_capacity / 2 {
                obj.touch();
            }
            return Some(obj);
        }
        if self.main.contains(req.obj_id) {
            let obj = self.main.find(req, true).expect("resident in main");
            obj.touch();
            return Some(obj);
        }
        None
    }

    fn can_insert(&mut self, req: &Request) -> bool {
        let destined_to_main = match self.ghost_freq(req) {
            Some(ghost_freq) => {
                let ratio = req.obj_size as f64 / self.mean_size_in_small();
                self.meets_threshold(ghost_freq, ratio)
            }
            None => false,
        };

        if destined_to_main {
            if req.obj_size >= self.main.capacity() {
                return false;
            }
        } else if !self.can_insert_to_small(req) {
            return false;
        }

        // A single object larger than the whole cache can never fit.
        req.obj_size <= self.capacity
    }

    fn insert(&mut self, req: &Request) -> &mut CacheObject {
        if let Some(ghost_freq) = self.ghost_freq(req) {
            let ratio = req.obj_size as f64 / self.mean_size_in_small();
            let to_main = self.meets_threshold(ghost_freq, ratio);
            if let Some(ghost) = self.ghost.as_mut() {
                ghost.remove(req.obj_id);
            }
            if to_main {
                self.stats.n_obj_admit_to_main += 1;
                self.stats.n_bytes_admit_to_main += req.obj_size;
                let obj = self.main.insert(req);
                obj.freq = 1;
                obj
            } else {
                self.stats.n_obj_admit_to_small += 1;
                self.stats.n_bytes_admit_to_small += req.obj_size;
                let marker = self.stats.n_bytes_admit_to_small;
                let obj = self.small.insert(req);
                // A readmitted id keeps the history it built up while
                // in the ghost.
                obj.freq = (ghost_freq + 1).min(FREQ_CAP);
                obj.insertion_bytes = marker;
                obj
            }
        } else if !self.has_evicted && self.small.occupied_bytes() >= self.small.capacity() {
            // Warm-up: until the first eviction, fresh inserts overflow
            // into main once small has filled, so main populates during
            // the initial fill instead of staying cold.
            self.stats.n_obj_admit_to_main += 1;
            self.stats.n_bytes_admit_to_main += req.obj_size;
            let obj = self.main.insert(req);
            obj.freq = 1;
            obj
        } else {
            self.stats.n_obj_admit_to_small += 1;
            self.stats.n_bytes_admit_to_small += req.obj_size;
            let marker = self.stats.n_bytes_admit_to_small;
            let obj = self.small.insert(req);
            obj.freq = 1;
            obj.insertion_bytes = marker;
            obj
        }
    }

    fn evict(&mut self, req: &Request) {
        while self.occupied_bytes() + req.obj_size > self.capacity {
            self.has_evicted = true;
            if self.main.occupied_bytes() > self.main.capacity()
                || self.small.occupied_bytes() == 0
            {
                self.evict_main(req);
            } else {
                self.evict_small(req);
            }
        }
    }

    fn to_evict(&mut self, _req: &Request) -> Option<&CacheObject> {
        unimplemented!("eviction cannot be decoupled from the promote/demote decision")
    }

    fn remove(&mut self, obj_id: u64) -> bool {
        let mut removed = self.small.remove(obj_id);
        removed = removed
            || self
                .ghost
                .as_mut()
                .is_some_and(|ghost| ghost.remove(obj_id));
        removed || self.main.remove(obj_id)
    }
}
