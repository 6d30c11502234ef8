//! # strata-cache
//!
//! Size-aware cache admission and eviction engines built from FIFO
//! queues.
//!
//! The crate models a cache as a uniform capability set ([`Cache`]):
//! the composite [`S3FifoSize`] engine and the [`FifoCache`]
//! sub-queues it owns implement the same contract, so engines compose
//! over any conforming queue. The flagship policy is a size-aware
//! S3-FIFO: a small admission FIFO, a long-lived main FIFO, and a
//! ghost history of recently demoted ids, with promotion and admission
//! decisions that normalize an object's frequency by its size relative
//! to the current mean object size.
//!
//! The cache tracks identities and sizes, not payloads, which makes it
//! suitable for trace-driven hit-rate studies: feed it a stream of
//! [`Request`]s and sample the [`EngineStats`] counters.
//!
//! ```ignore
//! use strata_cache::{Cache, Request, S3FifoSize};
//!
//! let mut cache = S3FifoSize::new(1_000_000, Some("small-size-ratio=0.1"))?;
//! let hit = cache.get(&Request::new(42, 1024));
//! ```
//!
//! Engines are single-threaded within an instance; parallelism comes
//! from running one engine per worker thread, each owning its state.

mod cache;
mod error;
mod fifo;
mod object;
pub mod policies;
mod request;
mod stats;
mod table;

pub use cache::Cache;
pub use error::{CacheError, CacheResult};
pub use fifo::FifoCache;
pub use object::{CacheObject, FREQ_CAP};
pub use policies::{S3FifoSize, S3FifoSizeParams, SmallAdmission};
pub use request::Request;
pub use stats::EngineStats;
pub use table::ObjectTable;
