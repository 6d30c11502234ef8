//! Eviction policies.
//!
//! Every policy implements [`Cache`](crate::cache::Cache); composite
//! engines reach their sub-queues through the same contract they
//! expose themselves, so any conforming cache can back a queue slot.

mod params;
mod s3fifo_size;

pub use params::{S3FifoSizeParams, SmallAdmission};
pub use s3fifo_size::S3FifoSize;
