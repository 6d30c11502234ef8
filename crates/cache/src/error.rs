//! Error types for cache construction and configuration.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced while building or configuring a cache.
///
/// Runtime cache operations are total: lookups miss, admission
/// declines, removal reports absence. Internal consistency failures
/// (a must-succeed removal that fails, an eviction peek on an empty
/// queue) indicate a bug in the engine and panic instead of returning
/// an error.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The configuration string contained a key the policy does not
    /// recognize.
    #[error("{cache} does not have parameter `{key}`")]
    UnknownParameter {
        /// Name of the cache whose parser rejected the key.
        cache: &'static str,
        /// The offending key.
        key: String,
    },

    /// A parameter value failed to parse as the expected type.
    #[error("invalid value `{value}` for parameter `{key}`: {reason}")]
    InvalidValue {
        /// The parameter key.
        key: String,
        /// The raw value text.
        value: String,
        /// Why parsing failed.
        reason: String,
    },

    /// A parameter parsed but lies outside its allowed range.
    #[error("parameter `{key}` value `{value}` out of range: {reason}")]
    OutOfRange {
        /// The parameter key.
        key: &'static str,
        /// The rejected value, rendered as text.
        value: String,
        /// The allowed range.
        reason: &'static str,
    },
}
