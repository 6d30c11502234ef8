//! Engine parameters and the `key=value,key=value` configuration
//! string parser.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{CacheError, CacheResult};

/// Admission regime for the small queue, selected at engine build
/// time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SmallAdmission {
    /// Reject with probability `obj_size / small_capacity`, so large
    /// objects are admitted with decreasing probability.
    #[default]
    Probabilistic,
    /// Reject any object at least as large as the small queue.
    Hard,
    /// No size filter; every candidate passes. Used for deterministic
    /// trace replays.
    Disabled,
}

/// Tunables for [`S3FifoSize`](super::S3FifoSize).
///
/// The string form understood by [`parse`](Self::parse) is a
/// comma-separated list of case-insensitive `key=value` pairs:
/// `small-size-ratio` (alias `fifo-size-ratio`), `ghost-size-ratio`,
/// `move-to-main-threshold`, and the `print` flag, which writes the
/// current parameters to stdout and terminates the process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct S3FifoSizeParams {
    /// Fraction of total capacity assigned to the small queue, in
    /// `(0, 1]`.
    pub small_size_ratio: f64,
    /// Fraction of total capacity assigned to the ghost history; `0`
    /// disables the ghost.
    pub ghost_size_ratio: f64,
    /// Promotion cutoff τ applied to `freq / size-ratio`.
    pub move_to_main_threshold: u32,
    /// Small-queue admission regime.
    pub admission: SmallAdmission,
    /// Gate small-queue frequency bumps on the object having survived
    /// past the half-capacity mark, measured in admitted bytes.
    pub small_hit_age_filter: bool,
}

impl Default for S3FifoSizeParams {
    fn default() -> Self {
        Self {
            small_size_ratio: 0.10,
            ghost_size_ratio: 0.90,
            move_to_main_threshold: 1,
            admission: SmallAdmission::default(),
            small_hit_age_filter: false,
        }
    }
}

impl S3FifoSizeParams {
    pub(crate) const CACHE: &'static str = "S3FIFOSize";

    /// Parse a configuration string over the defaults.
    pub fn parse(spec: &str) -> CacheResult<Self> {
        let mut params = Self::default();
        params.apply(spec)?;
        Ok(params)
    }

    /// Apply a configuration string on top of the current values.
    /// Unknown keys are fatal.
    pub fn apply(&mut self, spec: &str) -> CacheResult<()> {
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, value) = match part.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (part, None),
            };
            match key.to_ascii_lowercase().as_str() {
                "small-size-ratio" | "fifo-size-ratio" => {
                    let ratio: f64 = parse_value(key, value)?;
                    if !(ratio > 0.0 && ratio <= 1.0) {
                        return Err(CacheError::OutOfRange {
                            key: "small-size-ratio",
                            value: ratio.to_string(),
                            reason: "must be in (0, 1]",
                        });
                    }
                    self.small_size_ratio = ratio;
                }
                "ghost-size-ratio" => {
                    let ratio: f64 = parse_value(key, value)?;
                    if !(ratio >= 0.0 && ratio.is_finite()) {
                        return Err(CacheError::OutOfRange {
                            key: "ghost-size-ratio",
                            value: ratio.to_string(),
                            reason: "must be a finite value >= 0",
                        });
                    }
                    self.ghost_size_ratio = ratio;
                }
                "move-to-main-threshold" => {
                    let threshold: u32 = parse_value(key, value)?;
                    if threshold < 1 {
                        return Err(CacheError::OutOfRange {
                            key: "move-to-main-threshold",
                            value: threshold.to_string(),
                            reason: "must be >= 1",
                        });
                    }
                    self.move_to_main_threshold = threshold;
                }
                "print" => {
                    println!("parameters: {}", self.format());
                    std::process::exit(0);
                }
                _ => {
                    return Err(CacheError::UnknownParameter {
                        cache: Self::CACHE,
                        key: key.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render the parameter string accepted by [`parse`](Self::parse).
    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "small-size-ratio={:.4},ghost-size-ratio={:.4},move-to-main-threshold={}",
            self.small_size_ratio, self.ghost_size_ratio, self.move_to_main_threshold
        )
    }
}

fn parse_value<T>(key: &str, value: Option<&str>) -> CacheResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    let value = value.ok_or_else(|| CacheError::InvalidValue {
        key: key.to_string(),
        value: String::new(),
        reason: "missing value".to_string(),
    })?;
    value.parse().map_err(|err: T::Err| CacheError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: err.to_string(),
    })
}
