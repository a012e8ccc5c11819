//! Per-call limits imposed by the remote capability.
//!
//! ## The Two Ceilings
//!
//! Every batch request is bounded twice:
//!
//! - `max_batch_size`: how many texts one request may carry.
//! - `max_text_bytes`: how many UTF-8 bytes any single text may have.
//!
//! ```text
//! max_batch_size = 3, max_text_bytes = 10
//!
//! rows:   ["ab", "cd", "ef", "gh", "0123456789ABC"]
//!          \_____ batch 0 ____/ \batch 1/ \_ 13 bytes: oversized _/
//! ```
//!
//! ## Where "Oversized" Starts
//!
//! A text of exactly `max_text_bytes` bytes is accepted as-is. Only texts
//! strictly longer are truncated or split. [`Limits::is_oversized`] is the one
//! place that decision is made.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default per-item byte ceiling.
pub const DEFAULT_MAX_TEXT_BYTES: usize = 5000;

/// Default number of items per batch request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 25;

/// Batch count and item size limits.
///
/// # Examples
///
/// ```rust
/// use rowbatch::Limits;
///
/// let limits = Limits::default();
/// assert_eq!(limits.max_text_bytes(), 5000);
/// assert_eq!(limits.max_batch_size(), 25);
///
/// let limits = Limits::new(60, 3).unwrap();
/// assert!(!limits.is_oversized(60));
/// assert!(limits.is_oversized(61));
/// ```
///
/// Limits can also come from a JSON configuration document:
///
/// ```rust
/// use rowbatch::Limits;
///
/// let limits: Limits = serde_json::from_str(r#"{"maxBatchSize": 10}"#).unwrap();
/// assert_eq!(limits.max_batch_size(), 10);
/// assert_eq!(limits.max_text_bytes(), 5000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Limits {
    max_text_bytes: usize,
    max_batch_size: usize,
}

impl Limits {
    /// Create limits, rejecting zero values.
    pub fn new(max_text_bytes: usize, max_batch_size: usize) -> Result<Self> {
        Self::default()
            .with_max_text_bytes(max_text_bytes)?
            .with_max_batch_size(max_batch_size)
    }

    /// The per-item byte ceiling.
    #[must_use]
    pub const fn max_text_bytes(&self) -> usize {
        self.max_text_bytes
    }

    /// The per-request item ceiling.
    #[must_use]
    pub const fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Replace the byte ceiling.
    pub fn with_max_text_bytes(self, max_text_bytes: usize) -> Result<Self> {
        if max_text_bytes == 0 {
            return Err(Error::InvalidLimit {
                name: "max_text_bytes",
                value: max_text_bytes,
            });
        }
        Ok(Self {
            max_text_bytes,
            ..self
        })
    }

    /// Replace the item ceiling.
    pub fn with_max_batch_size(self, max_batch_size: usize) -> Result<Self> {
        if max_batch_size == 0 {
            return Err(Error::InvalidLimit {
                name: "max_batch_size",
                value: max_batch_size,
            });
        }
        Ok(Self {
            max_batch_size,
            ..self
        })
    }

    /// Whether a text of `len` bytes must be truncated or split.
    #[must_use]
    pub const fn is_oversized(&self, len: usize) -> bool {
        len > self.max_text_bytes
    }

    /// Whether a batch holding `count` items is full.
    #[must_use]
    pub const fn is_full(&self, count: usize) -> bool {
        count >= self.max_batch_size
    }

    /// Check that deserialized limits are usable.
    pub fn validate(&self) -> Result<()> {
        Self::new(self.max_text_bytes, self.max_batch_size).map(|_| ())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}
