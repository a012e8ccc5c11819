//! # rowbatch
//!
//! Batch planning for row-oriented text analytics.
//!
//! ## The Problem
//!
//! A query engine hands you a column of text, one value per row, and asks for
//! the language, sentiment, entities, PII, key phrases or a translation of
//! each. The service that answers has hard limits:
//!
//! - at most `max_batch_size` texts per request (25 by default)
//! - at most `max_text_bytes` UTF-8 bytes per text (5000 by default)
//! - one language code per request
//!
//! Rows don't respect any of that. A column runs to thousands of rows in
//! mixed languages, and some rows are whole documents. Whatever happens in
//! between, the caller needs exactly one answer per row, in row order.
//!
//! ## The Approach
//!
//! ```text
//! rows:   r0(en)  r1(en)  r2(en, 12 KB)  r3(fr)
//!           │       │          │            │
//! plan:   [r0 r1]@en     split(r2)@en    [r3]@fr
//!                          │
//!                  "S1 S2" "S3" "S4 S5"     sentence-bounded chunks
//!                  @0      @4810 @9603      offset table
//!                          │
//! merge:  chunk spans shifted by their offset -> spans over r2
//!
//! out:    o0      o1       o2            o3
//! ```
//!
//! 1. [`BatchPlanner`] scans the rows once and emits [`Batch`]es in row order.
//!    A batch closes when it is full or the language changes.
//! 2. Oversized rows are truncated (operations that only look at the leading
//!    text) or split at sentence boundaries by [`SentenceSplitter`].
//! 3. Split rows are answered chunk by chunk. [`merge_spans`] shifts each
//!    chunk's spans by the chunk's entry in an [`OffsetTable`], so they
//!    address the original row text again.
//! 4. [`redact`] replaces selected spans with `[TYPE]`, tracking the length
//!    drift each replacement introduces.
//!
//! [`RowAnalytics`] ties these together behind one call per [`Operation`].
//!
//! ## Quick Start
//!
//! ```rust
//! use rowbatch::{BatchPlanner, Limits, SentenceSplitter, Splitter};
//!
//! // Sentence splitting under a byte ceiling
//! let splitter = SentenceSplitter::new(13);
//! let chunks = splitter.split("One. Two. Three. Four.");
//! assert_eq!(chunks[0].text, "One. Two. ");
//! assert_eq!(chunks[1].start, 10);
//!
//! // Batch planning by count and language
//! let planner = BatchPlanner::new(Limits::default()).unwrap().group_by_language(true);
//! let batches = planner
//!     .plan_with_languages(&["hello", "hi", "bonjour"], &["en", "en", "fr"])
//!     .unwrap();
//! assert_eq!(batches.len(), 2);
//! ```
//!
//! ## The Capability
//!
//! The service is reached through the [`TextAnalytics`] trait. Adapters own
//! their transport, retries and timeouts; this crate never constructs one.
//! All offsets crossing the trait are UTF-8 byte offsets.

mod capability;
mod chunk;
mod error;
mod limits;
mod merge;
mod operation;
mod pipeline;
mod planner;
mod redact;
mod sentence;

pub use capability::{
    BatchItemError, BatchResponse, CapabilityError, DetectedLanguage, KeyPhrase, Sentiment,
    SentimentScore, Span, TextAnalytics,
};
pub use chunk::Chunk;
pub use error::{Error, Result};
pub use limits::{Limits, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_TEXT_BYTES};
pub use merge::{merge_concatenated, merge_spans, OffsetTable, Shift};
pub use operation::{Detail, Operation, RowOutput, SpanOutput};
pub use pipeline::RowAnalytics;
pub use planner::{truncate_to_bytes, Batch, BatchKind, BatchPlanner, Overflow};
pub use redact::{extract_typed_values, redact, RedactionFilter};
pub use sentence::SentenceSplitter;

/// A strategy for cutting text into capability-sized chunks.
///
/// ```rust
/// use rowbatch::{Chunk, SentenceSplitter, Splitter};
///
/// fn split_row(splitter: &dyn Splitter, text: &str) -> Vec<Chunk> {
///     splitter.split(text)
/// }
///
/// let chunks = split_row(&SentenceSplitter::new(100), "Hello world. This is a test.");
/// assert_eq!(chunks.len(), 1);
/// ```
pub trait Splitter: Send + Sync {
    /// Split text into chunks.
    ///
    /// Chunks are contiguous: concatenated in order they give back `text`,
    /// and each [`Chunk::start`] is the byte offset of the chunk in `text`.
    fn split(&self, text: &str) -> Vec<Chunk>;

    /// Estimate the number of chunks for a given text length.
    ///
    /// Useful for pre-allocation. May be approximate, but should follow the
    /// splitter's own byte ceiling.
    fn estimate_chunks(&self, text_len: usize) -> usize;
}
