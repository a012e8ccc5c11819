//! Error types for rowbatch.

use crate::capability::{BatchItemError, CapabilityError};

/// Errors that can occur while planning, calling, or merging.
///
/// Every variant aborts the whole invocation: a row-analytics call either
/// returns one result per input row or one of these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A limit was configured as zero.
    #[error("invalid limit {name}: {value} (must be > 0)")]
    InvalidLimit {
        /// Which limit (`max_text_bytes` or `max_batch_size`).
        name: &'static str,
        /// The rejected value.
        value: usize,
    },

    /// Parallel input columns differ in length.
    #[error("column {column} has {actual} rows, expected {expected}")]
    ColumnLength {
        /// The offending column.
        column: &'static str,
        /// Row count of the text column.
        expected: usize,
        /// Row count of the offending column.
        actual: usize,
    },

    /// Per-chunk results and the offset table are out of step.
    #[error("cannot merge {results} chunk results against {offsets} offsets")]
    OffsetTableMismatch {
        /// Number of chunk result lists.
        results: usize,
        /// Number of offset table entries.
        offsets: usize,
    },

    /// The capability answered with a different number of results than texts sent.
    #[error("{operation}: batch {batch} sent {expected} texts but got {actual} results")]
    ResultCountMismatch {
        /// Operation name.
        operation: &'static str,
        /// Zero-based index of the batch in plan order.
        batch: usize,
        /// Texts submitted.
        expected: usize,
        /// Results received.
        actual: usize,
    },

    /// The capability reported item-level errors for a batch.
    #[error("{operation}: batch {batch} reported {} item errors: {errors:?}", errors.len())]
    BatchItemErrors {
        /// Operation name.
        operation: &'static str,
        /// Zero-based index of the batch in plan order.
        batch: usize,
        /// The item errors as reported.
        errors: Vec<BatchItemError>,
    },

    /// The capability answered an item with nothing to report where a value is required.
    #[error("{operation}: batch {batch} item {item} came back empty")]
    EmptyResult {
        /// Operation name.
        operation: &'static str,
        /// Zero-based index of the batch in plan order.
        batch: usize,
        /// Position of the item within the batch.
        item: usize,
    },

    /// Batching lost or duplicated rows.
    #[error("{operation}: produced {actual} results for {expected} rows")]
    RowCount {
        /// Operation name.
        operation: &'static str,
        /// Input rows.
        expected: usize,
        /// Results produced.
        actual: usize,
    },

    /// A capability call failed outright.
    #[error("{operation}: batch {batch} failed: {source}")]
    Capability {
        /// Operation name.
        operation: &'static str,
        /// Zero-based index of the batch in plan order.
        batch: usize,
        /// The collaborator's error.
        #[source]
        source: CapabilityError,
    },

    /// A span does not address a valid slice of its text.
    #[error("span {begin}..{end} is outside text of {len} bytes or splits a character")]
    SpanOutOfBounds {
        /// Begin offset as reported.
        begin: usize,
        /// End offset as reported.
        end: usize,
        /// Byte length of the text.
        len: usize,
    },

    /// Rendering a row result failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for rowbatch operations.
pub type Result<T> = std::result::Result<T, Error>;
