//! Reassembling per-chunk results into one row result.
//!
//! A split row is answered chunk by chunk. Two things can come back:
//!
//! - **Rewritten text** (translation): the row result is the chunks'
//!   outputs joined in order. See [`merge_concatenated`].
//! - **Annotations** (entities, PII, key phrases): each chunk's spans are
//!   relative to that chunk. They must be shifted by the chunk's starting
//!   offset in the row before they mean anything. See [`merge_spans`].
//!
//! ```text
//! Row:     "AA. BB. CC."
//! Chunks:  ["AA. ", "BB. ", "CC."]
//! Offsets: [0,      4,      8    ]
//!
//! chunk 1 reports span 0..2 ("BB")  ->  row span 4..6 ("BB")
//! ```
//!
//! Chunks are merged in order and each chunk's spans are already in text
//! order, so the merged list is in row order without sorting.

use crate::{Chunk, Error, Result};

/// An annotation that can be moved to a later position in its text.
pub trait Shift {
    /// Add `by` to every offset this annotation carries.
    fn shift(&mut self, by: usize);
}

/// Cumulative starting offset of each chunk within the original row.
///
/// Built incrementally: the first chunk starts at 0 and each later chunk
/// starts where the previous one ended.
///
/// ```rust
/// use rowbatch::OffsetTable;
///
/// let table = OffsetTable::from_lengths([4, 4, 3]);
/// assert_eq!(table.as_slice(), &[0, 4, 8]);
/// assert_eq!(table.total_len(), 11);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: Vec<usize>,
    total: usize,
}

impl OffsetTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next chunk, `len` bytes long.
    pub fn push(&mut self, len: usize) {
        self.offsets.push(self.total);
        self.total += len;
    }

    /// Build a table from chunk lengths in order.
    pub fn from_lengths(lengths: impl IntoIterator<Item = usize>) -> Self {
        let mut table = Self::new();
        for len in lengths {
            table.push(len);
        }
        table
    }

    /// Build a table for the chunks of one row.
    #[must_use]
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        Self::from_lengths(chunks.iter().map(Chunk::len))
    }

    /// Number of chunks recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether no chunk was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Starting offset of chunk `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    /// All starting offsets.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.offsets
    }

    /// Combined length of all recorded chunks.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.total
    }
}

/// Join rewritten chunk outputs in order.
///
/// ```rust
/// use rowbatch::merge_concatenated;
///
/// assert_eq!(merge_concatenated(&["Bonjour. ", "Au revoir."]), "Bonjour. Au revoir.");
/// ```
pub fn merge_concatenated<S: AsRef<str>>(parts: &[S]) -> String {
    let mut merged = String::with_capacity(parts.iter().map(|p| p.as_ref().len()).sum());
    for part in parts {
        merged.push_str(part.as_ref());
    }
    merged
}

/// Shift each chunk's annotations by its offset and concatenate them.
///
/// # Errors
///
/// [`Error::OffsetTableMismatch`] when there is not exactly one result list
/// per offset-table entry. Nothing is merged in that case.
///
/// ```rust
/// use rowbatch::{merge_spans, OffsetTable, Span};
///
/// let per_chunk = vec![vec![], vec![Span::new("NAME", 0, 2)], vec![]];
/// let merged = merge_spans(per_chunk, &OffsetTable::from_lengths([4, 4, 3])).unwrap();
/// assert_eq!(merged, [Span::new("NAME", 4, 6)]);
/// ```
pub fn merge_spans<T: Shift>(chunk_results: Vec<Vec<T>>, offsets: &OffsetTable) -> Result<Vec<T>> {
    if chunk_results.len() != offsets.len() {
        return Err(Error::OffsetTableMismatch {
            results: chunk_results.len(),
            offsets: offsets.len(),
        });
    }

    let mut merged = Vec::with_capacity(chunk_results.iter().map(Vec::len).sum());
    for (spans, &offset) in chunk_results.into_iter().zip(offsets.as_slice()) {
        merged.extend(spans.into_iter().map(|mut span| {
            span.shift(offset);
            span
        }));
    }
    Ok(merged)
}
