//! The Chunk type: one sentence-bounded fragment of an oversized row.

/// A fragment of a row's text with its position in that row.
///
/// ## Byte Offsets
///
/// `start` and `end` are byte offsets into the original row text, not
/// character indices, so `&row[chunk.start..chunk.end] == chunk.text`:
///
/// ```rust
/// use rowbatch::Chunk;
///
/// let row = "AA. BB. CC.";
/// let chunk = Chunk::new("BB. ", 4, 8, 1);
/// assert_eq!(&row[chunk.span()], chunk.text);
/// ```
///
/// ## Offset Table
///
/// Chunks of one row never overlap and never leave gaps, so `start` is also
/// that chunk's offset-table entry: the amount every span detected inside the
/// chunk must be shifted by to address the original row.
///
/// ```text
/// Row:     "AA. BB. CC."
/// Chunk 0: "AA. "  [0..4]
/// Chunk 1: "BB. "  [4..8]   span 0..2 in chunk -> 4..6 in row
/// Chunk 2: "CC."   [8..11]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text.
    pub text: String,
    /// Byte offset where this chunk starts in the row.
    pub start: usize,
    /// Byte offset where this chunk ends (exclusive) in the row.
    pub end: usize,
    /// Zero-based index of this chunk within its row.
    pub index: usize,
}

impl Chunk {
    /// Create a new chunk.
    #[must_use]
    pub fn new(text: impl Into<String>, start: usize, end: usize, index: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            index,
        }
    }

    /// The length of this chunk in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether this chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The byte span of this chunk in the row.
    #[must_use]
    pub fn span(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {{ index: {}, span: {}..{}, len: {} }}",
            self.index,
            self.start,
            self.end,
            self.len()
        )
    }
}
