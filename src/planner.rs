//! Batch planning: grouping rows into capability-sized requests.
//!
//! ## The Problem
//!
//! The capability takes at most `max_batch_size` texts per call, each at most
//! `max_text_bytes` long, and (for most operations) one language per call.
//! Input columns are arbitrary: thousands of rows, mixed languages, the odd
//! multi-kilobyte comment. We want as few calls as possible while every row
//! keeps its position.
//!
//! ## The Scan
//!
//! Rows are scanned left to right with one open batch. Before a row is added:
//!
//! 1. If the open batch is full, or the row's language differs from the open
//!    batch's language, the open batch is closed. The row starts a new one.
//! 2. Then the row's byte length is checked. An oversized row is either
//!    truncated (and joins the open batch), or split: the open batch is closed
//!    first, the row becomes a [`Batch::TextSplit`] of its own, and the next
//!    row opens a fresh batch.
//!
//! ```text
//! max_batch_size = 2, grouped by language, split on overflow
//!
//! rows:    (t1,en) (t2,en) (t3,en) (LONG,en) (t5,fr)
//! batches: [t1 t2]@en  [t3]@en  split(LONG)@en  [t5]@fr
//!           count      overflow closes           language change
//! ```
//!
//! The checks run in that order so a split never pulls rows out of a batch
//! that was already closed.
//!
//! ## Truncate or Split?
//!
//! Operations that only look at the leading text (dominant language,
//! sentiment) truncate: cheap, and lossy by design. Operations that annotate
//! the whole text (entities, PII, key phrases, translation) split, and merge
//! the per-chunk results back afterwards.

use std::ops::Range;

use tracing::info;

use crate::{Chunk, Error, Limits, Result, SentenceSplitter, Splitter};

/// What to do with a row whose text exceeds `max_text_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    /// Cut the text to the byte ceiling at a character boundary.
    Truncate,
    /// Split the text at sentence boundaries into a [`Batch::TextSplit`].
    #[default]
    Split,
    /// Leave the text alone. Used when items already went through splitting.
    Keep,
}

/// Kind tag of a [`Batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// Several independent rows.
    MultiRow,
    /// The chunks of one oversized row.
    TextSplit,
}

impl std::fmt::Display for BatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultiRow => f.write_str("MULTI_ROW"),
            Self::TextSplit => f.write_str("TEXT_SPLIT"),
        }
    }
}

/// One planned capability request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Batch {
    /// Consecutive rows `first_row..first_row + texts.len()`.
    ///
    /// Every text is within the byte ceiling (unless planned with
    /// [`Overflow::Keep`]), there are at most `max_batch_size` of them, and
    /// they share `language` when planning groups by language.
    MultiRow {
        /// Index of the first row in the batch.
        first_row: usize,
        /// The row texts, truncated where the plan says so.
        texts: Vec<String>,
        /// Shared language code, if grouping by language.
        language: Option<String>,
    },
    /// The sentence chunks of a single oversized row, in order.
    TextSplit {
        /// Index of the row that was split.
        row: usize,
        /// The chunks; concatenated they give back the row text.
        chunks: Vec<Chunk>,
        /// The row's language code, if grouping by language.
        language: Option<String>,
    },
}

impl Batch {
    /// The kind tag.
    #[must_use]
    pub fn kind(&self) -> BatchKind {
        match self {
            Self::MultiRow { .. } => BatchKind::MultiRow,
            Self::TextSplit { .. } => BatchKind::TextSplit,
        }
    }

    /// The input rows this batch produces results for.
    #[must_use]
    pub fn rows(&self) -> Range<usize> {
        match self {
            Self::MultiRow {
                first_row, texts, ..
            } => *first_row..first_row + texts.len(),
            Self::TextSplit { row, .. } => *row..row + 1,
        }
    }

    /// The shared language code.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        match self {
            Self::MultiRow { language, .. } | Self::TextSplit { language, .. } => {
                language.as_deref()
            }
        }
    }

    /// The texts to send, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Self::MultiRow { texts, .. } => texts.iter().map(String::as_str).collect(),
            Self::TextSplit { chunks, .. } => chunks.iter().map(|c| c.text.as_str()).collect(),
        }
    }

    /// Number of items in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::MultiRow { texts, .. } => texts.len(),
            Self::TextSplit { chunks, .. } => chunks.len(),
        }
    }

    /// Whether the batch holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Plans [`Batch`]es over a column of rows.
///
/// ## Example
///
/// ```rust
/// use rowbatch::{BatchPlanner, Limits};
///
/// let limits = Limits::new(5000, 2).unwrap();
/// let planner = BatchPlanner::new(limits).unwrap().group_by_language(true);
///
/// let batches = planner
///     .plan_with_languages(&["t1", "t2", "t3"], &["en", "en", "fr"])
///     .unwrap();
///
/// assert_eq!(batches.len(), 2);
/// assert_eq!(batches[0].texts(), ["t1", "t2"]);
/// assert_eq!(batches[0].language(), Some("en"));
/// assert_eq!(batches[1].texts(), ["t3"]);
/// assert_eq!(batches[1].language(), Some("fr"));
/// ```
#[derive(Debug, Clone)]
pub struct BatchPlanner {
    limits: Limits,
    overflow: Overflow,
    group_by_language: bool,
}

impl BatchPlanner {
    /// Create a planner that splits oversized rows and ignores language.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLimit`] if either limit is zero, e.g. when `limits`
    /// came from a configuration document.
    pub fn new(limits: Limits) -> Result<Self> {
        limits.validate()?;
        Ok(Self {
            limits,
            overflow: Overflow::default(),
            group_by_language: false,
        })
    }

    /// A planner that only enforces `max_batch_size`.
    ///
    /// Used to re-batch the chunks of a split row: they already fit the byte
    /// ceiling and share one language.
    pub fn count_only(limits: Limits) -> Result<Self> {
        Ok(Self::new(limits)?.overflow(Overflow::Keep))
    }

    /// Set the overflow policy.
    #[must_use]
    pub fn overflow(self, overflow: Overflow) -> Self {
        Self { overflow, ..self }
    }

    /// Close the open batch whenever the language code changes.
    #[must_use]
    pub fn group_by_language(self, group_by_language: bool) -> Self {
        Self {
            group_by_language,
            ..self
        }
    }

    /// The limits this planner enforces.
    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Plan batches for rows without a language column.
    pub fn plan<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Batch> {
        let texts: Vec<&str> = texts.iter().map(|s| s.as_ref()).collect();
        self.plan_rows(&texts, None)
    }

    /// Plan batches for rows with a parallel language column.
    pub fn plan_with_languages<S, L>(&self, texts: &[S], languages: &[L]) -> Result<Vec<Batch>>
    where
        S: AsRef<str>,
        L: AsRef<str>,
    {
        if languages.len() != texts.len() {
            return Err(Error::ColumnLength {
                column: "language",
                expected: texts.len(),
                actual: languages.len(),
            });
        }
        let texts: Vec<&str> = texts.iter().map(|s| s.as_ref()).collect();
        let languages: Vec<&str> = languages.iter().map(|l| l.as_ref()).collect();
        Ok(self.plan_rows(&texts, Some(languages.as_slice())))
    }

    fn plan_rows(&self, texts: &[&str], languages: Option<&[&str]>) -> Vec<Batch> {
        let language_at = |row: usize| {
            if self.group_by_language {
                languages.map(|codes| codes[row])
            } else {
                None
            }
        };

        let mut batches = Vec::with_capacity(texts.len() / self.limits.max_batch_size() + 1);
        let mut open = OpenBatch::default();

        for (row, &text) in texts.iter().enumerate() {
            let row_language = language_at(row);

            if !open.is_empty()
                && (self.limits.is_full(open.len()) || open.language != row_language)
            {
                batches.extend(open.close());
            }

            if !self.limits.is_oversized(text.len()) {
                open.push(row, text, row_language);
                continue;
            }

            match self.overflow {
                Overflow::Keep => open.push(row, text, row_language),
                Overflow::Truncate => {
                    let truncated = truncate_to_bytes(text, self.limits.max_text_bytes());
                    info!(
                        row,
                        bytes = text.len(),
                        max_bytes = self.limits.max_text_bytes(),
                        "truncating long text"
                    );
                    open.push(row, truncated, row_language);
                }
                Overflow::Split => {
                    batches.extend(open.close());
                    let chunks = SentenceSplitter::from_limits(&self.limits).split(text);
                    info!(
                        row,
                        bytes = text.len(),
                        chunks = chunks.len(),
                        max_bytes = self.limits.max_text_bytes(),
                        "split long text"
                    );
                    batches.push(Batch::TextSplit {
                        row,
                        chunks,
                        language: row_language.map(str::to_owned),
                    });
                }
            }
        }

        batches.extend(open.close());
        batches
    }
}

/// The batch currently being filled.
#[derive(Default)]
struct OpenBatch<'a> {
    first_row: usize,
    texts: Vec<String>,
    language: Option<&'a str>,
}

impl<'a> OpenBatch<'a> {
    fn len(&self) -> usize {
        self.texts.len()
    }

    fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    fn push(&mut self, row: usize, text: &str, language: Option<&'a str>) {
        if self.texts.is_empty() {
            self.first_row = row;
            self.language = language;
        }
        self.texts.push(text.to_owned());
    }

    fn close(&mut self) -> Option<Batch> {
        if self.texts.is_empty() {
            return None;
        }
        Some(Batch::MultiRow {
            first_row: self.first_row,
            texts: std::mem::take(&mut self.texts),
            language: self.language.map(str::to_owned),
        })
    }
}

/// Cut `text` to at most `max_bytes` UTF-8 bytes without splitting a character.
///
/// ```rust
/// use rowbatch::truncate_to_bytes;
///
/// assert_eq!(truncate_to_bytes("héllo", 2), "h");
/// assert_eq!(truncate_to_bytes("héllo", 3), "hé");
/// assert_eq!(truncate_to_bytes("hello", 10), "hello");
/// ```
#[must_use]
pub fn truncate_to_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    // Replaces text.floor_char_boundary(max_bytes) for MSRV < 1.80 compatibility
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_text_bytes: usize, max_batch_size: usize) -> Limits {
        Limits::new(max_text_bytes, max_batch_size).unwrap()
    }

    fn shape(batches: &[Batch]) -> Vec<(BatchKind, Range<usize>)> {
        batches.iter().map(|b| (b.kind(), b.rows())).collect()
    }

    #[test]
    fn test_count_limit() {
        let planner = BatchPlanner::new(limits(100, 2)).unwrap();
        let batches = planner.plan(&["a", "b", "c", "d", "e"]);

        assert_eq!(
            shape(&batches),
            [
                (BatchKind::MultiRow, 0..2),
                (BatchKind::MultiRow, 2..4),
                (BatchKind::MultiRow, 4..5),
            ]
        );
    }

    #[test]
    fn test_language_change_closes_batch() {
        let planner = BatchPlanner::new(limits(100, 2)).unwrap().group_by_language(true);
        let batches = planner
            .plan_with_languages(&["t1", "t2", "t3"], &["en", "en", "fr"])
            .unwrap();

        assert_eq!(batches[0].texts(), ["t1", "t2"]);
        assert_eq!(batches[0].language(), Some("en"));
        assert_eq!(batches[1].texts(), ["t3"]);
        assert_eq!(batches[1].language(), Some("fr"));
    }

    #[test]
    fn test_language_change_under_count() {
        let planner = BatchPlanner::new(limits(100, 25)).unwrap().group_by_language(true);
        let batches = planner
            .plan_with_languages(&["a", "b", "c", "d"], &["en", "fr", "fr", "en"])
            .unwrap();

        assert_eq!(
            shape(&batches),
            [
                (BatchKind::MultiRow, 0..1),
                (BatchKind::MultiRow, 1..3),
                (BatchKind::MultiRow, 3..4),
            ]
        );
    }

    #[test]
    fn test_languages_ignored_without_grouping() {
        let planner = BatchPlanner::new(limits(100, 25)).unwrap();
        let batches = planner
            .plan_with_languages(&["a", "b"], &["en", "fr"])
            .unwrap();

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].language(), None);
    }

    #[test]
    fn test_overflow_split_closes_open_batch() {
        let planner = BatchPlanner::new(limits(10, 5)).unwrap();
        let long = "First one. Second one. Third.";
        let batches = planner.plan(&["a", "b", long, "c"]);

        assert_eq!(
            shape(&batches),
            [
                (BatchKind::MultiRow, 0..2),
                (BatchKind::TextSplit, 2..3),
                (BatchKind::MultiRow, 3..4),
            ]
        );
        let Batch::TextSplit { chunks, .. } = &batches[1] else {
            panic!("expected a split batch");
        };
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, long);
    }

    #[test]
    fn test_split_first_and_last_rows() {
        let planner = BatchPlanner::new(limits(10, 5)).unwrap();
        let long = "Alpha beta. Gamma delta.";
        let batches = planner.plan(&[long, "x", long]);

        assert_eq!(
            shape(&batches),
            [
                (BatchKind::TextSplit, 0..1),
                (BatchKind::MultiRow, 1..2),
                (BatchKind::TextSplit, 2..3),
            ]
        );
    }

    #[test]
    fn test_single_item_batches_never_empty() {
        let planner = BatchPlanner::new(limits(10, 1)).unwrap().group_by_language(true);
        let long = "Alpha beta. Gamma delta.";
        let batches = planner
            .plan_with_languages(&["a", long, "b", "c"], &["en", "de", "fr", "fr"])
            .unwrap();

        assert!(batches.iter().all(|b| !b.is_empty()));
        assert_eq!(
            shape(&batches),
            [
                (BatchKind::MultiRow, 0..1),
                (BatchKind::TextSplit, 1..2),
                (BatchKind::MultiRow, 2..3),
                (BatchKind::MultiRow, 3..4),
            ]
        );
        assert_eq!(batches[1].language(), Some("de"));
    }

    #[test]
    fn test_truncate_keeps_row_in_batch() {
        let planner = BatchPlanner::new(limits(5, 25))
            .unwrap()
            .overflow(Overflow::Truncate);
        let batches = planner.plan(&["short", "much longer text", "end"]);

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].texts(), ["short", "much ", "end"]);
    }

    #[test]
    fn test_text_at_limit_is_not_oversized() {
        let planner = BatchPlanner::new(limits(5, 25)).unwrap();
        let batches = planner.plan(&["12345", "123456"]);

        assert_eq!(
            shape(&batches),
            [(BatchKind::MultiRow, 0..1), (BatchKind::TextSplit, 1..2)]
        );
    }

    #[test]
    fn test_keep_passes_oversized_through() {
        let planner = BatchPlanner::count_only(limits(3, 2)).unwrap();
        let batches = planner.plan(&["long text", "b", "c"]);

        assert_eq!(batches[0].texts(), ["long text", "b"]);
        assert_eq!(batches[1].texts(), ["c"]);
    }

    #[test]
    fn test_empty_input() {
        let planner = BatchPlanner::new(Limits::default()).unwrap();
        assert!(planner.plan::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_column_length_mismatch() {
        let planner = BatchPlanner::new(Limits::default()).unwrap().group_by_language(true);
        let err = planner.plan_with_languages(&["a", "b"], &["en"]).unwrap_err();
        assert!(matches!(
            err,
            Error::ColumnLength {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_limit_from_config_rejected() {
        let zero_bytes: Limits = serde_json::from_str(r#"{"maxTextBytes": 0}"#).unwrap();
        assert!(matches!(
            BatchPlanner::new(zero_bytes),
            Err(Error::InvalidLimit {
                name: "max_text_bytes",
                value: 0
            })
        ));

        let zero_batch: Limits = serde_json::from_str(r#"{"maxBatchSize": 0}"#).unwrap();
        assert!(BatchPlanner::count_only(zero_batch).is_err());
    }

    #[test]
    fn test_truncate_to_bytes_multibyte() {
        let text = "日本語";
        assert_eq!(truncate_to_bytes(text, 4), "日");
        assert_eq!(truncate_to_bytes(text, 6), "日本");
        assert_eq!(truncate_to_bytes(text, 0), "");
    }
}
