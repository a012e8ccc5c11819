//! Sentence-bounded splitting of oversized rows.
//!
//! A row longer than the capability's byte ceiling cannot be sent as one
//! item. Cutting it at an arbitrary byte would break words and, worse, the
//! entities we are trying to detect. So we cut between sentences only.
//!
//! ## The Algorithm
//!
//! ```text
//! max_bytes = 10
//!
//! Sentences: ["One. ", "Two. ", "Three. ", "Four."]
//!             5        5        7          5
//!
//! running 0  + 5 =  5  < 10   keep
//! running 5  + 5 = 10 >= 10   close ["One. "], restart at "Two. "
//! running 5  + 7 = 12 >= 10   close ["Two. "], restart at "Three. "
//! running 7  + 5 = 12 >= 10   close ["Three. "], restart at "Four."
//! end                         close ["Four."]
//! ```
//!
//! A chunk built from several sentences is therefore always strictly under
//! `max_bytes`. A single sentence that is itself larger than `max_bytes`
//! becomes a chunk of its own and passes through whole: it is logged, never
//! truncated or dropped.
//!
//! ## Sentence Boundaries
//!
//! Boundaries come from Unicode Standard Annex #29 (UAX #29), which copes
//! with decimal numbers, ellipses and most abbreviations. Each sentence keeps
//! its trailing whitespace, so chunks concatenate back to the exact input.

use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

use crate::{Chunk, Limits, Splitter};

/// Greedy sentence-respecting splitter with a byte ceiling.
///
/// ## Example
///
/// ```rust
/// use rowbatch::{SentenceSplitter, Splitter};
///
/// let splitter = SentenceSplitter::new(4);
/// let chunks = splitter.split("AA. BB. CC.");
///
/// let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, ["AA. ", "BB. ", "CC."]);
/// assert_eq!(chunks[1].start, 4);
/// ```
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    max_bytes: usize,
}

impl SentenceSplitter {
    /// Create a splitter for the given byte ceiling.
    ///
    /// # Panics
    ///
    /// Panics if `max_bytes == 0`.
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        assert!(max_bytes > 0, "max_bytes must be > 0");
        Self { max_bytes }
    }

    /// Create a splitter for the per-item ceiling of `limits`.
    #[must_use]
    pub fn from_limits(limits: &Limits) -> Self {
        Self::new(limits.max_text_bytes())
    }

    /// The byte ceiling.
    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

impl Splitter for SentenceSplitter {
    fn split(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return vec![];
        }

        let mut chunks = Vec::with_capacity(self.estimate_chunks(text.len()));
        let mut start = 0;
        let mut running = 0usize;

        for (offset, sentence) in text.split_sentence_bound_indices() {
            if sentence.len() > self.max_bytes {
                warn!(
                    bytes = sentence.len(),
                    max_bytes = self.max_bytes,
                    "sentence exceeds byte limit and cannot be split; passing it through whole"
                );
            }

            // Never close an empty chunk: the first sentence of a chunk always stays.
            if running > 0 && running.saturating_add(sentence.len()) >= self.max_bytes {
                chunks.push(Chunk::new(&text[start..offset], start, offset, chunks.len()));
                start = offset;
                running = 0;
            }
            running += sentence.len();
        }

        if running > 0 {
            chunks.push(Chunk::new(&text[start..], start, text.len(), chunks.len()));
        }

        chunks
    }

    fn estimate_chunks(&self, text_len: usize) -> usize {
        text_len / self.max_bytes + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_offset_example() {
        let chunks = SentenceSplitter::new(4).split("AA. BB. CC.");

        assert_eq!(texts(&chunks), ["AA. ", "BB. ", "CC."]);
        let starts: Vec<usize> = chunks.iter().map(|c| c.start).collect();
        assert_eq!(starts, [0, 4, 8]);
    }

    #[test]
    fn test_groups_sentences_under_limit() {
        let text = "One. Two. Three. Four.";
        let chunks = SentenceSplitter::new(13).split(text);

        assert_eq!(texts(&chunks), ["One. Two. ", "Three. Four."]);
        for chunk in &chunks {
            assert!(chunk.len() < 13);
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = SentenceSplitter::new(100).split("Hello world. How are you?");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].span(), 0..25);
    }

    #[test]
    fn test_unsplittable_sentence_passes_through() {
        let long = "This sentence is far longer than the limit allows. ";
        let text = format!("Hi. {long}Bye.");
        let chunks = SentenceSplitter::new(10).split(&text);

        assert_eq!(texts(&chunks), ["Hi. ", long, "Bye."]);
        assert!(chunks[1].len() > 10);
    }

    #[test]
    fn test_concatenation_restores_text() {
        let text = "Dr. Smith went to Washington. He met Mr. Jones! Was it 3.14 p.m.? Maybe.";
        let chunks = SentenceSplitter::new(20).split(text);

        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, text);
        for chunk in &chunks {
            assert_eq!(&text[chunk.span()], chunk.text);
        }
    }

    #[test]
    fn test_multibyte_sentences() {
        let text = "Привет мир. Как дела? Всё хорошо.";
        let chunks = SentenceSplitter::new(30).split(text);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(text.is_char_boundary(chunk.start));
        }
    }

    #[test]
    fn test_estimate_follows_byte_ceiling() {
        let small = SentenceSplitter::new(10);
        let large = SentenceSplitter::new(5000);
        assert_eq!(small.estimate_chunks(0), 1);
        assert_eq!(small.estimate_chunks(95), 10);
        assert_eq!(large.estimate_chunks(95), 1);
    }

    #[test]
    fn test_empty_text() {
        assert!(SentenceSplitter::new(10).split("").is_empty());
    }

    #[test]
    #[should_panic]
    fn test_zero_limit_panics() {
        let _ = SentenceSplitter::new(0);
    }
}
