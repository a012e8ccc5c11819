//! Property-based tests for splitting, planning and merging.
//!
//! These tests verify the invariants the pipeline relies on:
//! - Round-trip: a row's chunks concatenate back to the row
//! - Byte limit: multi-sentence chunks stay strictly under the ceiling
//! - Offsets: offset-table entries are the chunk start positions
//! - Coverage: every row appears in exactly one batch, in order
//! - Limits: no batch exceeds the count ceiling or mixes languages

use proptest::prelude::*;
use rowbatch::{
    merge_spans, truncate_to_bytes, Batch, BatchPlanner, Chunk, Limits, OffsetTable, Overflow,
    SentenceSplitter, Span, Splitter,
};
use unicode_segmentation::UnicodeSegmentation;

// =============================================================================
// Test Generators
// =============================================================================

/// Generate arbitrary text, multibyte included
fn arbitrary_text() -> impl Strategy<Value = String> {
    prop::string::string_regex(".{0,400}").unwrap()
}

/// Generate text with sentence-like structure
fn sentence_like_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::string::string_regex("[A-Za-zéü]{1,12}").unwrap(), 1..60).prop_map(
        |words| {
            let mut result = String::new();
            for (i, word) in words.iter().enumerate() {
                result.push_str(word);
                if i % 4 == 3 {
                    result.push_str(". ");
                } else {
                    result.push(' ');
                }
            }
            result
        },
    )
}

/// Generate a column of (text, language) rows
fn rows() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(
        (
            sentence_like_text(),
            prop::sample::select(vec!["en", "fr", "de"]).prop_map(str::to_owned),
        ),
        0..60,
    )
}

// =============================================================================
// Invariant Helpers
// =============================================================================

fn concatenated(chunks: &[Chunk]) -> String {
    chunks.iter().map(|c| c.text.as_str()).collect()
}

fn sentence_count(text: &str) -> usize {
    text.split_sentence_bounds().count()
}

// =============================================================================
// Splitter Properties
// =============================================================================

proptest! {
    #[test]
    fn split_round_trips(text in arbitrary_text(), max in 1usize..200) {
        let chunks = SentenceSplitter::new(max).split(&text);
        prop_assert_eq!(concatenated(&chunks), text);
    }

    #[test]
    fn multi_sentence_chunks_under_limit(text in sentence_like_text(), max in 1usize..200) {
        for chunk in SentenceSplitter::new(max).split(&text) {
            if sentence_count(&chunk.text) > 1 {
                prop_assert!(chunk.len() < max, "chunk of {} bytes at max {}", chunk.len(), max);
            }
        }
    }

    #[test]
    fn chunks_are_contiguous(text in arbitrary_text(), max in 1usize..200) {
        let chunks = SentenceSplitter::new(max).split(&text);
        let mut expected_start = 0;
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.index, i);
            prop_assert_eq!(chunk.start, expected_start);
            prop_assert!(!chunk.is_empty());
            prop_assert_eq!(&text[chunk.span()], chunk.text.as_str());
            expected_start = chunk.end;
        }
        prop_assert_eq!(expected_start, text.len());
    }

    #[test]
    fn offset_table_matches_chunk_starts(text in sentence_like_text(), max in 1usize..100) {
        let chunks = SentenceSplitter::new(max).split(&text);
        let table = OffsetTable::from_chunks(&chunks);

        let starts: Vec<usize> = chunks.iter().map(|c| c.start).collect();
        prop_assert_eq!(table.as_slice(), starts.as_slice());
        prop_assert_eq!(table.total_len(), text.len());
    }

    #[test]
    fn merged_spans_address_row(text in sentence_like_text(), max in 1usize..100) {
        let chunks = SentenceSplitter::new(max).split(&text);
        let table = OffsetTable::from_chunks(&chunks);

        // One span per chunk covering its first character.
        let per_chunk: Vec<Vec<Span>> = chunks
            .iter()
            .map(|c| {
                let first = c.text.chars().next().map_or(0, char::len_utf8);
                vec![Span::new("FIRST", 0, first)]
            })
            .collect();
        let merged = merge_spans(per_chunk, &table).unwrap();

        for (span, chunk) in merged.iter().zip(&chunks) {
            prop_assert_eq!(&text[span.begin..span.end], &chunk.text[..span.end - span.begin]);
        }
    }

    #[test]
    fn truncation_is_prefix_within_limit(text in arbitrary_text(), max in 0usize..100) {
        let truncated = truncate_to_bytes(&text, max);
        prop_assert!(truncated.len() <= max);
        prop_assert!(text.starts_with(truncated));
        if text.len() <= max {
            prop_assert_eq!(truncated, text.as_str());
        }
    }
}

// =============================================================================
// Planner Properties
// =============================================================================

proptest! {
    #[test]
    fn every_row_planned_once_in_order(
        rows in rows(),
        max_bytes in 8usize..120,
        max_batch in 1usize..8,
    ) {
        let (texts, languages): (Vec<String>, Vec<String>) = rows.into_iter().unzip();
        let planner = BatchPlanner::new(Limits::new(max_bytes, max_batch).unwrap())
            .unwrap()
            .group_by_language(true);
        let batches = planner.plan_with_languages(&texts, &languages).unwrap();

        let mut next_row = 0;
        for batch in &batches {
            prop_assert!(!batch.is_empty());
            prop_assert_eq!(batch.rows().start, next_row);
            next_row = batch.rows().end;
        }
        prop_assert_eq!(next_row, texts.len());
    }

    #[test]
    fn batches_respect_limits(
        rows in rows(),
        max_bytes in 8usize..120,
        max_batch in 1usize..8,
    ) {
        let (texts, languages): (Vec<String>, Vec<String>) = rows.into_iter().unzip();
        let limits = Limits::new(max_bytes, max_batch).unwrap();
        let planner = BatchPlanner::new(limits).unwrap().group_by_language(true);

        for batch in planner.plan_with_languages(&texts, &languages).unwrap() {
            match &batch {
                Batch::MultiRow { first_row, texts: items, language } => {
                    prop_assert!(items.len() <= max_batch);
                    for (row, item) in (*first_row..).zip(items) {
                        prop_assert!(!limits.is_oversized(item.len()));
                        prop_assert_eq!(Some(languages[row].as_str()), language.as_deref());
                    }
                }
                Batch::TextSplit { row, chunks, language } => {
                    prop_assert!(limits.is_oversized(texts[*row].len()));
                    prop_assert_eq!(concatenated(chunks), texts[*row].clone());
                    prop_assert_eq!(Some(languages[*row].as_str()), language.as_deref());
                }
            }
        }
    }

    #[test]
    fn truncating_planner_keeps_one_item_per_row(
        texts in prop::collection::vec(arbitrary_text(), 0..60),
        max_bytes in 1usize..120,
        max_batch in 1usize..8,
    ) {
        let planner = BatchPlanner::new(Limits::new(max_bytes, max_batch).unwrap())
            .unwrap()
            .overflow(Overflow::Truncate);
        let batches = planner.plan(&texts);

        let items: usize = batches.iter().map(Batch::len).sum();
        prop_assert_eq!(items, texts.len());
        for batch in &batches {
            for (row, item) in batch.rows().zip(batch.texts()) {
                prop_assert!(item.len() <= max_bytes);
                prop_assert!(texts[row].starts_with(item));
            }
        }
    }
}
