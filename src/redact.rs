//! Type-filtered redaction and value extraction over detected spans.
//!
//! ## Drift
//!
//! Replacing a span with a placeholder changes the text length, and every
//! later span was detected against the *unredacted* text. So we carry the
//! running length change ("drift") and add it to each later span:
//!
//! ```text
//! text:  "Bob lives in Paris"
//! spans: NAME 0..3, LOCATION 13..18
//!
//! NAME     0..3   + drift 0  -> "[NAME] lives in Paris"      drift = 6 - 3 = 3
//! LOCATION 13..18 + drift 3  -> "[NAME] lives in [LOCATION]"
//! ```
//!
//! This only works when spans are applied in ascending begin order. The
//! capability reports them that way; if a list arrives out of order it is
//! sorted first.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::str::FromStr;

use tracing::warn;

use crate::{Error, Result, Span};

/// Which span types to redact.
///
/// Parsed from a comma- or space-separated label list, e.g. `"NAME, ADDRESS"`.
/// The label `ALL` anywhere in the list selects every type.
///
/// ```rust
/// use rowbatch::RedactionFilter;
///
/// let filter = RedactionFilter::parse("NAME, ADDRESS");
/// assert!(filter.matches("NAME"));
/// assert!(!filter.matches("DATE"));
///
/// assert_eq!(RedactionFilter::parse("ALL"), RedactionFilter::All);
/// assert!(RedactionFilter::parse("").is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedactionFilter {
    /// Redact every span.
    All,
    /// Redact spans whose label is in the set.
    Types(BTreeSet<String>),
}

impl RedactionFilter {
    /// Parse a label list.
    #[must_use]
    pub fn parse(labels: &str) -> Self {
        let labels: BTreeSet<String> = labels
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|label| !label.is_empty())
            .map(str::to_owned)
            .collect();

        if labels.contains("ALL") {
            Self::All
        } else {
            Self::Types(labels)
        }
    }

    /// Whether spans labelled `label` are redacted.
    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Self::All => true,
            Self::Types(labels) => labels.contains(label),
        }
    }

    /// Whether the filter selects nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Types(labels) if labels.is_empty())
    }
}

impl FromStr for RedactionFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Replace every span selected by `filter` with `[LABEL]`.
///
/// `spans` address `text` before redaction. Spans that overlap an already
/// redacted span are skipped.
///
/// # Errors
///
/// [`Error::SpanOutOfBounds`] if a span does not fall inside `text` on
/// character boundaries.
///
/// ```rust
/// use rowbatch::{redact, RedactionFilter, Span};
///
/// let spans = [Span::new("NAME", 0, 3), Span::new("LOC", 13, 18)];
/// let redacted = redact("Bob lives in Paris", &spans, &RedactionFilter::All).unwrap();
/// assert_eq!(redacted, "[NAME] lives in [LOC]");
/// ```
pub fn redact(text: &str, spans: &[Span], filter: &RedactionFilter) -> Result<String> {
    let mut redacted = text.to_owned();
    if filter.is_empty() {
        return Ok(redacted);
    }

    let mut drift: isize = 0;
    let mut redacted_until = 0usize;

    for span in in_text_order(spans).iter() {
        if !filter.matches(&span.label) {
            continue;
        }
        if span.begin < redacted_until {
            warn!(
                label = %span.label,
                begin = span.begin,
                end = span.end,
                "skipping span that overlaps an earlier redaction"
            );
            continue;
        }

        let start = shifted(span.begin, drift);
        let end = shifted(span.end, drift);
        let range = match (start, end) {
            (Some(start), Some(end))
                if start <= end
                    && end <= redacted.len()
                    && redacted.is_char_boundary(start)
                    && redacted.is_char_boundary(end) =>
            {
                start..end
            }
            _ => {
                return Err(Error::SpanOutOfBounds {
                    begin: span.begin,
                    end: span.end,
                    len: text.len(),
                })
            }
        };

        let placeholder = format!("[{}]", span.label);
        drift += placeholder.len() as isize - range.len() as isize;
        redacted.replace_range(range, &placeholder);
        redacted_until = span.end;
    }

    Ok(redacted)
}

/// The `(label, value)` pairs named by `spans`, in span order.
///
/// ```rust
/// use rowbatch::{extract_typed_values, Span};
///
/// let spans = [Span::new("PERSON", 5, 8)];
/// let values = extract_typed_values("I am Bob", &spans).unwrap();
/// assert_eq!(values, [("PERSON".to_string(), "Bob".to_string())]);
/// ```
pub fn extract_typed_values(text: &str, spans: &[Span]) -> Result<Vec<(String, String)>> {
    spans
        .iter()
        .map(|span| {
            text.get(span.begin..span.end)
                .map(|value| (span.label.clone(), value.to_owned()))
                .ok_or(Error::SpanOutOfBounds {
                    begin: span.begin,
                    end: span.end,
                    len: text.len(),
                })
        })
        .collect()
}

fn shifted(offset: usize, drift: isize) -> Option<usize> {
    offset.checked_add_signed(drift)
}

fn in_text_order(spans: &[Span]) -> Cow<'_, [Span]> {
    if spans.windows(2).all(|w| w[0].begin <= w[1].begin) {
        return Cow::Borrowed(spans);
    }
    warn!(spans = spans.len(), "spans out of text order; sorting before redaction");
    let mut sorted = spans.to_vec();
    sorted.sort_by_key(|span| span.begin);
    Cow::Owned(sorted)
}
