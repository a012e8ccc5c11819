//! Row-analytics operations and their per-row outputs.
//!
//! Each operation carries its own argument columns, so the pipeline matches on
//! the variant instead of inspecting how many columns it was given.
//!
//! | Operation                | Columns                                  | Oversized rows |
//! |--------------------------|------------------------------------------|----------------|
//! | `DetectDominantLanguage` | text                                     | truncated      |
//! | `DetectSentiment`        | text, language                           | truncated      |
//! | `DetectEntities`         | text, language, (redaction filter)       | split          |
//! | `DetectPiiEntities`      | text, language, (redaction filter)       | split          |
//! | `DetectKeyPhrases`       | text, language                           | split          |
//! | `TranslateText`          | text, source, target, (terminology)      | split          |

use serde::Serialize;

use crate::{DetectedLanguage, Error, KeyPhrase, Result, Sentiment, Span};

/// How much of a detection result to return per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detail {
    /// The headline value only: top language code, sentiment label, phrase texts.
    #[default]
    Summary,
    /// Everything the capability reported, scores and offsets included.
    Full,
}

/// What entity and PII detection return per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanOutput<'a> {
    /// `(type, value)` pairs extracted from the row text.
    Values,
    /// The spans with offsets into the row text.
    Full,
    /// The row text with the types named by each row's filter redacted.
    ///
    /// One filter per row, e.g. `"NAME, ADDRESS"` or `"ALL"`.
    Redact(&'a [String]),
}

/// A row-analytics operation and its argument columns.
///
/// Every column is parallel to the text column passed to
/// [`RowAnalytics::run`](crate::RowAnalytics::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    /// Most likely language of each row.
    DetectDominantLanguage {
        /// Summary: language code. Full: all candidates with scores.
        detail: Detail,
    },
    /// Sentiment of each row.
    DetectSentiment {
        /// Language code per row.
        languages: &'a [String],
        /// Summary: sentiment label. Full: label and scores.
        detail: Detail,
    },
    /// Named entities in each row.
    DetectEntities {
        /// Language code per row.
        languages: &'a [String],
        /// Output shape.
        output: SpanOutput<'a>,
    },
    /// PII entities in each row.
    DetectPiiEntities {
        /// Language code per row.
        languages: &'a [String],
        /// Output shape.
        output: SpanOutput<'a>,
    },
    /// Key phrases in each row.
    DetectKeyPhrases {
        /// Language code per row.
        languages: &'a [String],
        /// Summary: phrase texts. Full: phrases with offsets.
        detail: Detail,
    },
    /// Translation of each row.
    TranslateText {
        /// Source language per row (`auto` lets the service detect it).
        source_languages: &'a [String],
        /// Target language per row.
        target_languages: &'a [String],
        /// Custom terminology name per row; `"null"` or empty means none.
        terminologies: Option<&'a [String]>,
    },
}

impl Operation<'_> {
    /// Operation name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DetectDominantLanguage { .. } => "detect_dominant_language",
            Self::DetectSentiment { .. } => "detect_sentiment",
            Self::DetectEntities { .. } => "detect_entities",
            Self::DetectPiiEntities { .. } => "detect_pii_entities",
            Self::DetectKeyPhrases { .. } => "detect_key_phrases",
            Self::TranslateText { .. } => "translate_text",
        }
    }

    /// Check every argument column against the row count.
    pub(crate) fn check_columns(&self, rows: usize) -> Result<()> {
        let check = |column: &'static str, values: &[String]| {
            if values.len() == rows {
                Ok(())
            } else {
                Err(Error::ColumnLength {
                    column,
                    expected: rows,
                    actual: values.len(),
                })
            }
        };

        match self {
            Self::DetectDominantLanguage { .. } => Ok(()),
            Self::DetectSentiment { languages, .. } | Self::DetectKeyPhrases { languages, .. } => {
                check("language", languages)
            }
            Self::DetectEntities { languages, output }
            | Self::DetectPiiEntities { languages, output } => {
                check("language", languages)?;
                match output {
                    SpanOutput::Redact(filters) => check("redact_types", filters),
                    SpanOutput::Values | SpanOutput::Full => Ok(()),
                }
            }
            Self::TranslateText {
                source_languages,
                target_languages,
                terminologies,
            } => {
                check("source_language", source_languages)?;
                check("target_language", target_languages)?;
                terminologies.map_or(Ok(()), |names| check("terminology", names))
            }
        }
    }
}

/// Terminology name to pass to the translator, if any.
pub(crate) fn terminology_name(name: &str) -> Option<&str> {
    let name = name.trim();
    if name.is_empty() || name.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(name)
    }
}

/// The result for one input row.
///
/// Serializes to the interchange shape the host expects: plain values as
/// strings, structured results as JSON arrays and objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RowOutput {
    /// A plain value: language code, sentiment label, redacted or translated text.
    Text(String),
    /// Candidate languages with scores.
    Languages(Vec<DetectedLanguage>),
    /// Sentiment label with scores.
    Sentiment(Sentiment),
    /// Spans with offsets into the row text.
    Spans(Vec<Span>),
    /// `(type, value)` pairs.
    TypedValues(Vec<(String, String)>),
    /// Key phrases with offsets into the row text.
    KeyPhrases(Vec<KeyPhrase>),
    /// Key phrase texts.
    Phrases(Vec<String>),
}

impl RowOutput {
    /// The plain value, if this is a [`RowOutput::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Serialize to JSON. Plain values become JSON strings.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Render as a single column value.
    ///
    /// Plain values are returned as-is; everything else as compact JSON.
    ///
    /// ```rust
    /// use rowbatch::RowOutput;
    ///
    /// assert_eq!(RowOutput::Text("en".into()).render().unwrap(), "en");
    ///
    /// let values = RowOutput::TypedValues(vec![("PERSON".into(), "Bob".into())]);
    /// assert_eq!(values.render().unwrap(), r#"[["PERSON","Bob"]]"#);
    /// ```
    pub fn render(&self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            other => other.to_json(),
        }
    }
}
