//! The remote text-analytics capability, seen from the planner's side.
//!
//! The service itself (language detection, sentiment, entity and PII
//! detection, key phrases, translation) lives elsewhere. This crate only
//! needs the shape of its answers. A client adapter implements
//! [`TextAnalytics`] and is handed to [`RowAnalytics`](crate::RowAnalytics)
//! already constructed; retries, backoff and timeouts are its business.
//!
//! ## Offsets
//!
//! Every offset returned through this trait is a UTF-8 byte offset into the
//! text that was submitted. Adapters for services that count characters or
//! UTF-16 code units convert before returning.

use serde::{Deserialize, Serialize};

use crate::merge::Shift;

/// Error produced by a capability adapter.
pub type CapabilityError = Box<dyn std::error::Error + Send + Sync>;

/// A typed annotation over a text: `text[begin..end]` is a `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Type label, e.g. `NAME` or `LOCATION`.
    #[serde(rename = "type")]
    pub label: String,
    /// Byte offset of the first byte.
    #[serde(rename = "beginOffset")]
    pub begin: usize,
    /// Byte offset one past the last byte.
    #[serde(rename = "endOffset")]
    pub end: usize,
    /// Confidence reported by the capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Span {
    /// Create a span without a score.
    #[must_use]
    pub fn new(label: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            label: label.into(),
            begin,
            end,
            score: None,
        }
    }

    /// Attach a confidence score.
    #[must_use]
    pub fn with_score(self, score: f32) -> Self {
        Self {
            score: Some(score),
            ..self
        }
    }
}

impl Shift for Span {
    fn shift(&mut self, by: usize) {
        self.begin += by;
        self.end += by;
    }
}

/// A key phrase and where it occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPhrase {
    /// The phrase as it appears in the text.
    pub text: String,
    /// Byte offset of the first byte.
    #[serde(rename = "beginOffset")]
    pub begin: usize,
    /// Byte offset one past the last byte.
    #[serde(rename = "endOffset")]
    pub end: usize,
    /// Confidence reported by the capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl KeyPhrase {
    /// Create a key phrase without a score.
    #[must_use]
    pub fn new(text: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            begin,
            end,
            score: None,
        }
    }
}

impl Shift for KeyPhrase {
    fn shift(&mut self, by: usize) {
        self.begin += by;
        self.end += by;
    }
}

/// One candidate language for a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedLanguage {
    /// Language code, e.g. `en`.
    pub language_code: String,
    /// Confidence.
    pub score: f32,
}

/// Per-class sentiment confidences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentScore {
    /// Positive.
    pub positive: f32,
    /// Negative.
    pub negative: f32,
    /// Neutral.
    pub neutral: f32,
    /// Mixed.
    pub mixed: f32,
}

/// Sentiment of one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentiment {
    /// Dominant sentiment label, e.g. `POSITIVE`.
    pub sentiment: String,
    /// Confidence per class.
    pub sentiment_score: SentimentScore,
}

/// An item-level failure inside an otherwise answered batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemError {
    /// Position of the failed text in the request.
    pub index: usize,
    /// Service error code.
    pub error_code: String,
    /// Service error message.
    pub error_message: String,
}

/// Answer to a batch request: results in request order plus item errors.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse<T> {
    /// One result per successfully processed text, in request order.
    pub results: Vec<T>,
    /// Item-level failures. Non-empty means the batch failed.
    pub errors: Vec<BatchItemError>,
}

impl<T> BatchResponse<T> {
    /// A response with no item errors.
    #[must_use]
    pub fn ok(results: Vec<T>) -> Self {
        Self {
            results,
            errors: Vec::new(),
        }
    }
}

/// The operations the row pipeline needs from the remote service.
///
/// Batch methods receive at most `max_batch_size` texts, each within
/// `max_text_bytes`, and return results parallel to `texts`.
pub trait TextAnalytics: Send + Sync {
    /// Candidate languages for each text, most confident first.
    fn detect_dominant_language(
        &self,
        texts: &[&str],
    ) -> Result<BatchResponse<Vec<DetectedLanguage>>, CapabilityError>;

    /// Sentiment of each text.
    fn detect_sentiment(
        &self,
        texts: &[&str],
        language: &str,
    ) -> Result<BatchResponse<Sentiment>, CapabilityError>;

    /// Named entities in each text, in text order.
    fn detect_entities(
        &self,
        texts: &[&str],
        language: &str,
    ) -> Result<BatchResponse<Vec<Span>>, CapabilityError>;

    /// PII entities in one text, in text order.
    ///
    /// The service has no multi-document form for PII, so this is called once
    /// per item.
    fn detect_pii_entities(&self, text: &str, language: &str) -> Result<Vec<Span>, CapabilityError>;

    /// Key phrases in each text, in text order.
    fn detect_key_phrases(
        &self,
        texts: &[&str],
        language: &str,
    ) -> Result<BatchResponse<Vec<KeyPhrase>>, CapabilityError>;

    /// Translate one text.
    fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        terminology: Option<&str>,
    ) -> Result<String, CapabilityError>;
}
