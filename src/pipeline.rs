//! The row-analytics pipeline.
//!
//! [`RowAnalytics::run`] takes a column of row texts and an [`Operation`],
//! and returns exactly one [`RowOutput`] per row, in row order.
//!
//! ```text
//! rows ──> BatchPlanner ──> [MultiRow | TextSplit]...
//!                                │           │
//!                                │           └─ chunks ─> count-only planner ─> calls
//!                                │                                                │
//!                                │                        merge (offset table) <──┘
//!                                ▼                                │
//!                          one call per batch                     │
//!                                │                                │
//!                                └──────> render per row <────────┘
//!                                         (values / spans / redact)
//! ```
//!
//! Batches are processed strictly in plan order, one capability call at a
//! time. Any item-level error reported for a batch fails the whole run, so no
//! caller ever sees results shifted onto the wrong rows. Translation is the
//! exception: an item that fails to translate comes back unchanged.

use tracing::{debug, warn};

use crate::capability::{BatchResponse, CapabilityError};
use crate::operation::terminology_name;
use crate::{
    extract_typed_values, merge_concatenated, merge_spans, redact, Batch, BatchPlanner,
    Detail, Error, Limits, OffsetTable, Operation, Overflow, RedactionFilter, Result, RowOutput,
    Shift, Span, SpanOutput, TextAnalytics,
};

/// Runs row-analytics operations against a [`TextAnalytics`] client.
///
/// ## Example
///
/// ```rust
/// use rowbatch::{
///     BatchResponse, CapabilityError, Detail, Operation, RowAnalytics, Sentiment, TextAnalytics,
/// };
/// # use rowbatch::{DetectedLanguage, KeyPhrase, Span};
///
/// /// Calls everything positive.
/// struct Cheerful;
///
/// impl TextAnalytics for Cheerful {
///     fn detect_sentiment(
///         &self,
///         texts: &[&str],
///         _language: &str,
///     ) -> Result<BatchResponse<Sentiment>, CapabilityError> {
///         let positive = Sentiment {
///             sentiment: "POSITIVE".into(),
///             sentiment_score: Default::default(),
///         };
///         Ok(BatchResponse::ok(vec![positive; texts.len()]))
///     }
/// #   fn detect_dominant_language(&self, _: &[&str])
/// #       -> Result<BatchResponse<Vec<DetectedLanguage>>, CapabilityError> { Err("unsupported".into()) }
/// #   fn detect_entities(&self, _: &[&str], _: &str)
/// #       -> Result<BatchResponse<Vec<Span>>, CapabilityError> { Err("unsupported".into()) }
/// #   fn detect_pii_entities(&self, _: &str, _: &str)
/// #       -> Result<Vec<Span>, CapabilityError> { Err("unsupported".into()) }
/// #   fn detect_key_phrases(&self, _: &[&str], _: &str)
/// #       -> Result<BatchResponse<Vec<KeyPhrase>>, CapabilityError> { Err("unsupported".into()) }
/// #   fn translate(&self, _: &str, _: &str, _: &str, _: Option<&str>)
/// #       -> Result<String, CapabilityError> { Err("unsupported".into()) }
/// }
///
/// let analytics = RowAnalytics::new(Cheerful);
/// let texts = vec!["I love it.".to_string(), "Terrible.".to_string()];
/// let languages = vec!["en".to_string(), "en".to_string()];
///
/// let sentiment = analytics.run(
///     &texts,
///     &Operation::DetectSentiment { languages: &languages, detail: Detail::Summary },
/// )?;
/// assert_eq!(sentiment.len(), 2);
/// assert_eq!(sentiment[1].as_text(), Some("POSITIVE"));
/// # Ok::<(), rowbatch::Error>(())
/// ```
#[derive(Debug)]
pub struct RowAnalytics<C> {
    client: C,
    limits: Limits,
}

impl<C: TextAnalytics> RowAnalytics<C> {
    /// Create a pipeline with the default limits.
    pub fn new(client: C) -> Self {
        Self::with_limits(client, Limits::default())
    }

    /// Create a pipeline with explicit limits.
    pub fn with_limits(client: C, limits: Limits) -> Self {
        Self { client, limits }
    }

    /// The limits used to plan batches.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Replace the limits. Only later runs see the change.
    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// The injected client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run `operation` over `texts`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidLimit`] if the configured limits contain a zero.
    /// - [`Error::ColumnLength`] if an argument column does not match `texts`.
    /// - [`Error::Capability`] or [`Error::BatchItemErrors`] if a detection
    ///   call fails; no partial results are returned.
    /// - [`Error::ResultCountMismatch`], [`Error::OffsetTableMismatch`] or
    ///   [`Error::RowCount`] if results cannot be lined up with rows.
    /// - [`Error::EmptyResult`] if a row asked for its dominant language gets
    ///   no candidates back.
    /// - [`Error::SpanOutOfBounds`] if the capability reports spans outside
    ///   the text they were detected in.
    pub fn run(&self, texts: &[String], operation: &Operation<'_>) -> Result<Vec<RowOutput>> {
        operation.check_columns(texts.len())?;
        let name = operation.name();

        let outputs = match *operation {
            Operation::DetectDominantLanguage { detail } => {
                self.dominant_language(name, texts, detail)?
            }
            Operation::DetectSentiment { languages, detail } => {
                self.sentiment(name, texts, languages, detail)?
            }
            Operation::DetectEntities { languages, output } => {
                let spans = self.annotate(name, texts, languages, |items, language| {
                    self.client.detect_entities(items, language)
                })?;
                render_spans(texts, spans, output)?
            }
            Operation::DetectPiiEntities { languages, output } => {
                let spans = self.annotate(name, texts, languages, |items, language| {
                    items
                        .iter()
                        .map(|text| self.client.detect_pii_entities(text, language))
                        .collect::<std::result::Result<Vec<_>, _>>()
                        .map(BatchResponse::ok)
                })?;
                render_spans(texts, spans, output)?
            }
            Operation::DetectKeyPhrases { languages, detail } => {
                let phrases = self.annotate(name, texts, languages, |items, language| {
                    self.client.detect_key_phrases(items, language)
                })?;
                phrases
                    .into_iter()
                    .map(|phrases| match detail {
                        Detail::Summary => {
                            RowOutput::Phrases(phrases.into_iter().map(|p| p.text).collect())
                        }
                        Detail::Full => RowOutput::KeyPhrases(phrases),
                    })
                    .collect()
            }
            Operation::TranslateText {
                source_languages,
                target_languages,
                terminologies,
            } => self.translate(
                name,
                texts,
                &TranslationColumns {
                    sources: source_languages,
                    targets: target_languages,
                    terminologies,
                },
            )?,
        };

        if outputs.len() != texts.len() {
            return Err(Error::RowCount {
                operation: name,
                expected: texts.len(),
                actual: outputs.len(),
            });
        }
        Ok(outputs)
    }

    fn dominant_language(
        &self,
        operation: &'static str,
        texts: &[String],
        detail: Detail,
    ) -> Result<Vec<RowOutput>> {
        let planner = BatchPlanner::new(self.limits)?.overflow(Overflow::Truncate);
        let mut outputs = Vec::with_capacity(texts.len());

        for (index, batch) in planner.plan(texts).iter().enumerate() {
            let detect = |items: &[&str], _: &str| self.client.detect_dominant_language(items);
            let results = call_batch(operation, index, batch, "", &detect)?;
            for (item, languages) in results.into_iter().enumerate() {
                outputs.push(match detail {
                    Detail::Summary => {
                        let top = languages.into_iter().next().ok_or(Error::EmptyResult {
                            operation,
                            batch: index,
                            item,
                        })?;
                        RowOutput::Text(top.language_code)
                    }
                    Detail::Full => RowOutput::Languages(languages),
                });
            }
        }
        Ok(outputs)
    }

    fn sentiment(
        &self,
        operation: &'static str,
        texts: &[String],
        languages: &[String],
        detail: Detail,
    ) -> Result<Vec<RowOutput>> {
        let planner = BatchPlanner::new(self.limits)?
            .overflow(Overflow::Truncate)
            .group_by_language(true);
        let mut outputs = Vec::with_capacity(texts.len());

        for (index, batch) in planner.plan_with_languages(texts, languages)?.iter().enumerate() {
            let language = batch.language().unwrap_or_default();
            let detect = |items: &[&str], language: &str| self.client.detect_sentiment(items, language);
            for sentiment in call_batch(operation, index, batch, language, &detect)? {
                outputs.push(match detail {
                    Detail::Summary => RowOutput::Text(sentiment.sentiment),
                    Detail::Full => RowOutput::Sentiment(sentiment),
                });
            }
        }
        Ok(outputs)
    }

    /// Per-row annotation lists, offsets relative to each full row text.
    ///
    /// Oversized rows are split, their chunks re-batched by count and
    /// answered, and the chunk results merged back through the offset table.
    fn annotate<T, F>(
        &self,
        operation: &'static str,
        texts: &[String],
        languages: &[String],
        detect: F,
    ) -> Result<Vec<Vec<T>>>
    where
        T: Shift,
        F: Fn(&[&str], &str) -> std::result::Result<BatchResponse<Vec<T>>, CapabilityError>,
    {
        let planner = BatchPlanner::new(self.limits)?.group_by_language(true);
        let mut rows = Vec::with_capacity(texts.len());

        for (index, batch) in planner.plan_with_languages(texts, languages)?.iter().enumerate() {
            let language = batch.language().unwrap_or_default();
            match batch {
                Batch::MultiRow { .. } => {
                    rows.extend(call_batch(operation, index, batch, language, &detect)?);
                }
                Batch::TextSplit { chunks, .. } => {
                    let offsets = OffsetTable::from_chunks(chunks);
                    let chunk_texts = batch.texts();
                    let mut per_chunk = Vec::with_capacity(chunks.len());
                    let sub_planner = BatchPlanner::count_only(self.limits)?;
                    for sub_batch in sub_planner.plan(&chunk_texts) {
                        per_chunk.extend(call_batch(
                            operation, index, &sub_batch, language, &detect,
                        )?);
                    }
                    rows.push(merge_spans(per_chunk, &offsets)?);
                }
            }
        }
        Ok(rows)
    }

    fn translate(
        &self,
        operation: &'static str,
        texts: &[String],
        columns: &TranslationColumns<'_>,
    ) -> Result<Vec<RowOutput>> {
        let planner = BatchPlanner::new(self.limits)?;
        let mut outputs = Vec::with_capacity(texts.len());

        for (index, batch) in planner.plan(texts).iter().enumerate() {
            debug!(
                operation,
                batch = index,
                kind = %batch.kind(),
                items = batch.len(),
                "translating batch"
            );
            match batch {
                Batch::MultiRow {
                    first_row, texts, ..
                } => {
                    for (row, text) in (*first_row..).zip(texts) {
                        outputs.push(RowOutput::Text(self.translate_or_keep(text, row, columns)));
                    }
                }
                Batch::TextSplit { row, chunks, .. } => {
                    let parts: Vec<String> = chunks
                        .iter()
                        .map(|chunk| self.translate_or_keep(&chunk.text, *row, columns))
                        .collect();
                    outputs.push(RowOutput::Text(merge_concatenated(&parts)));
                }
            }
        }
        Ok(outputs)
    }

    fn translate_or_keep(&self, text: &str, row: usize, columns: &TranslationColumns<'_>) -> String {
        let source = columns.sources[row].as_str();
        let target = columns.targets[row].as_str();
        match self
            .client
            .translate(text, source, target, columns.terminology(row))
        {
            Ok(translated) => translated,
            Err(error) => {
                warn!(
                    row,
                    source_language = source,
                    target_language = target,
                    %error,
                    "translation failed; keeping original text"
                );
                text.to_owned()
            }
        }
    }
}

/// Per-row translation arguments.
struct TranslationColumns<'a> {
    sources: &'a [String],
    targets: &'a [String],
    terminologies: Option<&'a [String]>,
}

impl TranslationColumns<'_> {
    fn terminology(&self, row: usize) -> Option<&str> {
        self.terminologies
            .and_then(|names| names.get(row))
            .and_then(|name| terminology_name(name))
    }
}

/// Send one planned batch and check the answer lines up with it.
fn call_batch<T, F>(
    operation: &'static str,
    index: usize,
    batch: &Batch,
    language: &str,
    detect: &F,
) -> Result<Vec<T>>
where
    F: Fn(&[&str], &str) -> std::result::Result<BatchResponse<T>, CapabilityError>,
{
    let items = batch.texts();
    debug!(
        operation,
        batch = index,
        kind = %batch.kind(),
        language,
        items = items.len(),
        "calling text analytics"
    );

    let response = detect(&items, language).map_err(|source| Error::Capability {
        operation,
        batch: index,
        source,
    })?;
    checked(operation, index, items.len(), response)
}

fn checked<T>(
    operation: &'static str,
    batch: usize,
    expected: usize,
    response: BatchResponse<T>,
) -> Result<Vec<T>> {
    if !response.errors.is_empty() {
        return Err(Error::BatchItemErrors {
            operation,
            batch,
            errors: response.errors,
        });
    }
    if response.results.len() != expected {
        return Err(Error::ResultCountMismatch {
            operation,
            batch,
            expected,
            actual: response.results.len(),
        });
    }
    Ok(response.results)
}

fn render_spans(
    texts: &[String],
    spans: Vec<Vec<Span>>,
    output: SpanOutput<'_>,
) -> Result<Vec<RowOutput>> {
    texts
        .iter()
        .zip(spans)
        .enumerate()
        .map(|(row, (text, spans))| {
            Ok(match output {
                SpanOutput::Values => RowOutput::TypedValues(extract_typed_values(text, &spans)?),
                SpanOutput::Full => RowOutput::Spans(spans),
                SpanOutput::Redact(filters) => {
                    let filter = RedactionFilter::parse(&filters[row]);
                    RowOutput::Text(redact(text, &spans, &filter)?)
                }
            })
        })
        .collect()
}
