use serde::Serialize;

use crate::error::AlignmentError;
use crate::types::{AlignedSentence, AlignmentWarning, NormTuple, PipelineItem};

pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub sentences: Vec<SentenceReport>,
    pub aggregates: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub pause_tag: String,
    pub sentence_tag: String,
    pub case_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentenceReport {
    pub id: String,
    pub token_count: u32,
    pub deleted_token_count: u32,
    pub tag_count: u32,
    pub segment_count: u32,
    pub normalized_word_count: u32,
    /// Source indices of non-deleted tokens that received no segment.
    pub uncovered_tokens: Vec<usize>,
    /// Segment texts (tags left out) spell the normalizer's output words.
    pub round_trip_ok: bool,
    pub warnings: Vec<AlignmentWarning>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateReport {
    pub total: u32,
    pub round_trip_failures: u32,
    pub with_uncovered_tokens: u32,
    pub with_warnings: u32,
    pub tokens: u32,
    pub segments: u32,
    pub segments_per_token: f32,
}

impl Report {
    pub fn to_json_pretty(&self) -> Result<String, AlignmentError> {
        serde_json::to_string_pretty(self).map_err(|e| AlignmentError::json("serialize report", e))
    }
}

pub fn build_report(
    sentences: Vec<SentenceReport>,
    pause_tag: &str,
    sentence_tag: &str,
) -> Report {
    let aggregates = aggregate_reports(&sentences);
    Report {
        schema_version: REPORT_SCHEMA_VERSION,
        meta: Meta {
            generated_at: chrono::Utc::now().to_rfc3339(),
            pause_tag: pause_tag.to_string(),
            sentence_tag: sentence_tag.to_string(),
            case_count: sentences.len(),
        },
        sentences,
        aggregates,
    }
}

pub fn compute_sentence_report(
    id: &str,
    aligned: &AlignedSentence,
    final_tuples: &[NormTuple],
) -> SentenceReport {
    let mut token_count = 0usize;
    let mut deleted_token_count = 0usize;
    let mut tag_count = 0usize;
    let mut segment_count = 0usize;
    let mut uncovered_tokens = Vec::new();

    for item in &aligned.items {
        match item {
            PipelineItem::Tag(_) => tag_count += 1,
            PipelineItem::Token(token) => {
                token_count += 1;
                segment_count += token.normalized.len();
                if token.is_deleted() {
                    deleted_token_count += 1;
                } else if token.normalized.is_empty() {
                    uncovered_tokens.push(token.source_index);
                }
            }
        }
    }

    let normalized_words: Vec<&str> = final_tuples
        .iter()
        .flat_map(|tuple| tuple.processed.split_whitespace())
        .filter(|word| !word.starts_with('<'))
        .collect();
    let expected = normalized_words.concat();
    let observed = segment_text(&aligned.items);
    let round_trip_ok = expected == observed;

    let mut notes = Vec::new();
    if !round_trip_ok {
        notes.push(format!("round_trip_mismatch:expected='{expected}' observed='{observed}'"));
    }
    if !uncovered_tokens.is_empty() {
        notes.push(format!("uncovered_tokens={}", uncovered_tokens.len()));
    }

    SentenceReport {
        id: id.to_string(),
        token_count: to_u32(token_count),
        deleted_token_count: to_u32(deleted_token_count),
        tag_count: to_u32(tag_count),
        segment_count: to_u32(segment_count),
        normalized_word_count: to_u32(normalized_words.len()),
        uncovered_tokens,
        round_trip_ok,
        warnings: aligned.warnings.clone(),
        notes,
    }
}

pub fn aggregate_reports(sentences: &[SentenceReport]) -> AggregateReport {
    let tokens: u32 = sentences
        .iter()
        .map(|s| s.token_count - s.deleted_token_count)
        .sum();
    let segments: u32 = sentences.iter().map(|s| s.segment_count).sum();
    AggregateReport {
        total: to_u32(sentences.len()),
        round_trip_failures: count(sentences, |s| !s.round_trip_ok),
        with_uncovered_tokens: count(sentences, |s| !s.uncovered_tokens.is_empty()),
        with_warnings: count(sentences, |s| !s.warnings.is_empty()),
        tokens,
        segments,
        segments_per_token: if tokens == 0 {
            0.0
        } else {
            segments as f32 / tokens as f32
        },
    }
}

/// Concatenated segment texts with whitespace and embedded tags removed.
fn segment_text(items: &[PipelineItem]) -> String {
    items
        .iter()
        .filter_map(PipelineItem::as_token)
        .flat_map(|token| token.normalized.iter())
        .filter(|segment| !segment.is_tag())
        .flat_map(|segment| segment.text.split_whitespace())
        .collect()
}

fn count(sentences: &[SentenceReport], pred: impl Fn(&SentenceReport) -> bool) -> u32 {
    to_u32(sentences.iter().filter(|s| pred(s)).count())
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
