use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::alignment::engine::align_sentence;
use crate::alignment::pauses::insert_pause_tags;
use crate::config::{LexiconResources, NormalizerConfig};
use crate::error::AlignmentError;
use crate::pipeline::traits::{Normalizer, PauseInserter, TokenAligner};
use crate::types::{
    AlignedSentence, NormTuple, NormalizerOutput, PipelineItem, PrenormOutput, PrenormPair,
};

/// Leaves every word as it is. Punctuation words are tagged with themselves, anything
/// else with [`IdentityNormalizer::WORD_POS`].
pub struct IdentityNormalizer;

impl IdentityNormalizer {
    pub const WORD_POS: &'static str = "x";
}

impl Normalizer for IdentityNormalizer {
    fn normalize(
        &self,
        sentence: &str,
        _resources: &LexiconResources,
    ) -> Result<NormalizerOutput, AlignmentError> {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        Ok(NormalizerOutput {
            prenorm: PrenormOutput::Pairs(words.iter().map(|w| PrenormPair::new(*w, *w)).collect()),
            final_tuples: words
                .iter()
                .map(|w| {
                    let pos = if matches!(*w, "." | ",") { *w } else { Self::WORD_POS };
                    NormTuple::new(*w, *w, pos)
                })
                .collect(),
        })
    }
}

/// One recorded normalizer answer, as stored in fixture files.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedSentence {
    pub sentence: String,
    pub prenorm: PrenormOutput,
    pub final_tuples: Vec<NormTuple>,
}

/// Replays normalizer output recorded earlier, keyed by the exact sentence text.
pub struct RecordedNormalizer {
    outputs: HashMap<String, NormalizerOutput>,
}

impl RecordedNormalizer {
    pub fn new(recorded: impl IntoIterator<Item = RecordedSentence>) -> Self {
        Self {
            outputs: recorded
                .into_iter()
                .map(|row| {
                    (
                        row.sentence,
                        NormalizerOutput {
                            prenorm: row.prenorm,
                            final_tuples: row.final_tuples,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Reads a JSON array of recorded sentences.
    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read recorded normalizer output", e))?;
        let rows: Vec<RecordedSentence> = serde_json::from_str(&data)
            .map_err(|e| AlignmentError::json("parse recorded normalizer output", e))?;
        Ok(Self::new(rows))
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl Normalizer for RecordedNormalizer {
    fn normalize(
        &self,
        sentence: &str,
        _resources: &LexiconResources,
    ) -> Result<NormalizerOutput, AlignmentError> {
        self.outputs.get(sentence).cloned().ok_or_else(|| {
            AlignmentError::runtime(
                "recorded normalizer",
                format!("no recorded output for sentence '{sentence}'"),
            )
        })
    }
}

pub struct CursorTokenAligner;

impl TokenAligner for CursorTokenAligner {
    fn align(
        &self,
        items: &[PipelineItem],
        prenorm: &[PrenormPair],
        final_tuples: &[NormTuple],
        config: &NormalizerConfig,
    ) -> Result<AlignedSentence, AlignmentError> {
        align_sentence(items, prenorm, final_tuples, config)
    }
}

pub struct PunctuationPauseInserter;

impl PauseInserter for PunctuationPauseInserter {
    fn insert_pauses(
        &self,
        items: &[PipelineItem],
        config: &NormalizerConfig,
    ) -> Vec<PipelineItem> {
        insert_pause_tags(items, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_list::init_tokens;

    #[test]
    fn identity_normalizer_tags_punctuation_with_itself() {
        let out = IdentityNormalizer
            .normalize("já , nei .", &LexiconResources::default())
            .unwrap();
        let PrenormOutput::Pairs(pairs) = &out.prenorm else {
            panic!("identity normalizer should return pairs");
        };
        assert_eq!(pairs.len(), 4);
        let pos: Vec<&str> = out.final_tuples.iter().map(|t| t.pos.as_str()).collect();
        assert_eq!(pos, ["x", ",", "x", "."]);
    }

    #[test]
    fn recorded_normalizer_replays_known_sentences() {
        let json = r#"[{
            "sentence": "ca. 5",
            "prenorm": { "expanded": "sirka 5" },
            "final_tuples": [
                { "original": "sirka", "processed": "sirka", "pos": "aa" },
                { "original": "5", "processed": "fimm", "pos": "tfkfn" }
            ]
        }]"#;
        let rows: Vec<RecordedSentence> = serde_json::from_str(json).expect("valid fixture json");
        let normalizer = RecordedNormalizer::new(rows);
        assert_eq!(normalizer.len(), 1);
        let out = normalizer.normalize("ca. 5", &LexiconResources::default()).unwrap();
        assert_eq!(out.prenorm, PrenormOutput::Expanded("sirka 5".to_string()));
        let err = normalizer
            .normalize("eitthvað annað", &LexiconResources::default())
            .unwrap_err();
        assert!(matches!(err, AlignmentError::Runtime { .. }));
    }

    #[test]
    fn cursor_aligner_matches_engine() {
        let items: Vec<PipelineItem> = init_tokens("já nei").into_iter().map(Into::into).collect();
        let config = NormalizerConfig::default();
        let out = IdentityNormalizer
            .normalize("já nei", &LexiconResources::default())
            .unwrap();
        let PrenormOutput::Pairs(pairs) = out.prenorm else {
            panic!("identity normalizer should return pairs");
        };
        let aligned = CursorTokenAligner
            .align(&items, &pairs, &out.final_tuples, &config)
            .unwrap();
        let expected = align_sentence(&items, &pairs, &out.final_tuples, &config).unwrap();
        assert_eq!(aligned, expected);
    }

    #[test]
    fn punctuation_inserter_matches_pause_pass() {
        let config = NormalizerConfig::default();
        let items: Vec<PipelineItem> = init_tokens("já").into_iter().map(Into::into).collect();
        assert_eq!(
            PunctuationPauseInserter.insert_pauses(&items, &config),
            insert_pause_tags(&items, &config)
        );
    }
}
