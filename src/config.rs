use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;

/// What the pause pass does with a punctuation segment once its tag is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunctuationMode {
    /// Drop the segment from the token; the tag stands in for it.
    #[default]
    Replace,
    /// Leave the segment on the token next to the emitted tag.
    Keep,
}

/// What the pipeline does when one sentence fails to align.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceErrorPolicy {
    #[default]
    Fail,
    /// Pass the sentence through un-normalized and record a warning.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub pause_tag: String,
    pub sentence_tag: String,
    /// Part-of-speech codes treated as pause-bearing punctuation.
    pub pause_pos: Vec<String>,
    /// A token with this surface has every segment treated as punctuation.
    pub slash_surface: String,
    /// Trailing characters split off normalized words into their own segment.
    pub split_punctuation: Vec<char>,
    pub punctuation_mode: PunctuationMode,
    pub sentence_error_policy: SentenceErrorPolicy,
    pub worker_threads: usize,
}

impl NormalizerConfig {
    pub const DEFAULT_PAUSE_TAG: &'static str = "<sil>";
    pub const DEFAULT_SENTENCE_TAG: &'static str = "<sentence>";
    pub const FULL_STOP: &'static str = ".";

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read normalizer config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| AlignmentError::json("parse normalizer config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        if self.pause_tag.is_empty() || self.sentence_tag.is_empty() {
            return Err(AlignmentError::invalid_input(
                "pause_tag and sentence_tag must not be empty",
            ));
        }
        if self.pause_tag == self.sentence_tag {
            return Err(AlignmentError::invalid_input(format!(
                "pause_tag and sentence_tag must differ (both '{}')",
                self.pause_tag
            )));
        }
        Ok(())
    }

    pub(crate) fn is_pause_pos(&self, pos: &str) -> bool {
        self.pause_pos.iter().any(|p| p == pos)
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            pause_tag: Self::DEFAULT_PAUSE_TAG.to_string(),
            sentence_tag: Self::DEFAULT_SENTENCE_TAG.to_string(),
            pause_pos: [".", ",", "pg", "pa", "pl"]
                .into_iter()
                .map(String::from)
                .collect(),
            slash_surface: "/".to_string(),
            split_punctuation: vec![',', '.'],
            punctuation_mode: PunctuationMode::Replace,
            sentence_error_policy: SentenceErrorPolicy::Fail,
            worker_threads: 1,
        }
    }
}

/// Read-only lexical resources handed to the normalizer on every call.
/// The alignment core never looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexiconResources {
    pub abbreviations: HashSet<String>,
    pub nonending_abbreviations: HashSet<String>,
    pub pronunciations: HashMap<String, String>,
}

impl LexiconResources {
    pub fn load(
        abbreviation_files: &[&Path],
        nonending_files: &[&Path],
        pron_dict: Option<&Path>,
    ) -> Result<Self, AlignmentError> {
        Ok(Self {
            abbreviations: read_lines(abbreviation_files)?,
            nonending_abbreviations: read_lines(nonending_files)?,
            pronunciations: match pron_dict {
                Some(path) => read_dict(path)?,
                None => HashMap::new(),
            },
        })
    }

    pub fn is_empty(&self) -> bool {
        self.abbreviations.is_empty()
            && self.nonending_abbreviations.is_empty()
            && self.pronunciations.is_empty()
    }
}

fn read_lines(paths: &[&Path]) -> Result<HashSet<String>, AlignmentError> {
    let mut out = HashSet::new();
    for path in paths {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read abbreviation list", e))?;
        out.extend(
            data.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        );
    }
    Ok(out)
}

fn read_dict(path: &Path) -> Result<HashMap<String, String>, AlignmentError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| AlignmentError::io("read pronunciation dictionary", e))?;
    let mut out = HashMap::new();
    for (line_no, line) in data.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let mut cols = line.split('\t');
        match (cols.next(), cols.next(), cols.next()) {
            (Some(word), Some(pron), None) => {
                out.insert(word.to_string(), pron.to_string());
            }
            _ => tracing::warn!(
                path = %path.display(),
                line = line_no + 1,
                "pronunciation dictionary line is not two tab-separated columns; skipped"
            ),
        }
    }
    Ok(out)
}
