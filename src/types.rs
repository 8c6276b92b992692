use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;

/// Part-of-speech marker for a segment that holds an embedded tag such as `<sil>`.
pub const TAG_POS: &str = "TAG";

/// Half-open character span `[start, end)` into the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// One spoken-form piece of a token. Equality is structural over `(text, pos)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedSegment {
    pub text: String,
    pub pos: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub spell_corrected: bool,
}

impl NormalizedSegment {
    pub fn new(text: impl Into<String>, pos: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pos: pos.into(),
            spell_corrected: false,
        }
    }

    pub fn is_tag(&self) -> bool {
        self.pos == TAG_POS
    }
}

impl PartialEq for NormalizedSegment {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.pos == other.pos
    }
}

impl Eq for NormalizedSegment {}

impl fmt::Display for NormalizedSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.text, self.pos)
    }
}

/// An original input token and everything later stages learned about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub surface: String,
    pub source_index: usize,
    pub span: Span,
    /// Sub-word pieces from the tokenizer. Empty means the token was deleted during
    /// cleaning and must be carried through verbatim.
    pub tokenized: Vec<String>,
    pub normalized: Vec<NormalizedSegment>,
    #[serde(default)]
    pub transcription: Vec<String>,
}

impl Token {
    pub fn new(surface: impl Into<String>, source_index: usize, span: Span) -> Self {
        let surface = surface.into();
        Self {
            tokenized: vec![surface.clone()],
            surface,
            source_index,
            span,
            normalized: Vec::new(),
            transcription: Vec::new(),
        }
    }

    /// A token the cleaner removed: it keeps its place but is never normalized.
    pub fn deleted(surface: impl Into<String>, source_index: usize, span: Span) -> Self {
        Self {
            tokenized: Vec::new(),
            ..Self::new(surface, source_index, span)
        }
    }

    pub fn with_tokenized<I, S>(mut self, pieces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokenized = pieces.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.tokenized.is_empty()
    }

    /// Tokenized pieces joined by a single space, the form the normalizer keys on.
    pub fn joined_tokenized(&self) -> String {
        self.tokenized.join(" ")
    }

    pub fn set_transcribed(&mut self, transcription: Vec<String>) {
        self.transcription = transcription;
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token: {}, index: {}, span: {} - {}, tokenized: [{}], normalized: [",
            self.surface,
            self.source_index,
            self.span.start,
            self.span.end,
            self.tokenized.join(", ")
        )?;
        for (i, seg) in self.normalized.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{seg}")?;
        }
        f.write_str("]")?;
        if !self.transcription.is_empty() {
            write!(f, ", transcribed: [{}]", self.transcription.join(", "))?;
        }
        Ok(())
    }
}

/// A non-text marker: sentence boundary, pause, or one end of a language-switch range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagToken {
    pub name: String,
    pub source_index: usize,
    #[serde(default)]
    pub is_range_start: bool,
    #[serde(default)]
    pub is_range_end: bool,
}

impl TagToken {
    pub fn new(name: impl Into<String>, source_index: usize) -> Self {
        Self {
            name: name.into(),
            source_index,
            is_range_start: false,
            is_range_end: false,
        }
    }

    pub fn range_start(name: impl Into<String>, source_index: usize) -> Self {
        Self {
            is_range_start: true,
            ..Self::new(name, source_index)
        }
    }

    pub fn range_end(name: impl Into<String>, source_index: usize) -> Self {
        Self {
            is_range_end: true,
            ..Self::new(name, source_index)
        }
    }
}

impl fmt::Display for TagToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagToken: tag: {}, index: {}", self.name, self.source_index)
    }
}

/// Element of every token stream in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineItem {
    Token(Token),
    Tag(TagToken),
}

impl PipelineItem {
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            Self::Tag(_) => None,
        }
    }

    pub fn as_tag(&self) -> Option<&TagToken> {
        match self {
            Self::Tag(tag) => Some(tag),
            Self::Token(_) => None,
        }
    }

    pub fn is_tag_named(&self, name: &str) -> bool {
        self.as_tag().is_some_and(|tag| tag.name == name)
    }

    pub fn source_index(&self) -> usize {
        match self {
            Self::Token(token) => token.source_index,
            Self::Tag(tag) => tag.source_index,
        }
    }

    pub fn to_json(&self) -> Result<String, AlignmentError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AlignmentError::json("serialize pipeline item", e))
    }
}

impl From<Token> for PipelineItem {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

impl From<TagToken> for PipelineItem {
    fn from(tag: TagToken) -> Self {
        Self::Tag(tag)
    }
}

impl fmt::Display for PipelineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => token.fmt(f),
            Self::Tag(tag) => tag.fmt(f),
        }
    }
}

/// One entry of the abbreviation-expansion output: original word(s) and their expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrenormPair {
    pub original: String,
    pub expanded: String,
}

impl PrenormPair {
    pub fn new(original: impl Into<String>, expanded: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            expanded: expanded.into(),
        }
    }
}

/// One entry of the final normalization output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormTuple {
    pub original: String,
    pub processed: String,
    pub pos: String,
}

impl NormTuple {
    pub fn new(
        original: impl Into<String>,
        processed: impl Into<String>,
        pos: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            processed: processed.into(),
            pos: pos.into(),
        }
    }
}

/// Abbreviation-expansion result as delivered by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrenormOutput {
    /// Already paired `(original, expanded)` entries.
    Pairs(Vec<PrenormPair>),
    /// The expanded sentence text; pairs are recovered by diffing against the input.
    Expanded(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerOutput {
    pub prenorm: PrenormOutput,
    pub final_tuples: Vec<NormTuple>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlignmentWarning {
    /// A normalized text produced no segment at all.
    EmptySegment { source_index: usize, text: String },
    /// A sentence failed and was passed through un-normalized.
    SkippedSentence { sentence_index: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedSentence {
    pub items: Vec<PipelineItem>,
    pub warnings: Vec<AlignmentWarning>,
}
