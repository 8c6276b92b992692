use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{context}: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    /// A cursor or index ran past the end of a sequence while the other side still had
    /// content, or a node was consumed twice / never. The three sequences no longer
    /// describe the same text.
    #[error("desynchronized at token {source_index:?}: {message}")]
    Desynchronization {
        source_index: Option<usize>,
        message: String,
    },
    #[error("unmatched expansion: '{original}' expanded to '{expanded}', found '{found}'")]
    UnmatchedExpansion {
        original: String,
        expanded: String,
        found: String,
    },
    #[error("sentence {index} aborted: {source}")]
    Sentence {
        index: usize,
        #[source]
        source: Box<AlignmentError>,
    },
}

impl AlignmentError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn desync(source_index: Option<usize>, message: impl Into<String>) -> Self {
        Self::Desynchronization {
            source_index,
            message: message.into(),
        }
    }

    pub(crate) fn unmatched(
        original: impl Into<String>,
        expanded: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnmatchedExpansion {
            original: original.into(),
            expanded: expanded.into(),
            found: found.into(),
        }
    }

    pub(crate) fn in_sentence(self, index: usize) -> Self {
        match self {
            already @ Self::Sentence { .. } => already,
            other => Self::Sentence {
                index,
                source: Box::new(other),
            },
        }
    }

    /// True for `Desynchronization`, also when wrapped in `Sentence`.
    pub fn is_desynchronization(&self) -> bool {
        match self {
            Self::Desynchronization { .. } => true,
            Self::Sentence { source, .. } => source.is_desynchronization(),
            _ => false,
        }
    }

    /// True for `UnmatchedExpansion`, also when wrapped in `Sentence`.
    pub fn is_unmatched_expansion(&self) -> bool {
        match self {
            Self::UnmatchedExpansion { .. } => true,
            Self::Sentence { source, .. } => source.is_unmatched_expansion(),
            _ => false,
        }
    }
}
