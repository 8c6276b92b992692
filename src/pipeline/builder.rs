use std::path::Path;

use crate::config::{LexiconResources, NormalizerConfig};
use crate::error::AlignmentError;
use crate::pipeline::defaults::{CursorTokenAligner, IdentityNormalizer, PunctuationPauseInserter};
use crate::pipeline::runtime::{TextNormalizer, TextNormalizerParts};
use crate::pipeline::traits::{Normalizer, PauseInserter, TokenAligner};

pub struct TextNormalizerBuilder {
    config: NormalizerConfig,
    resources: LexiconResources,
    normalizer: Option<Box<dyn Normalizer>>,
    token_aligner: Option<Box<dyn TokenAligner>>,
    pause_inserter: Option<Box<dyn PauseInserter>>,
}

impl TextNormalizerBuilder {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            config,
            resources: LexiconResources::default(),
            normalizer: None,
            token_aligner: None,
            pause_inserter: None,
        }
    }

    pub fn from_config_file(path: &Path) -> Result<Self, AlignmentError> {
        Ok(Self::new(NormalizerConfig::load(path)?))
    }

    pub fn with_resources(mut self, resources: LexiconResources) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Box<dyn Normalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn with_token_aligner(mut self, token_aligner: Box<dyn TokenAligner>) -> Self {
        self.token_aligner = Some(token_aligner);
        self
    }

    pub fn with_pause_inserter(mut self, pause_inserter: Box<dyn PauseInserter>) -> Self {
        self.pause_inserter = Some(pause_inserter);
        self
    }

    pub fn build(self) -> Result<TextNormalizer, AlignmentError> {
        self.config.validate()?;
        if self.config.worker_threads == 0 {
            return Err(AlignmentError::invalid_input("worker_threads must be at least 1"));
        }
        if self.normalizer.is_none() {
            tracing::warn!(
                "text normalizer built without a normalizer; words pass through unchanged"
            );
        }

        tracing::info!(
            pause_tag = self.config.pause_tag.as_str(),
            sentence_tag = self.config.sentence_tag.as_str(),
            punctuation_mode = ?self.config.punctuation_mode,
            sentence_error_policy = ?self.config.sentence_error_policy,
            worker_threads = self.config.worker_threads,
            abbreviations = self.resources.abbreviations.len(),
            pronunciations = self.resources.pronunciations.len(),
            "text normalizer ready"
        );

        Ok(TextNormalizer::from_parts(TextNormalizerParts {
            config: self.config,
            resources: self.resources,
            normalizer: self
                .normalizer
                .unwrap_or_else(|| Box::new(IdentityNormalizer)),
            token_aligner: self
                .token_aligner
                .unwrap_or_else(|| Box::new(CursorTokenAligner)),
            pause_inserter: self
                .pause_inserter
                .unwrap_or_else(|| Box::new(PunctuationPauseInserter)),
        }))
    }
}
