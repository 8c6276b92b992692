use crate::config::{LexiconResources, NormalizerConfig};
use crate::error::AlignmentError;
use crate::types::{AlignedSentence, NormTuple, NormalizerOutput, PipelineItem, PrenormPair};

/// The linguistic normalizer: abbreviation expansion followed by number expansion and
/// part-of-speech tagging. Called once per sentence with the space-joined tokenized text.
pub trait Normalizer: Send + Sync {
    fn normalize(
        &self,
        sentence: &str,
        resources: &LexiconResources,
    ) -> Result<NormalizerOutput, AlignmentError>;
}

pub trait TokenAligner: Send + Sync {
    fn align(
        &self,
        items: &[PipelineItem],
        prenorm: &[PrenormPair],
        final_tuples: &[NormTuple],
        config: &NormalizerConfig,
    ) -> Result<AlignedSentence, AlignmentError>;
}

pub trait PauseInserter: Send + Sync {
    fn insert_pauses(&self, items: &[PipelineItem], config: &NormalizerConfig) -> Vec<PipelineItem>;
}
