pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod token_list;
pub mod types;

pub use alignment::engine::align_sentence;
pub use alignment::pauses::insert_pause_tags;
pub use alignment::prenorm_diff::{extract_prenorm_pairs, extract_prenorm_pairs_from_text};
pub use config::{LexiconResources, NormalizerConfig, PunctuationMode, SentenceErrorPolicy};
pub use error::AlignmentError;
pub use pipeline::builder::TextNormalizerBuilder;
pub use pipeline::runtime::TextNormalizer;
pub use pipeline::traits::{Normalizer, PauseInserter, TokenAligner};
pub use types::{
    AlignedSentence, AlignmentWarning, NormTuple, NormalizedSegment, NormalizerOutput,
    PipelineItem, PrenormOutput, PrenormPair, Span, TagToken, Token,
};
