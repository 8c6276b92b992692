use crate::alignment::prenorm_diff::extract_prenorm_pairs_from_text;
use crate::alignment::report::{build_report, compute_sentence_report, Report};
use crate::config::{LexiconResources, NormalizerConfig, SentenceErrorPolicy};
use crate::error::AlignmentError;
use crate::pipeline::traits::{Normalizer, PauseInserter, TokenAligner};
use crate::token_list::{extract_tokenized_text, split_sentences};
use crate::types::{AlignedSentence, AlignmentWarning, NormTuple, PipelineItem, PrenormOutput};

pub struct TextNormalizer {
    config: NormalizerConfig,
    resources: LexiconResources,
    normalizer: Box<dyn Normalizer>,
    token_aligner: Box<dyn TokenAligner>,
    pause_inserter: Box<dyn PauseInserter>,
}

pub(crate) struct TextNormalizerParts {
    pub config: NormalizerConfig,
    pub resources: LexiconResources,
    pub normalizer: Box<dyn Normalizer>,
    pub token_aligner: Box<dyn TokenAligner>,
    pub pause_inserter: Box<dyn PauseInserter>,
}

/// One sentence after alignment, with the normalizer tuples it was aligned against.
struct SentenceOutcome {
    aligned: AlignedSentence,
    final_tuples: Vec<NormTuple>,
}

impl TextNormalizer {
    pub(crate) fn from_parts(parts: TextNormalizerParts) -> Self {
        Self {
            config: parts.config,
            resources: parts.resources,
            normalizer: parts.normalizer,
            token_aligner: parts.token_aligner,
            pause_inserter: parts.pause_inserter,
        }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalizes a cleaned and tokenized stream: every non-deleted token gets its
    /// spoken-form segments and pause tags are inserted for punctuation.
    pub fn normalize_token_list(
        &self,
        items: &[PipelineItem],
    ) -> Result<Vec<PipelineItem>, AlignmentError> {
        let outcomes = self.align_sequential(items)?;
        Ok(self.finish(outcomes.into_iter().map(|o| o.aligned)))
    }

    /// Same result as [`Self::normalize_token_list`], with sentences aligned on up to
    /// `worker_threads` scoped threads.
    pub fn normalize_token_list_parallel(
        &self,
        items: &[PipelineItem],
    ) -> Result<Vec<PipelineItem>, AlignmentError> {
        let sentences = split_sentences(items, &self.config.sentence_tag);
        let workers = self.config.worker_threads.min(sentences.len());
        if workers <= 1 {
            return self.normalize_token_list(items);
        }

        let chunk_size = sentences.len().div_ceil(workers);
        tracing::debug!(
            sentences = sentences.len(),
            workers,
            chunk_size,
            "normalizer: aligning sentences in parallel"
        );
        let chunks: Vec<Result<Vec<SentenceOutcome>, AlignmentError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = sentences
                .chunks(chunk_size)
                .enumerate()
                .map(|(chunk_idx, chunk)| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .enumerate()
                            .map(|(offset, sentence)| {
                                self.align_one(chunk_idx * chunk_size + offset, sentence)
                            })
                            .collect::<Result<Vec<_>, _>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(AlignmentError::runtime(
                            "parallel normalization",
                            "worker thread panicked",
                        ))
                    })
                })
                .collect()
        });

        let mut outcomes = Vec::with_capacity(sentences.len());
        for chunk in chunks {
            outcomes.extend(chunk?);
        }
        Ok(self.finish(outcomes.into_iter().map(|o| o.aligned)))
    }

    /// Normalizes like [`Self::normalize_token_list`] and also reports per-sentence
    /// coverage and round-trip checks.
    pub fn normalize_token_list_with_report(
        &self,
        items: &[PipelineItem],
    ) -> Result<(Vec<PipelineItem>, Report), AlignmentError> {
        let outcomes = self.align_sequential(items)?;
        let sentence_reports = outcomes
            .iter()
            .enumerate()
            .map(|(idx, outcome)| {
                compute_sentence_report(
                    &format!("sentence-{idx}"),
                    &outcome.aligned,
                    &outcome.final_tuples,
                )
            })
            .collect();
        let report = build_report(
            sentence_reports,
            &self.config.pause_tag,
            &self.config.sentence_tag,
        );
        Ok((self.finish(outcomes.into_iter().map(|o| o.aligned)), report))
    }

    fn align_sequential(
        &self,
        items: &[PipelineItem],
    ) -> Result<Vec<SentenceOutcome>, AlignmentError> {
        split_sentences(items, &self.config.sentence_tag)
            .into_iter()
            .enumerate()
            .map(|(idx, sentence)| self.align_one(idx, sentence))
            .collect()
    }

    fn align_one(
        &self,
        index: usize,
        sentence: &[PipelineItem],
    ) -> Result<SentenceOutcome, AlignmentError> {
        match self.try_align(sentence) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let err = err.in_sentence(index);
                match self.config.sentence_error_policy {
                    SentenceErrorPolicy::Fail => Err(err),
                    SentenceErrorPolicy::Skip => {
                        tracing::warn!(
                            sentence_index = index,
                            error = %err,
                            "normalizer: sentence skipped; passed through un-normalized"
                        );
                        Ok(SentenceOutcome {
                            aligned: AlignedSentence {
                                items: sentence.to_vec(),
                                warnings: vec![AlignmentWarning::SkippedSentence {
                                    sentence_index: index,
                                    reason: err.to_string(),
                                }],
                            },
                            final_tuples: Vec::new(),
                        })
                    }
                }
            }
        }
    }

    fn try_align(&self, sentence: &[PipelineItem]) -> Result<SentenceOutcome, AlignmentError> {
        let text = extract_tokenized_text(sentence);
        if text.is_empty() {
            return Ok(SentenceOutcome {
                aligned: AlignedSentence {
                    items: sentence.to_vec(),
                    warnings: Vec::new(),
                },
                final_tuples: Vec::new(),
            });
        }

        let output = self.normalizer.normalize(&text, &self.resources)?;
        let prenorm = match output.prenorm {
            PrenormOutput::Pairs(pairs) => pairs,
            PrenormOutput::Expanded(expanded) => extract_prenorm_pairs_from_text(&text, &expanded)?,
        };
        tracing::debug!(
            text = text.as_str(),
            prenorm_pairs = prenorm.len(),
            final_tuples = output.final_tuples.len(),
            "normalizer: aligning sentence"
        );

        let aligned = self
            .token_aligner
            .align(sentence, &prenorm, &output.final_tuples, &self.config)?;
        Ok(SentenceOutcome {
            aligned,
            final_tuples: output.final_tuples,
        })
    }

    fn finish(&self, sentences: impl Iterator<Item = AlignedSentence>) -> Vec<PipelineItem> {
        let mut items = Vec::new();
        let mut warnings = 0usize;
        for sentence in sentences {
            warnings += sentence.warnings.len();
            items.extend(sentence.items);
        }
        if warnings > 0 {
            tracing::debug!(warnings, "normalizer: alignment finished with warnings");
        }
        self.pause_inserter.insert_pauses(&items, &self.config)
    }
}
