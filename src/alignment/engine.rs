use crate::alignment::classify::{classify, without_spaces, PrenormCursor, RelationKind};
use crate::alignment::cursor_chain::{ChainNode, CursorChain};
use crate::alignment::segments::SegmentWriter;
use crate::config::NormalizerConfig;
use crate::error::AlignmentError;
use crate::types::{
    AlignedSentence, AlignmentWarning, NormTuple, NormalizedSegment, PipelineItem, PrenormPair,
    Token,
};


/// How far one handled item moves each sequence.
///
/// The prenorm side is counted in words of its keys: a grouped key such as `m. kr.`
/// is spread over two original tokens, so a token may stop part-way into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Advance {
    pub tokens: usize,
    pub prenorm_words: usize,
    pub norm_nodes: usize,
}

impl Advance {
    const PASSTHROUGH: Self = Self {
        tokens: 1,
        prenorm_words: 0,
        norm_nodes: 0,
    };
}

/// Aligns one sentence of original items with the normalizer's prenorm pairs and final
/// tuples, filling `normalized` on every non-deleted token.
///
/// The sentence either aligns completely or fails: every norm node must be attributed
/// to exactly one token and the prenorm keys must be used up. Running out of prenorm
/// keys while text tokens remain is a desynchronization, also for an empty chain.
pub fn align_sentence(
    items: &[PipelineItem],
    prenorm: &[PrenormPair],
    final_tuples: &[NormTuple],
    config: &NormalizerConfig,
) -> Result<AlignedSentence, AlignmentError> {
    AlignmentEngine::new(prenorm, final_tuples, config).run(items)
}

struct AlignmentEngine<'c> {
    config: &'c NormalizerConfig,
    prenorm: CursorChain,
    norm: CursorChain,
    prenorm_at: usize,
    /// Words of the key at `prenorm_at` already claimed by earlier tokens.
    prenorm_word: usize,
    norm_at: usize,
    warnings: Vec<AlignmentWarning>,
}

impl<'c> AlignmentEngine<'c> {
    fn new(
        prenorm: &[PrenormPair],
        final_tuples: &[NormTuple],
        config: &'c NormalizerConfig,
    ) -> Self {
        Self {
            config,
            prenorm: CursorChain::from_prenorm(prenorm),
            norm: CursorChain::from_norm(final_tuples),
            prenorm_at: 0,
            prenorm_word: 0,
            norm_at: 0,
            warnings: Vec::new(),
        }
    }

    fn run(mut self, items: &[PipelineItem]) -> Result<AlignedSentence, AlignmentError> {
        let mut out = Vec::with_capacity(items.len());
        let mut i = 0usize;
        while i < items.len() {
            let item = &items[i];
            let prenorm = self.prenorm_cursor();
            if let (PipelineItem::Token(token), PrenormCursor::Exhausted) = (item, prenorm) {
                if !token.is_deleted() {
                    return Err(AlignmentError::desync(
                        Some(token.source_index),
                        format!(
                            "prenorm chain exhausted at node {} of {} before token '{}'",
                            self.prenorm_at,
                            self.prenorm.len(),
                            token.surface
                        ),
                    ));
                }
            }
            let kind = classify(item, prenorm, self.norm.get(self.norm_at));
            tracing::debug!(
                source_index = item.source_index(),
                kind = kind.as_str(),
                prenorm_at = self.prenorm_at,
                prenorm_word = self.prenorm_word,
                norm_at = self.norm_at,
                "alignment: classified item"
            );

            let advance = match item {
                PipelineItem::Tag(_) => {
                    out.push(item.clone());
                    Advance::PASSTHROUGH
                }
                PipelineItem::Token(token) => {
                    let (advance, segments) = self.handle(kind, token)?;
                    let mut token = token.clone();
                    if kind.consumes_nodes() {
                        token.normalized = segments;
                    }
                    out.push(token.into());
                    advance
                }
            };
            self.apply(advance, item.source_index())?;
            i += advance.tokens;
        }

        self.check_exhausted()?;
        Ok(AlignedSentence {
            items: out,
            warnings: self.warnings,
        })
    }

    fn prenorm_cursor(&self) -> PrenormCursor<'_> {
        match self.prenorm.get(self.prenorm_at) {
            None => PrenormCursor::Exhausted,
            Some(_) if self.prenorm_word > 0 => PrenormCursor::InsideKey,
            Some(node) => PrenormCursor::AtKey(node),
        }
    }

    fn handle(
        &mut self,
        kind: RelationKind,
        token: &Token,
    ) -> Result<(Advance, Vec<NormalizedSegment>), AlignmentError> {
        if kind == RelationKind::PrenormGroupContinuation {
            return Ok((self.continue_group(token)?, Vec::new()));
        }
        if !kind.consumes_nodes() {
            return Ok((Advance::PASSTHROUGH, Vec::new()));
        }

        let idx = token.source_index;
        let config = self.config;
        let mut writer = SegmentWriter::new(&config.split_punctuation, idx);
        let norm_nodes = match kind {
            RelationKind::DirectMulti
            | RelationKind::DirectSingle
            | RelationKind::IndirectIdentity => {
                let node = self.norm.visit(self.norm_at, Some(idx))?;
                writer.push_words(&node.processed, &node.pos);
                1
            }
            RelationKind::Fallback => {
                let node = self.norm.visit(self.norm_at, Some(idx))?;
                writer.push_verbatim(&node.processed, &node.pos);
                1
            }
            RelationKind::PrenormOneToMany | RelationKind::PrenormGroupStart => {
                self.consume_expansion(idx, &mut writer)?
            }
            RelationKind::TokenizerSplit => self.consume_split(token, &mut writer)?,
            RelationKind::TagPassthrough
            | RelationKind::Deleted
            | RelationKind::PrenormGroupContinuation => 0,
        };

        let (segments, warnings) = writer.finish();
        self.warnings.extend(warnings);
        Ok((
            Advance {
                tokens: 1,
                prenorm_words: token.joined_tokenized().split_whitespace().count(),
                norm_nodes,
            },
            segments,
        ))
    }

    /// The expansion of the prenorm key starting at this token; each norm node must key
    /// on the next word(s) of it. A grouped key hands its whole expansion to its first
    /// token.
    fn consume_expansion(
        &mut self,
        idx: usize,
        writer: &mut SegmentWriter<'_>,
    ) -> Result<usize, AlignmentError> {
        let prenorm = self.prenorm.node(self.prenorm_at, Some(idx))?;
        let expansion = prenorm.processed_words();

        let mut used = 0usize;
        let mut consumed = 0usize;
        while used < expansion.len() {
            let at = self.norm_at + consumed;
            let width = match self.norm.get(at) {
                Some(node) => {
                    let node_words: Vec<&str> = node.original.split_whitespace().collect();
                    if node_words.is_empty() || !expansion[used..].starts_with(&node_words) {
                        return Err(unmatched_expansion(idx, prenorm, &node.original));
                    }
                    node_words.len()
                }
                None => return Err(unmatched_expansion(idx, prenorm, "end of normalized output")),
            };
            let node = self.norm.visit(at, Some(idx))?;
            writer.push_words(&node.processed, &node.pos);
            used += width;
            consumed += 1;
        }
        Ok(consumed)
    }

    /// The tokenizer split the token into pieces the normalizer saw as separate keys.
    /// Walks the prenorm keys covering the pieces; a key expanded to several words takes
    /// norm nodes until their keys spell out the expansion, any other key takes one.
    fn consume_split(
        &mut self,
        token: &Token,
        writer: &mut SegmentWriter<'_>,
    ) -> Result<usize, AlignmentError> {
        let idx = token.source_index;
        let joined = token.joined_tokenized();
        let pieces: Vec<&str> = joined.split_whitespace().collect();

        let mut piece = 0usize;
        let mut prenorm_at = self.prenorm_at;
        let mut consumed = 0usize;
        while piece < pieces.len() {
            let prenorm = self.prenorm.get(prenorm_at).ok_or_else(|| {
                AlignmentError::desync(
                    Some(idx),
                    format!("prenorm chain exhausted inside split token '{}'", token.surface),
                )
            })?;
            let end = piece + prenorm.original_word_count();
            if end > pieces.len()
                || without_spaces(&prenorm.original) != pieces[piece..end].concat()
            {
                return Err(unmatched_expansion(idx, prenorm, &pieces[piece..].join(" ")));
            }

            let expansion = prenorm.processed_words();
            if expansion.len() > 1 {
                let target: String = expansion.concat();
                let mut spelled = String::new();
                while spelled.len() < target.len() {
                    let at = self.norm_at + consumed;
                    match self.norm.get(at) {
                        Some(node) => spelled.push_str(&without_spaces(&node.original)),
                        None => return Err(unmatched_expansion(idx, prenorm, &spelled)),
                    }
                    let node = self.norm.visit(at, Some(idx))?;
                    writer.push_words(&node.processed, &node.pos);
                    consumed += 1;
                }
                if spelled != target {
                    return Err(unmatched_expansion(idx, prenorm, &spelled));
                }
            } else {
                let node = self.norm.visit(self.norm_at + consumed, Some(idx))?;
                writer.push_words(&node.processed, &node.pos);
                consumed += 1;
            }

            piece = end;
            prenorm_at += 1;
        }
        Ok(consumed)
    }

    /// A later token of a grouped key: it must spell the key's next words and takes no
    /// norm node.
    fn continue_group(&self, token: &Token) -> Result<Advance, AlignmentError> {
        let idx = token.source_index;
        let prenorm = self.prenorm.node(self.prenorm_at, Some(idx))?;
        let key_words: Vec<&str> = prenorm.original.split_whitespace().collect();
        let joined = token.joined_tokenized();
        let token_words: Vec<&str> = joined.split_whitespace().collect();
        let rest = key_words.get(self.prenorm_word..).unwrap_or_default();
        if !rest.starts_with(&token_words) {
            return Err(AlignmentError::desync(
                Some(idx),
                format!(
                    "token '{}' does not continue prenorm key '{}'",
                    token.surface, prenorm.original
                ),
            ));
        }
        Ok(Advance {
            tokens: 1,
            prenorm_words: token_words.len(),
            norm_nodes: 0,
        })
    }

    fn apply(&mut self, advance: Advance, source_index: usize) -> Result<(), AlignmentError> {
        self.norm_at += advance.norm_nodes;
        let mut remaining = advance.prenorm_words;
        while remaining > 0 {
            let left = self
                .prenorm
                .node(self.prenorm_at, Some(source_index))?
                .original_word_count()
                - self.prenorm_word;
            if remaining < left {
                self.prenorm_word += remaining;
                break;
            }
            remaining -= left;
            self.prenorm.visit(self.prenorm_at, Some(source_index))?;
            self.prenorm_at += 1;
            self.prenorm_word = 0;
        }
        Ok(())
    }

    fn check_exhausted(&self) -> Result<(), AlignmentError> {
        for chain in [&self.norm, &self.prenorm] {
            if let Some((at, node)) = chain.first_unvisited() {
                return Err(AlignmentError::desync(
                    None,
                    format!(
                        "{} node {at} ('{}') was never attributed to a token",
                        chain.label(),
                        node.original
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn unmatched_expansion(idx: usize, prenorm: &ChainNode, found: &str) -> AlignmentError {
    tracing::warn!(
        source_index = idx,
        original = prenorm.original.as_str(),
        expanded = prenorm.processed.as_str(),
        found,
        "alignment: expansion does not match normalized output"
    );
    AlignmentError::unmatched(prenorm.original.clone(), prenorm.processed.clone(), found)
}
