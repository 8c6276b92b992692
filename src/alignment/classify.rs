use crate::alignment::cursor_chain::ChainNode;
use crate::types::PipelineItem;

/// How one item of the original stream relates to the cursor nodes in front of it.
/// Variants are listed in the priority order [`classify`] checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    TagPassthrough,
    Deleted,
    /// An earlier token opened a grouped prenorm key (`m. kr.`) and took its whole
    /// expansion; this token only uses up its remaining words.
    PrenormGroupContinuation,
    /// The norm node keys on the whole token and expands to several words.
    DirectMulti,
    /// The norm node keys on the whole token and yields one word.
    DirectSingle,
    /// The prenorm node keys on the token and the norm node keys on its expansion.
    IndirectIdentity,
    /// The prenorm node keys on the token and expanded to several words, each picked up
    /// by its own norm node.
    PrenormOneToMany,
    /// The token is the first of several the prenorm node keys on together.
    PrenormGroupStart,
    /// The tokenizer split what the normalizer saw as several units, e.g. `10-12`.
    TokenizerSplit,
    Fallback,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TagPassthrough => "tag_passthrough",
            Self::Deleted => "deleted",
            Self::PrenormGroupContinuation => "prenorm_group_continuation",
            Self::DirectMulti => "direct_multi",
            Self::DirectSingle => "direct_single",
            Self::IndirectIdentity => "indirect_identity",
            Self::PrenormOneToMany => "prenorm_one_to_many",
            Self::PrenormGroupStart => "prenorm_group_start",
            Self::TokenizerSplit => "tokenizer_split",
            Self::Fallback => "fallback",
        }
    }

    /// Whether the item takes norm nodes.
    pub fn consumes_nodes(self) -> bool {
        !matches!(
            self,
            Self::TagPassthrough | Self::Deleted | Self::PrenormGroupContinuation
        )
    }
}

/// Where the prenorm cursor stands relative to the item being classified.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PrenormCursor<'a> {
    /// The key of this node starts at the item.
    AtKey(&'a ChainNode),
    /// Part-way into a grouped key opened by an earlier token.
    InsideKey,
    Exhausted,
}

/// Classifies `item` against the prenorm cursor and the current norm node.
pub(crate) fn classify(
    item: &PipelineItem,
    prenorm: PrenormCursor<'_>,
    norm: Option<&ChainNode>,
) -> RelationKind {
    let token = match item {
        PipelineItem::Tag(_) => return RelationKind::TagPassthrough,
        PipelineItem::Token(token) if token.is_deleted() => return RelationKind::Deleted,
        PipelineItem::Token(token) => token,
    };
    let prenorm = match prenorm {
        PrenormCursor::InsideKey => return RelationKind::PrenormGroupContinuation,
        PrenormCursor::AtKey(node) => Some(node),
        PrenormCursor::Exhausted => None,
    };
    let joined = token.joined_tokenized();

    if let Some(norm) = norm {
        if norm.original == joined {
            return if norm.processed_words().len() > 1 {
                RelationKind::DirectMulti
            } else {
                RelationKind::DirectSingle
            };
        }
    }

    let Some(prenorm) = prenorm else {
        return RelationKind::Fallback;
    };
    if prenorm.original == joined {
        if norm.is_some_and(|norm| norm.original == prenorm.processed) {
            return RelationKind::IndirectIdentity;
        }
        if prenorm.processed_words().len() > 1 {
            return RelationKind::PrenormOneToMany;
        }
    }

    let key_words: Vec<&str> = prenorm.original.split_whitespace().collect();
    let token_words: Vec<&str> = joined.split_whitespace().collect();
    if key_words.len() > token_words.len() && key_words.starts_with(&token_words) {
        return RelationKind::PrenormGroupStart;
    }

    let key = without_spaces(&prenorm.original);
    let compact = without_spaces(&joined);
    if !key.is_empty() && compact.len() > key.len() && compact.starts_with(&key) {
        return RelationKind::TokenizerSplit;
    }

    RelationKind::Fallback
}

pub(crate) fn without_spaces(text: &str) -> String {
    text.split_whitespace().collect()
}
