use crate::error::AlignmentError;
use crate::types::{NormTuple, PrenormPair};

/// One element of a cursor chain. Prenorm nodes leave `pos` empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChainNode {
    pub original: String,
    pub processed: String,
    pub pos: String,
    /// Set once the node's content has been attributed to an original token.
    pub visited: bool,
}

impl ChainNode {
    pub(crate) fn original_word_count(&self) -> usize {
        self.original.split_whitespace().count().max(1)
    }

    pub(crate) fn processed_words(&self) -> Vec<&str> {
        self.processed.split_whitespace().collect()
    }
}

/// Random-access stand-in for a doubly linked list: the engine keeps plain indices
/// into it, and "stepping back" is simply not advancing.
#[derive(Debug, Clone)]
pub(crate) struct CursorChain {
    label: &'static str,
    nodes: Vec<ChainNode>,
}

impl CursorChain {
    pub(crate) fn from_prenorm(pairs: &[PrenormPair]) -> Self {
        Self {
            label: "prenorm",
            nodes: pairs
                .iter()
                .map(|pair| ChainNode {
                    original: pair.original.clone(),
                    processed: pair.expanded.clone(),
                    pos: String::new(),
                    visited: false,
                })
                .collect(),
        }
    }

    pub(crate) fn from_norm(tuples: &[NormTuple]) -> Self {
        Self {
            label: "norm",
            nodes: tuples
                .iter()
                .map(|tuple| ChainNode {
                    original: tuple.original.clone(),
                    processed: tuple.processed.clone(),
                    pos: tuple.pos.clone(),
                    visited: false,
                })
                .collect(),
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        self.label
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, at: usize) -> Option<&ChainNode> {
        self.nodes.get(at)
    }

    /// Node at `at`, or a desynchronization error naming the token that needed it.
    pub(crate) fn node(
        &self,
        at: usize,
        source_index: Option<usize>,
    ) -> Result<&ChainNode, AlignmentError> {
        self.nodes.get(at).ok_or_else(|| {
            AlignmentError::desync(
                source_index,
                format!(
                    "{} chain exhausted at node {at} of {}",
                    self.label,
                    self.nodes.len()
                ),
            )
        })
    }

    /// Marks the node consumed. Consuming a node twice means two tokens claimed the
    /// same content.
    pub(crate) fn visit(
        &mut self,
        at: usize,
        source_index: Option<usize>,
    ) -> Result<&ChainNode, AlignmentError> {
        let len = self.nodes.len();
        let label = self.label;
        let node = self.nodes.get_mut(at).ok_or_else(|| {
            AlignmentError::desync(
                source_index,
                format!("{label} chain exhausted at node {at} of {len}"),
            )
        })?;
        if node.visited {
            return Err(AlignmentError::desync(
                source_index,
                format!("{label} node {at} ('{}') consumed twice", node.original),
            ));
        }
        node.visited = true;
        Ok(&*node)
    }

    pub(crate) fn first_unvisited(&self) -> Option<(usize, &ChainNode)> {
        self.nodes.iter().enumerate().find(|(_, node)| !node.visited)
    }
}
