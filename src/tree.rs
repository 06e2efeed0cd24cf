use crate::error::{CorruptTableError, DecodeError};
use crate::frequency::FrequencyTable;
use crate::pack::Packed;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::hash::Hash;

/// Index of a node in a [`HuffmanTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind<Symbol> {
    Leaf(Symbol),
    Internal { left: NodeId, right: NodeId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node<Symbol> {
    weight: usize,
    kind: NodeKind<Symbol>,
}

impl<Symbol> Node<Symbol> {
    fn leaf(s: Symbol, weight: usize) -> Self {
        Self {
            weight,
            kind: NodeKind::Leaf(s),
        }
    }

    pub fn weight(&self) -> usize {
        self.weight
    }

    pub fn kind(&self) -> &NodeKind<Symbol> {
        &self.kind
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        match &self.kind {
            NodeKind::Leaf(s) => Some(s),
            NodeKind::Internal { .. } => None,
        }
    }

    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Internal { left, right } => Some((left, right)),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }
}

/// Min-heap key. Node ids are handed out in allocation order, so ties on
/// weight go to the node that entered the queue first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    weight: usize,
    id: NodeId,
}

/// A Huffman tree stored as an arena.
///
/// Children are always allocated before their parent and the root is the
/// last node, so the arena is also a valid post-order serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "RawTree<Symbol>",
    bound(deserialize = "Symbol: Deserialize<'de> + Eq + Hash")
)]
pub struct HuffmanTree<Symbol> {
    nodes: Vec<Node<Symbol>>,
}

#[derive(Deserialize)]
struct RawTree<Symbol> {
    nodes: Vec<Node<Symbol>>,
}

impl<Symbol> HuffmanTree<Symbol>
where
    Symbol: Clone,
{
    /// Builds the tree by repeatedly merging the two lightest nodes.
    ///
    /// Returns `None` for an empty table. A single distinct symbol yields a
    /// lone leaf.
    pub fn from_frequencies(freq: &FrequencyTable<Symbol>) -> Option<Self> {
        let mut nodes: Vec<Node<Symbol>> = freq
            .iter()
            .map(|(s, count)| Node::leaf(s.clone(), count))
            .collect();

        match nodes.len() {
            0 => return None,
            1 => {
                debug!("huffman tree: single symbol, weight {}", nodes[0].weight);
                return Some(Self { nodes });
            }
            _ => {}
        }

        let mut pq: BinaryHeap<Reverse<QueueEntry>> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                Reverse(QueueEntry {
                    weight: n.weight,
                    id: NodeId(i),
                })
            })
            .collect();

        while pq.len() > 1 {
            let (Some(Reverse(left)), Some(Reverse(right))) = (pq.pop(), pq.pop()) else {
                break;
            };

            let id = NodeId(nodes.len());
            let weight = left.weight + right.weight;
            trace!(
                "merge {:?}({}) + {:?}({}) -> {:?}({})",
                left.id,
                left.weight,
                right.id,
                right.weight,
                id,
                weight
            );

            nodes.push(Node {
                weight,
                kind: NodeKind::Internal {
                    left: left.id,
                    right: right.id,
                },
            });
            pq.push(Reverse(QueueEntry { weight, id }));
        }

        debug!(
            "huffman tree: {} symbols, {} nodes",
            freq.len(),
            nodes.len()
        );
        Some(Self { nodes })
    }

    /// Decodes a packed stream by walking the tree from the root.
    pub fn decode(&self, packed: &Packed) -> Result<Vec<Symbol>, DecodeError> {
        let bits = packed.bits();
        let root = self.root();

        // a lone leaf owns the one-bit code "0"
        if let NodeKind::Leaf(sym) = &self.node(root).kind {
            return bits
                .iter()
                .by_vals()
                .enumerate()
                .map(|(offset, b)| match b {
                    false => Ok(sym.clone()),
                    true => Err(DecodeError::InvalidCode { offset }),
                })
                .collect();
        }

        let mut out = Vec::new();
        let mut cur = root;
        let mut start = 0;
        for (i, b) in bits.iter().by_vals().enumerate() {
            let NodeKind::Internal { left, right } = self.node(cur).kind else {
                return Err(DecodeError::InvalidCode { offset: start });
            };
            cur = if b { right } else { left };

            if let NodeKind::Leaf(sym) = &self.node(cur).kind {
                out.push(sym.clone());
                cur = root;
                start = i + 1;
            }
        }

        if cur != root {
            return Err(DecodeError::TrailingBits {
                bits: bits.len() - start,
            });
        }

        Ok(out)
    }
}

impl<Symbol> HuffmanTree<Symbol> {
    pub fn root(&self) -> NodeId {
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Node<Symbol> {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node<Symbol>] {
        &self.nodes
    }

    /// Total weight, equal to the length of the input the tree was built from.
    pub fn weight(&self) -> usize {
        self.node(self.root()).weight
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }
}

impl<Symbol> TryFrom<RawTree<Symbol>> for HuffmanTree<Symbol>
where
    Symbol: Eq + Hash,
{
    type Error = CorruptTableError;

    fn try_from(raw: RawTree<Symbol>) -> Result<Self, Self::Error> {
        let nodes = raw.nodes;
        if nodes.is_empty() {
            return Err(CorruptTableError::MalformedTree("no nodes"));
        }

        let mut parents = vec![0usize; nodes.len()];
        let mut symbols = HashSet::new();
        for (i, node) in nodes.iter().enumerate() {
            match &node.kind {
                NodeKind::Leaf(s) => {
                    if node.weight == 0 {
                        return Err(CorruptTableError::MalformedTree("zero weight leaf"));
                    }
                    if !symbols.insert(s) {
                        return Err(CorruptTableError::DuplicateSymbol);
                    }
                }
                NodeKind::Internal { left, right } => {
                    if left.0 >= i || right.0 >= i || left == right {
                        return Err(CorruptTableError::MalformedTree(
                            "child does not precede parent",
                        ));
                    }
                    let sum = nodes[left.0].weight.checked_add(nodes[right.0].weight);
                    if sum != Some(node.weight) {
                        return Err(CorruptTableError::MalformedTree("weight mismatch"));
                    }
                    parents[left.0] += 1;
                    parents[right.0] += 1;
                }
            }
        }

        let Some((root, rest)) = parents.split_last() else {
            return Err(CorruptTableError::MalformedTree("no nodes"));
        };
        if *root != 0 || rest.iter().any(|&p| p != 1) {
            return Err(CorruptTableError::MalformedTree("not a single rooted tree"));
        }

        Ok(Self { nodes })
    }
}

/// Counts `symbols` and builds their Huffman tree; `None` for empty input.
pub fn build_tree<Symbol>(symbols: impl IntoIterator<Item = Symbol>) -> Option<HuffmanTree<Symbol>>
where
    Symbol: Eq + Hash + Clone,
{
    HuffmanTree::from_frequencies(&FrequencyTable::from_symbols(symbols))
}
