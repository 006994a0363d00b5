//! Bipartition snapshots over a shared taxon namespace.
//!
//! Every internal edge of an unrooted tree splits the leaves into two
//! complementary sets; that split, not node identity, is what makes two
//! topologies comparable. A `TreeSnapshot` stores each split as a canonical
//! bitset keyed by taxon *name*, so trees parsed from different files (and
//! trees over different taxon subsets) map identical splits to identical
//! bitsets.
//!
//! Unlike a per-tree encoding, the bit positions here come from one
//! [`TaxonNamespace`] shared by all compared trees. Taxa absent from a tree
//! simply never appear in its bitsets.

use std::collections::{HashMap, HashSet};

use phylotree::tree::Tree as PhyloTree;

use crate::bitset::Bitset;
use crate::error::RankError;

/// Shared label -> bit index registry for one comparison.
///
/// Indices follow the sorted order of the union of all leaf labels, so the
/// mapping is stable no matter which tree contributed a taxon first.
#[derive(Debug, Clone)]
pub struct TaxonNamespace {
    index: HashMap<String, usize>,
    labels: Vec<String>,
}

impl TaxonNamespace {
    /// Build the namespace from the union of leaf labels of `trees`.
    pub fn from_trees<'a, I>(trees: I) -> Result<Self, RankError>
    where
        I: IntoIterator<Item = &'a PhyloTree>,
    {
        let mut union: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for tree in trees {
            for label in leaf_names(tree)? {
                if seen.insert(label.clone()) {
                    union.push(label);
                }
            }
        }
        union.sort_unstable();
        let index = union
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Ok(TaxonNamespace { index, labels: union })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Words per bitset for this namespace.
    pub fn words(&self) -> usize {
        self.labels.len().div_ceil(64).max(1)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }
}

/// Extract leaf labels of a tree, erroring on unnamed leaves.
pub fn leaf_names(tree: &PhyloTree) -> Result<Vec<String>, RankError> {
    tree.get_leaves()
        .iter()
        .map(|leaf_id| {
            tree.get(leaf_id)
                .map_err(|e| RankError::Encoding(format!("dangling leaf id: {e}")))?
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .ok_or_else(|| RankError::Encoding("tree has an unnamed leaf".into()))
        })
        .collect()
}

/// Canonical bipartition set of one tree, with per-split branch lengths.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    /// Canonical splits (side not containing the tree's reference taxon).
    pub parts: HashSet<Bitset>,
    /// Branch length of the edge inducing each split; missing lengths are 0.
    pub lengths: HashMap<Bitset, f64>,
    /// All taxa of this tree, as namespace bits.
    pub leaf_mask: Bitset,
}

impl TreeSnapshot {
    /// Encode `tree` against `namespace`.
    ///
    /// Splits are collected bottom-up (each non-root node contributes the
    /// set of leaves below it, carrying its parent edge length), then
    /// canonicalized: if a side contains the tree's lowest-index taxon it is
    /// flipped to the complementary side *within this tree's leaf mask*.
    /// Trees over the same leaf set therefore canonicalize identically.
    pub fn encode(tree: &PhyloTree, namespace: &TaxonNamespace) -> Result<Self, RankError> {
        let words = namespace.words();

        let mut leaf_bits: HashMap<usize, usize> = HashMap::new();
        for leaf_id in tree.get_leaves() {
            let node = tree
                .get(&leaf_id)
                .map_err(|e| RankError::Encoding(format!("dangling leaf id: {e}")))?;
            let name = node
                .name
                .as_deref()
                .filter(|n| !n.is_empty())
                .ok_or_else(|| RankError::Encoding("tree has an unnamed leaf".into()))?;
            let idx = namespace
                .index_of(name)
                .ok_or_else(|| RankError::Encoding(format!("taxon '{name}' not in namespace")))?;
            leaf_bits.insert(leaf_id, idx);
        }

        let root_id = tree
            .get_root()
            .map_err(|e| RankError::Encoding(format!("tree has no root: {e}")))?;

        let mut cache: HashMap<usize, Bitset> = HashMap::new();
        let leaf_mask = compute_bitsets(tree, root_id, &leaf_bits, words, &mut cache)?;

        let reference = leaf_mask
            .lowest_set()
            .ok_or_else(|| RankError::Encoding("tree has no leaves".into()))?;

        let mut parts = HashSet::new();
        let mut lengths = HashMap::new();
        for (&node_id, bits) in &cache {
            if node_id == root_id || bits.count_ones() <= 1 {
                continue;
            }
            let node = tree
                .get(&node_id)
                .map_err(|e| RankError::Encoding(format!("dangling node id: {e}")))?;
            let length = node.parent_edge.unwrap_or(0.0);
            let canonical = if bits.get(reference) {
                bits.complement_within(&leaf_mask)
            } else {
                bits.clone()
            };
            parts.insert(canonical.clone());
            // The two edges flanking a root bifurcation canonicalize to the
            // same split; unrooted, they are one edge, so lengths add up.
            *lengths.entry(canonical).or_insert(0.0) += length;
        }

        Ok(TreeSnapshot { parts, lengths, leaf_mask })
    }

    /// True when both snapshots cover at least one common taxon.
    pub fn shares_taxa_with(&self, other: &TreeSnapshot) -> bool {
        self.leaf_mask.intersects(&other.leaf_mask)
    }
}

/// Bottom-up DFS: a leaf is its own singleton set, an internal node is the
/// OR of its children. Returns the bitset of the start node.
fn compute_bitsets(
    tree: &PhyloTree,
    node_id: usize,
    leaf_bits: &HashMap<usize, usize>,
    words: usize,
    cache: &mut HashMap<usize, Bitset>,
) -> Result<Bitset, RankError> {
    if let Some(bits) = cache.get(&node_id) {
        return Ok(bits.clone());
    }

    let node = tree
        .get(&node_id)
        .map_err(|e| RankError::Encoding(format!("dangling node id: {e}")))?;

    let mut bits = Bitset::zeros(words);
    if node.children.is_empty() {
        let idx = leaf_bits
            .get(&node_id)
            .ok_or_else(|| RankError::Encoding("leaf missing from index".into()))?;
        bits.set(*idx);
    } else {
        for &child in &node.children {
            let child_bits = compute_bitsets(tree, child, leaf_bits, words, cache)?;
            bits.or_assign(&child_bits);
        }
    }

    cache.insert(node_id, bits.clone());
    Ok(bits)
}
