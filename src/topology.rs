//! Owned topology representation for constraint-tree manipulation.
//!
//! Hypothesis trees only constrain tree searches, so branch lengths and
//! rooting carry no meaning here. `Clade` keeps just the nesting structure
//! and leaf labels, which is exactly what pruning, derooting, and Newick
//! re-serialization need.

use std::collections::BTreeSet;
use std::collections::HashSet;

use phylotree::tree::Tree as PhyloTree;

use crate::error::GeneError;

/// One node of an unrooted hypothesis topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Clade {
    Leaf(String),
    Internal(Vec<Clade>),
}

impl Clade {
    /// Convert a parsed `phylotree` tree into an owned topology.
    ///
    /// Fails if the tree is empty or any leaf is unnamed; a constraint tree
    /// without taxon labels cannot be matched against an alignment.
    pub fn from_tree(tree: &PhyloTree) -> Result<Clade, GeneError> {
        let root = tree
            .get_root()
            .map_err(|e| GeneError::Parse(format!("tree has no root: {e}")))?;
        Self::from_node(tree, root)
    }

    fn from_node(tree: &PhyloTree, node_id: usize) -> Result<Clade, GeneError> {
        let node = tree
            .get(&node_id)
            .map_err(|e| GeneError::Parse(format!("bad node reference: {e}")))?;
        if node.children.is_empty() {
            let name = node
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .ok_or_else(|| GeneError::Parse("unnamed leaf in topology".into()))?;
            Ok(Clade::Leaf(name))
        } else {
            let children = node
                .children
                .iter()
                .map(|&child| Self::from_node(tree, child))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Clade::Internal(children))
        }
    }

    /// Parse one Newick string (terminator optional) into a topology.
    pub fn from_newick(newick: &str) -> Result<Clade, GeneError> {
        let text = newick.trim();
        let text = if text.ends_with(';') {
            text.to_string()
        } else {
            format!("{text};")
        };
        let tree = PhyloTree::from_newick(&text)
            .map_err(|e| GeneError::Parse(format!("invalid Newick '{}': {e}", text)))?;
        Clade::from_tree(&tree)
    }

    /// All leaf labels, sorted.
    pub fn leaf_labels(&self) -> BTreeSet<String> {
        let mut labels = BTreeSet::new();
        self.collect_labels(&mut labels);
        labels
    }

    fn collect_labels(&self, out: &mut BTreeSet<String>) {
        match self {
            Clade::Leaf(name) => {
                out.insert(name.clone());
            }
            Clade::Internal(children) => {
                for child in children {
                    child.collect_labels(out);
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Clade::Leaf(_) => 1,
            Clade::Internal(children) => children.iter().map(Clade::leaf_count).sum(),
        }
    }

    /// Restrict the topology to `keep`, collapsing degree-2 internal nodes.
    ///
    /// Set semantics: the result depends only on which labels are in `keep`,
    /// never on any ordering. Returns `None` when no leaf survives.
    pub fn prune(&self, keep: &HashSet<String>) -> Option<Clade> {
        match self {
            Clade::Leaf(name) => keep.contains(name).then(|| Clade::Leaf(name.clone())),
            Clade::Internal(children) => {
                let mut kept: Vec<Clade> =
                    children.iter().filter_map(|c| c.prune(keep)).collect();
                match kept.len() {
                    0 => None,
                    // A single surviving child makes this node degree-2;
                    // splice the child upward.
                    1 => Some(kept.remove(0)),
                    _ => Some(Clade::Internal(kept)),
                }
            }
        }
    }

    /// Remove root-specific structure.
    ///
    /// A rooted binary top node `(X,Y)` carries no information an unrooted
    /// comparison can use, so the children of one internal side are hoisted
    /// to the top, yielding the usual >= 3-way basal multifurcation.
    pub fn deroot(self) -> Clade {
        match self {
            Clade::Internal(children) if children.len() == 2 => {
                let mut merged = Vec::with_capacity(3);
                let mut hoisted = false;
                for child in children {
                    match child {
                        Clade::Internal(grandchildren) if !hoisted => {
                            merged.extend(grandchildren);
                            hoisted = true;
                        }
                        other => merged.push(other),
                    }
                }
                // Two leaves under the top node: nothing to hoist.
                Clade::Internal(merged)
            }
            other => other,
        }
    }

    /// Topology-only Newick, `;`-terminated, no branch lengths.
    pub fn to_newick(&self) -> String {
        let mut out = String::new();
        self.write_newick(&mut out);
        out.push(';');
        out
    }

    fn write_newick(&self, out: &mut String) {
        match self {
            Clade::Leaf(name) => out.push_str(name),
            Clade::Internal(children) => {
                out.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    child.write_newick(out);
                }
                out.push(')');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_and_serialize() {
        let clade = Clade::from_newick("(A,B,(C,D));").unwrap();
        assert_eq!(clade.to_newick(), "(A,B,(C,D));");
        assert_eq!(clade.leaf_count(), 4);
    }

    #[test]
    fn branch_lengths_are_dropped() {
        let clade = Clade::from_newick("(A:0.1,(B:0.2,C:0.3):0.4);").unwrap();
        assert_eq!(clade.to_newick(), "(A,(B,C));");
    }

    #[test]
    fn prune_keeps_exactly_the_intersection() {
        let clade = Clade::from_newick("((A,B),(C,(D,E)));").unwrap();
        let pruned = clade.prune(&labels(&["A", "C", "D", "Z"])).unwrap();
        let kept: Vec<String> = pruned.leaf_labels().into_iter().collect();
        assert_eq!(kept, vec!["A", "C", "D"]);
    }

    #[test]
    fn prune_collapses_degree_two_nodes() {
        // Removing B leaves (A) as a unary node; it must collapse to A.
        let clade = Clade::from_newick("((A,B),(C,D));").unwrap();
        let pruned = clade.prune(&labels(&["A", "C", "D"])).unwrap();
        assert_eq!(pruned.to_newick(), "(A,(C,D));");
    }

    #[test]
    fn prune_is_order_independent() {
        let clade = Clade::from_newick("((A,B),(C,(D,E)));").unwrap();
        let a = clade.prune(&labels(&["E", "A", "C"]));
        let b = clade.prune(&labels(&["C", "E", "A"]));
        assert_eq!(a, b);
    }

    #[test]
    fn prune_to_nothing() {
        let clade = Clade::from_newick("(A,B,C);").unwrap();
        assert_eq!(clade.prune(&labels(&["X"])), None);
    }

    #[test]
    fn deroot_hoists_one_internal_side() {
        let clade = Clade::from_newick("((A,B),(C,D));").unwrap();
        assert_eq!(clade.deroot().to_newick(), "(A,B,(C,D));");
    }

    #[test]
    fn deroot_leaves_unrooted_trees_alone() {
        let clade = Clade::from_newick("(A,B,(C,D));").unwrap();
        assert_eq!(clade.clone().deroot(), clade);
    }

    #[test]
    fn deroot_cherry_of_two_leaves() {
        let clade = Clade::from_newick("(A,B);").unwrap();
        assert_eq!(clade.deroot().to_newick(), "(A,B);");
    }
}
