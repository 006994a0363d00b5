//! Best-hypothesis selection by bipartition distance.
//!
//! The unconstrained maximum-likelihood tree and every constrained tree are
//! encoded over one shared taxon namespace; each hypothesis is then ranked
//! by the Euclidean (branch score) distance of its bipartition-length
//! vector to the unconstrained tree's, and the closest hypothesis wins.

use phylotree::tree::Tree as PhyloTree;

use crate::error::RankError;
use crate::snapshot::{TaxonNamespace, TreeSnapshot};

/// Euclidean distance over bipartition-length vectors.
///
/// Each snapshot is read as a sparse vector indexed by canonical split,
/// with the inducing branch length as the value (0.0 for splits the tree
/// lacks); the distance is the L2 norm of the difference over the union of
/// both split sets. Identical topologies with identical lengths are at
/// distance 0.
pub fn euclidean_distance(a: &TreeSnapshot, b: &TreeSnapshot) -> f64 {
    a.parts
        .union(&b.parts)
        .map(|part| {
            let in_a = a.lengths.get(part).copied().unwrap_or(0.0);
            let in_b = b.lengths.get(part).copied().unwrap_or(0.0);
            (in_a - in_b).powi(2)
        })
        .sum::<f64>()
        .sqrt()
}

/// Index of the hypothesis tree closest to the unconstrained tree.
///
/// Exact ties resolve to the lowest index, so re-running on identical input
/// always returns the same hypothesis. The returned index is always within
/// `0..hypotheses.len()`.
///
/// # Errors
/// - [`RankError::NoHypotheses`] for an empty candidate list.
/// - [`RankError::DisjointTaxa`] when a hypothesis shares no taxon with the
///   unconstrained tree (the distance would be meaningless).
pub fn select_best_hypothesis(
    unconstrained: &PhyloTree,
    hypotheses: &[PhyloTree],
) -> Result<usize, RankError> {
    if hypotheses.is_empty() {
        return Err(RankError::NoHypotheses);
    }

    let namespace =
        TaxonNamespace::from_trees(std::iter::once(unconstrained).chain(hypotheses.iter()))?;
    let reference = TreeSnapshot::encode(unconstrained, &namespace)?;

    let mut best: Option<(usize, f64)> = None;
    for (index, hypothesis) in hypotheses.iter().enumerate() {
        let snapshot = TreeSnapshot::encode(hypothesis, &namespace)?;
        if !snapshot.shares_taxa_with(&reference) {
            return Err(RankError::DisjointTaxa { index });
        }
        let distance = euclidean_distance(&reference, &snapshot);
        // Strict < keeps the first index on exact ties.
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }

    // hypotheses is non-empty, so best is set.
    Ok(best.map(|(index, _)| index).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    fn tree(newick: &str) -> PhyloTree {
        PhyloTree::from_newick(newick).unwrap()
    }

    #[test]
    fn identical_hypothesis_wins_with_distance_zero() {
        let unconstrained = tree("(A:0.1,(B:0.1,C:0.1):0.1);");
        let hypos = vec![
            tree("(A:0.1,(B:0.1,C:0.1):0.1);"),
            tree("(B:0.1,(A:0.1,C:0.1):0.1);"),
        ];
        assert_eq!(select_best_hypothesis(&unconstrained, &hypos), Ok(0));

        let ns = TaxonNamespace::from_trees(
            std::iter::once(&unconstrained).chain(hypos.iter()),
        )
        .unwrap();
        let a = TreeSnapshot::encode(&unconstrained, &ns).unwrap();
        let b = TreeSnapshot::encode(&hypos[0], &ns).unwrap();
        assert_eq!(euclidean_distance(&a, &b), 0.0);
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        let unconstrained = tree("((A:0.1,B:0.1):0.1,(C:0.1,D:0.1):0.1);");
        // Both candidates are equally far from the reference.
        let hypos = vec![
            tree("((A:0.1,C:0.1):0.1,(B:0.1,D:0.1):0.1);"),
            tree("((A:0.1,C:0.1):0.1,(B:0.1,D:0.1):0.1);"),
        ];
        for _ in 0..10 {
            assert_eq!(select_best_hypothesis(&unconstrained, &hypos), Ok(0));
        }
    }

    #[test]
    fn index_always_in_range() {
        let unconstrained = tree("((A:0.2,B:0.3):0.1,(C:0.4,D:0.5):0.2);");
        let candidates = [
            "((A:0.1,B:0.1):0.1,(C:0.1,D:0.1):0.1);",
            "((A:0.1,C:0.1):0.1,(B:0.1,D:0.1):0.1);",
            "((A:0.1,D:0.1):0.1,(B:0.1,C:0.1):0.1);",
        ];
        for perm in candidates.iter().permutations(3) {
            let hypos: Vec<PhyloTree> = perm.iter().map(|n| tree(n)).collect();
            let best = select_best_hypothesis(&unconstrained, &hypos).unwrap();
            assert!(best < hypos.len());
        }
    }

    #[test]
    fn empty_hypothesis_list_is_an_error() {
        let unconstrained = tree("(A:0.1,(B:0.1,C:0.1):0.1);");
        assert_eq!(
            select_best_hypothesis(&unconstrained, &[]),
            Err(RankError::NoHypotheses)
        );
    }

    #[test]
    fn disjoint_taxa_are_an_error() {
        let unconstrained = tree("(A:0.1,(B:0.1,C:0.1):0.1);");
        let hypos = vec![tree("(X:0.1,(Y:0.1,Z:0.1):0.1);")];
        assert_eq!(
            select_best_hypothesis(&unconstrained, &hypos),
            Err(RankError::DisjointTaxa { index: 0 })
        );
    }

    #[test]
    fn closer_branch_lengths_win_over_topology_order() {
        let unconstrained = tree("((A:1.0,B:1.0):2.0,(C:1.0,D:1.0):2.0);");
        let hypos = vec![
            tree("((A:0.1,C:0.1):0.1,(B:0.1,D:0.1):0.1);"),
            tree("((A:1.0,B:1.0):2.0,(C:1.0,D:1.0):2.0);"),
        ];
        assert_eq!(select_best_hypothesis(&unconstrained, &hypos), Ok(1));
    }
}
