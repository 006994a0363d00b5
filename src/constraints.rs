//! Loading the global constraint file and pruning hypotheses per gene.
//!
//! The constraint file holds one or more `;`-terminated Newick topologies.
//! Their file order defines the hypothesis indices (`hypo0`, `hypo1`, ...)
//! used in every downstream table, so the loader never reorders.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::RunError;
use crate::topology::Clade;

/// Read all hypothesis topologies from one Newick-family file.
///
/// A hypothesis definition may span several lines, so the whole file is
/// concatenated before splitting on the `;` terminator. Every topology is
/// derooted on load; rooting carries no meaning for the distance ranking.
/// Any unparseable segment aborts the run: a malformed constraint file
/// invalidates every gene.
pub fn load_constraints(path: &Path) -> Result<Vec<Clade>, RunError> {
    let text = fs::read_to_string(path)
        .map_err(|e| RunError::io(format!("reading constraint file {}", path.display()), e))?;

    let joined: String = text.lines().map(str::trim).collect();
    let mut segments: Vec<&str> = joined.split(';').collect();
    // A final terminator leaves one trailing empty segment; drop it.
    if segments.last().is_some_and(|s| s.trim().is_empty()) {
        segments.pop();
    }

    if segments.is_empty() {
        return Err(RunError::ConstraintParse {
            path: path.to_path_buf(),
            reason: "file contains no topologies".into(),
        });
    }

    let mut constraints = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        let clade = Clade::from_newick(segment).map_err(|e| RunError::ConstraintParse {
            path: path.to_path_buf(),
            reason: format!("hypothesis {index}: {e}"),
        })?;
        constraints.push(clade.deroot());
    }
    log::info!(
        "loaded {} hypothesis topologies from {}",
        constraints.len(),
        path.display()
    );
    Ok(constraints)
}

/// Intersect constraint-tree labels with the taxa of one alignment.
///
/// Every removed label is logged, along with the removed count. If the
/// alignment cannot be read or recognized this fails softly: a warning is
/// logged and the input labels come back unchanged, leaving the skip
/// decision to the caller.
pub fn kept_labels(all_labels: &[String], alignment: &Path) -> Vec<String> {
    let present = match crate::alignment::alignment_labels(alignment) {
        Ok(labels) => labels,
        Err(e) => {
            log::warn!(
                "cannot read taxa from {}; keeping all constraint taxa: {e}",
                alignment.display()
            );
            return all_labels.to_vec();
        }
    };

    let mut removed = 0usize;
    let kept: Vec<String> = all_labels
        .iter()
        .filter(|label| {
            if present.contains(*label) {
                true
            } else {
                log::info!("removed taxon: {label}");
                removed += 1;
                false
            }
        })
        .cloned()
        .collect();
    log::info!("number of removed taxa: {removed}");
    kept
}

/// Restrict one hypothesis to the taxa present in a gene's alignment.
///
/// Pruning can leave a degree-2 top node, so the result is derooted again.
/// `None` means the hypothesis shares no taxon with the alignment.
pub fn prune_for_gene(constraint: &Clade, alignment_taxa: &HashSet<String>) -> Option<Clade> {
    constraint.prune(alignment_taxa).map(Clade::deroot)
}
