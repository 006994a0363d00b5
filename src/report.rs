//! Run report: the consolidated AU/runtime table, the best-tree file, and
//! the provenance log.
//!
//! Rows are appended and flushed one gene at a time, so an interrupted run
//! leaves a truncated but internally consistent report behind.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::error::RunError;

/// Marker appended to p-values at or below the significance level.
const SIGNIFICANT: char = '*';
/// Marker appended to the hypothesis selected by the distance ranking.
const SELECTED: char = 's';

/// Render one p-value cell with its markers.
///
/// Existing markers are stripped first, so applying the markers twice can
/// never double-append a suffix. The significance marker always precedes
/// the selection marker (`*s`).
pub fn apply_markers(cell: &str, significant: bool, selected: bool) -> String {
    let bare = cell.trim_end_matches([SIGNIFICANT, SELECTED]);
    let mut out = bare.to_string();
    if significant {
        out.push(SIGNIFICANT);
    }
    if selected {
        out.push(SELECTED);
    }
    out
}

/// Annotate one backend's p-value vector (hypothesis index order).
pub fn annotate(values: &[f64], alpha: f64, best_index: usize) -> Vec<String> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| apply_markers(&format!("{v}"), *v <= alpha, i == best_index))
        .collect()
}

/// Header: `gene`, then one column per hypothesis x backend
/// (hypothesis-major), then one runtime
/// column per backend.
pub fn header(backends: &[String], hypothesis_count: usize) -> Vec<String> {
    let mut columns = vec!["gene".to_string()];
    for i in 0..hypothesis_count {
        for backend in backends {
            columns.push(format!("{backend}_hypo{i}"));
        }
    }
    for backend in backends {
        columns.push(format!("runtime_{backend}"));
    }
    columns
}

/// Everything one completed gene contributes to the report.
#[derive(Debug, Clone)]
pub struct GeneRow {
    pub gene: String,
    pub best_index: usize,
    /// Newick of the winning hypothesis tree.
    pub best_newick: String,
    /// Per backend (configured order): AU p-values in hypothesis order,
    /// or `None` when that backend failed for this gene.
    pub au_values: Vec<Option<Vec<f64>>>,
    /// Per backend: wall-clock seconds, when the backend was attempted.
    pub runtimes: Vec<Option<f64>>,
}

/// The append-only run report. One instance per run; concurrent genes
/// funnel through a single serialized writer.
pub struct RunReport {
    table: csv::Writer<File>,
    best_trees: File,
    backends: Vec<String>,
    hypothesis_count: usize,
    alpha: f64,
    rows_written: usize,
}

impl RunReport {
    pub const TABLE_FILE: &'static str = "au_runtime_table.csv";
    pub const BEST_TREE_FILE: &'static str = "best_hypothesis_trees.tre";

    pub fn create(
        summary_dir: &Path,
        backends: Vec<String>,
        hypothesis_count: usize,
        alpha: f64,
    ) -> Result<Self, RunError> {
        let table_path = summary_dir.join(Self::TABLE_FILE);
        let mut table = csv::Writer::from_path(&table_path)?;
        table.write_record(header(&backends, hypothesis_count))?;
        table.flush().map_err(|e| RunError::io("flushing report header", e))?;

        let best_path = summary_dir.join(Self::BEST_TREE_FILE);
        let best_trees = File::create(&best_path)
            .map_err(|e| RunError::io(format!("creating {}", best_path.display()), e))?;

        Ok(RunReport {
            table,
            best_trees,
            backends,
            hypothesis_count,
            alpha,
            rows_written: 0,
        })
    }

    /// Append one gene row and flush, so completed genes survive a crash.
    ///
    /// Missing backend values are written as `NA`; the row is still
    /// emitted as long as the tree search itself succeeded.
    pub fn append(&mut self, row: &GeneRow) -> Result<(), RunError> {
        let annotated: Vec<Option<Vec<String>>> = row
            .au_values
            .iter()
            .map(|values| values.as_ref().map(|v| annotate(v, self.alpha, row.best_index)))
            .collect();

        let mut record = vec![row.gene.clone()];
        for i in 0..self.hypothesis_count {
            for cells in &annotated {
                record.push(match cells {
                    Some(cells) => cells.get(i).cloned().unwrap_or_else(|| "NA".into()),
                    None => "NA".into(),
                });
            }
        }
        for runtime in &row.runtimes {
            record.push(match runtime {
                Some(secs) => format!("{secs:.3}"),
                None => "NA".into(),
            });
        }
        self.table.write_record(&record)?;
        self.table.flush().map_err(|e| RunError::io("flushing report row", e))?;

        writeln!(
            self.best_trees,
            "{}hypo{} {}",
            row.gene, row.best_index, row.best_newick
        )
        .and_then(|_| self.best_trees.flush())
        .map_err(|e| RunError::io("writing best-tree file", e))?;

        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn backends(&self) -> &[String] {
        &self.backends
    }
}

/// Provenance log: resolved parameters and versions once, then every
/// external command actually executed, grouped per gene.
pub struct RunLog {
    file: File,
    path: PathBuf,
}

impl RunLog {
    pub const FILE: &'static str = "log.txt";

    pub fn create(summary_dir: &Path, preamble: &[String]) -> Result<Self, RunError> {
        let path = summary_dir.join(Self::FILE);
        let mut file = File::create(&path)
            .map_err(|e| RunError::io(format!("creating {}", path.display()), e))?;
        for line in preamble {
            writeln!(file, "{line}").map_err(|e| RunError::io("writing run log", e))?;
        }
        file.flush().map_err(|e| RunError::io("flushing run log", e))?;
        Ok(RunLog { file, path })
    }

    /// Append one gene's executed commands.
    pub fn gene_commands(&mut self, gene: &str, commands: &[String]) -> Result<(), RunError> {
        writeln!(self.file, "\n# {gene}\n{}", commands.iter().join("\n"))
            .and_then(|_| self.file.flush())
            .map_err(|e| RunError::io(format!("writing {}", self.path.display()), e))
    }
}
