//! ML tree-search and AU-test engines.
//!
//! Backend selection is a closed set of variants, resolved once at
//! configuration time; each variant builds its own command lines and knows
//! where its output lands. The free-form text parsers at the bottom are the
//! boundary contract with each tool and have to stay synchronized with the
//! tool's actual output format.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GeneError, RunError};
use crate::exec::{self, CommandSpec};

/// The two RAxML command-line dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaxmlFlavor {
    /// Classic `raxmlHPC` (-s/-n/-m/-w flags).
    Standard,
    /// RAxML-NG (--msa/--prefix/--model flags).
    Ng,
}

/// Detect the RAxML dialect by running `<path> -v`.
pub fn detect_raxml(path: &str) -> Result<(String, RaxmlFlavor), RunError> {
    let out = exec::run(&CommandSpec::new(path).arg("-v"), None, true)
        .map_err(|e| RunError::Config(format!("cannot query RAxML version: {e}")))?;
    for line in out.stdout.lines() {
        if line.contains("RAxML-NG") {
            return Ok((line.trim().to_string(), RaxmlFlavor::Ng));
        }
        if line.contains("RAxML version") {
            return Ok((line.trim().to_string(), RaxmlFlavor::Standard));
        }
    }
    Err(RunError::Config(format!(
        "the RAxML executable '{path}' is not supported (no recognizable version line)"
    )))
}

/// Detect an IQ-TREE executable by the `version` line of `<path> -v`.
pub fn detect_iqtree(path: &str) -> Result<String, RunError> {
    let out = exec::run(&CommandSpec::new(path).arg("-v"), None, true)
        .map_err(|e| RunError::Config(format!("cannot query IQ-TREE version: {e}")))?;
    out.stdout
        .lines()
        .find(|line| line.contains("version"))
        .map(|line| line.trim().to_string())
        .ok_or_else(|| {
            RunError::Config(format!(
                "the IQ-TREE executable '{path}' is not supported (no version line)"
            ))
        })
}

/// Model identifier for IQ-TREE invocations. `--model` follows RAxML's
/// naming (e.g. `GTRGAMMAI`), which IQ-TREE rejects, so IQ-TREE always
/// runs under its own spelling of the same model.
pub const IQTREE_MODEL: &str = "GTR+I+G";

/// Deterministic per-gene 5-digit seed, so identical inputs reproduce
/// identical searches and command lines.
fn seed_for(gene: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    gene.hash(&mut hasher);
    hasher.finish() % 90_000 + 10_000
}

/// Everything an engine invocation needs for one gene, passed explicitly;
/// output locations are never derived from ambient process state.
#[derive(Debug, Clone, Copy)]
pub struct GeneJob<'a> {
    pub gene: &'a str,
    /// Normalized FASTA inside the gene's working directory.
    pub alignment: &'a Path,
    /// Per-gene working directory; all intermediate files live here.
    pub workdir: &'a Path,
    pub model: &'a str,
    pub threads: usize,
    pub timeout: Option<Duration>,
}

/// Maximum-likelihood tree-search engine.
#[derive(Debug, Clone)]
pub enum MlEngine {
    RaxmlStandard { path: String, outgroup: Option<String> },
    RaxmlNg { path: String },
    IqTree { path: String },
}

impl MlEngine {
    pub fn name(&self) -> &'static str {
        match self {
            MlEngine::RaxmlStandard { .. } | MlEngine::RaxmlNg { .. } => "RAxML",
            MlEngine::IqTree { .. } => "IQTree",
        }
    }

    /// Run the unconstrained search and return the best-tree Newick path.
    pub fn search_unconstrained(
        &self,
        job: &GeneJob<'_>,
        commands: &mut Vec<String>,
    ) -> Result<PathBuf, GeneError> {
        let (spec, best_tree) = self.build_search(job, None);
        commands.push(spec.render());
        exec::run_expecting_file(&spec, job.timeout, &best_tree)?;
        Ok(best_tree)
    }

    /// Run one constrained search for hypothesis `index`.
    ///
    /// RAxML-NG rejects some constraints outright; when that happens the
    /// search falls back to `--evaluate` on the fixed constraint topology.
    pub fn search_constrained(
        &self,
        job: &GeneJob<'_>,
        index: usize,
        constraint: &Path,
        commands: &mut Vec<String>,
    ) -> Result<PathBuf, GeneError> {
        let (spec, best_tree) = self.build_search(job, Some((index, constraint)));
        commands.push(spec.render());
        match exec::run_expecting_file(&spec, job.timeout, &best_tree) {
            Ok(()) => Ok(best_tree),
            Err(first_err) => {
                if let MlEngine::RaxmlNg { path } = self {
                    let prefix = job.workdir.join(format!(
                        "RAxML_hypothesis{index}_{}_eval",
                        job.gene
                    ));
                    let spec = CommandSpec::new(path)
                        .arg("--msa")
                        .arg_path(job.alignment)
                        .arg("--prefix")
                        .arg_path(&prefix)
                        .arg("--model")
                        .arg(job.model)
                        .arg("--evaluate")
                        .arg("--tree")
                        .arg_path(constraint)
                        .arg("--seed")
                        .arg(seed_for(job.gene).to_string())
                        .arg("--threads")
                        .arg(job.threads.to_string());
                    let best_tree = PathBuf::from(format!("{}.raxml.bestTree", prefix.display()));
                    commands.push(spec.render());
                    exec::run_expecting_file(&spec, job.timeout, &best_tree)?;
                    Ok(best_tree)
                } else {
                    Err(first_err)
                }
            }
        }
    }

    fn build_search(
        &self,
        job: &GeneJob<'_>,
        constraint: Option<(usize, &Path)>,
    ) -> (CommandSpec, PathBuf) {
        match self {
            MlEngine::RaxmlStandard { path, outgroup } => {
                let run_name = match constraint {
                    None => format!("withoutConstraints_{}", job.gene),
                    Some((i, _)) => format!("hypothesis{i}_{}", job.gene),
                };
                let mut spec = CommandSpec::new(path)
                    .arg("-s")
                    .arg_path(job.alignment)
                    .arg("-n")
                    .arg(&run_name)
                    .arg("-m")
                    .arg(job.model);
                if let Some((_, file)) = constraint {
                    spec = spec.arg("-g").arg_path(file);
                }
                spec = spec
                    .arg("-p")
                    .arg(seed_for(job.gene).to_string())
                    .arg("-f")
                    .arg("d")
                    .arg("-w")
                    .arg_path(job.workdir)
                    .arg("-T")
                    .arg(job.threads.to_string())
                    .arg("--silent");
                if let Some(outgroup) = outgroup {
                    spec = spec.arg("-o").arg(outgroup);
                }
                let best = job.workdir.join(format!("RAxML_bestTree.{run_name}"));
                (spec, best)
            }
            MlEngine::RaxmlNg { path } => {
                let prefix = match constraint {
                    None => job.workdir.join(format!("RAxML_withoutConstraints_{}", job.gene)),
                    Some((i, _)) => job.workdir.join(format!("RAxML_hypothesis{i}_{}", job.gene)),
                };
                let mut spec = CommandSpec::new(path)
                    .arg("--msa")
                    .arg_path(job.alignment)
                    .arg("--prefix")
                    .arg_path(&prefix)
                    .arg("--model")
                    .arg(job.model);
                if let Some((_, file)) = constraint {
                    spec = spec.arg("--tree-constraint").arg_path(file);
                }
                spec = spec
                    .arg("--seed")
                    .arg(seed_for(job.gene).to_string())
                    .arg("--threads")
                    .arg(job.threads.to_string());
                let best = PathBuf::from(format!("{}.raxml.bestTree", prefix.display()));
                (spec, best)
            }
            MlEngine::IqTree { path } => {
                let prefix = match constraint {
                    None => job.workdir.join(format!("{}_IQTree_unconst", job.gene)),
                    Some((i, _)) => job.workdir.join(format!("{}_IQTree_hypo{i}", job.gene)),
                };
                let mut spec = CommandSpec::new(path)
                    .arg("-s")
                    .arg_path(job.alignment)
                    .arg("-m")
                    .arg(IQTREE_MODEL);
                if let Some((_, file)) = constraint {
                    spec = spec.arg("-g").arg_path(file);
                }
                spec = spec
                    .arg("-pre")
                    .arg_path(&prefix)
                    .arg("-quiet")
                    .arg("-nt")
                    .arg(job.threads.to_string());
                let best = PathBuf::from(format!("{}.treefile", prefix.display()));
                (spec, best)
            }
        }
    }
}

/// Approximately-Unbiased test engine.
#[derive(Debug, Clone)]
pub enum AuEngine {
    /// CONSEL suite; per-site log-likelihoods come from RAxML.
    Consel { consel_dir: PathBuf, raxml_path: String, flavor: RaxmlFlavor },
    IqTree { path: String },
    IqTree2 { path: String },
}

/// Inputs shared by every AU invocation of one gene.
#[derive(Debug, Clone, Copy)]
pub struct AuJob<'a> {
    pub gene_job: &'a GeneJob<'a>,
    /// Combined tree file: unconstrained first, then hypothesis order.
    pub combined: &'a Path,
    /// Unconstrained best-tree file.
    pub unconstrained: &'a Path,
    /// Number of trees in the combined file (hypotheses + 1).
    pub tree_count: usize,
    pub bootstrap_replicates: u32,
}

impl AuEngine {
    /// Name used in report columns and in the `--au-inference` selector.
    pub fn name(&self) -> &'static str {
        match self {
            AuEngine::Consel { .. } => "CONSEL",
            AuEngine::IqTree { .. } => "IQTree",
            AuEngine::IqTree2 { .. } => "IQTree2",
        }
    }

    /// Run the AU test over all trees of the combined file.
    ///
    /// Returns one p-value per tree, aligned to combined-file order (index
    /// 0 is the unconstrained tree). A vector of the wrong length is a
    /// parse error: the tool reordered or dropped trees and the per-index
    /// alignment the report depends on would be silently wrong.
    pub fn run(&self, job: &AuJob<'_>, commands: &mut Vec<String>) -> Result<Vec<f64>, GeneError> {
        let values = match self {
            AuEngine::Consel { consel_dir, raxml_path, flavor } => {
                self.run_consel(job, consel_dir, raxml_path, *flavor, commands)?
            }
            AuEngine::IqTree { path } | AuEngine::IqTree2 { path } => {
                self.run_iqtree(job, path, commands)?
            }
        };
        if values.len() != job.tree_count {
            return Err(GeneError::Parse(format!(
                "{} reported {} AU values for {} trees; refusing misaligned output",
                self.name(),
                values.len(),
                job.tree_count
            )));
        }
        Ok(values)
    }

    fn run_iqtree(
        &self,
        job: &AuJob<'_>,
        path: &str,
        commands: &mut Vec<String>,
    ) -> Result<Vec<f64>, GeneError> {
        let (spec, report) = self.build_iqtree_au(job, path);
        commands.push(spec.render());
        exec::run(&spec, job.gene_job.timeout, false)?;

        let text = fs::read_to_string(&report)
            .map_err(|e| GeneError::io(format!("reading {}", report.display()), e))?;
        parse_iqtree_au(&text)
    }

    fn build_iqtree_au(&self, job: &AuJob<'_>, path: &str) -> (CommandSpec, PathBuf) {
        let gj = job.gene_job;
        let prefix = gj.workdir.join(format!("{}_{}", gj.gene, self.name()));
        let spec = CommandSpec::new(path)
            .arg("-s")
            .arg_path(gj.alignment)
            .arg("-m")
            .arg(IQTREE_MODEL)
            .arg("-z")
            .arg_path(job.combined)
            .arg("-te")
            .arg_path(job.unconstrained)
            .arg("-zb")
            .arg(job.bootstrap_replicates.to_string())
            .arg("-au")
            .arg("-pre")
            .arg_path(&prefix)
            .arg("-quiet")
            .arg("-nt")
            .arg(gj.threads.to_string());
        let report = PathBuf::from(format!("{}.iqtree", prefix.display()));
        (spec, report)
    }

    fn run_consel(
        &self,
        job: &AuJob<'_>,
        consel_dir: &Path,
        raxml_path: &str,
        flavor: RaxmlFlavor,
        commands: &mut Vec<String>,
    ) -> Result<Vec<f64>, GeneError> {
        let gj = job.gene_job;

        // RAxML may have written a reduced alignment (invariable columns
        // stripped); prefer it for the site-likelihood pass.
        let reduced = PathBuf::from(format!("{}.reduced", gj.alignment.display()));
        let alignment = if reduced.is_file() { reduced.as_path() } else { gj.alignment };

        let sitelh = match flavor {
            RaxmlFlavor::Standard => {
                let run_name = format!("{}.trees.sitelh", gj.gene);
                let spec = CommandSpec::new(raxml_path)
                    .arg("-s")
                    .arg_path(alignment)
                    .arg("-n")
                    .arg(&run_name)
                    .arg("-m")
                    .arg(gj.model)
                    .arg("-f")
                    .arg("g")
                    .arg("-t")
                    .arg_path(job.unconstrained)
                    .arg("-z")
                    .arg_path(job.combined)
                    .arg("-p")
                    .arg(seed_for(gj.gene).to_string())
                    .arg("-w")
                    .arg_path(gj.workdir)
                    .arg("-T")
                    .arg(gj.threads.to_string())
                    .arg("--silent");
                let out = gj.workdir.join(format!("RAxML_perSiteLLs.{run_name}"));
                commands.push(spec.render());
                exec::run_expecting_file(&spec, gj.timeout, &out)?;
                out
            }
            RaxmlFlavor::Ng => {
                let prefix = gj.workdir.join(format!("RAxML_{}", gj.gene));
                let spec = CommandSpec::new(raxml_path)
                    .arg("--msa")
                    .arg_path(alignment)
                    .arg("--prefix")
                    .arg_path(&prefix)
                    .arg("--model")
                    .arg(gj.model)
                    .arg("--sitelh")
                    .arg("--tree")
                    .arg_path(job.combined)
                    .arg("--seed")
                    .arg(seed_for(gj.gene).to_string())
                    .arg("--threads")
                    .arg(gj.threads.to_string());
                let out = PathBuf::from(format!("{}.raxml.siteLH", prefix.display()));
                commands.push(spec.render());
                exec::run_expecting_file(&spec, gj.timeout, &out)?;
                out
            }
        };

        let mt = gj.workdir.join(format!("{}_CONSEL.mt", gj.gene));
        let rmt = gj.workdir.join(format!("{}_CONSEL.rmt", gj.gene));
        let pv = gj.workdir.join(format!("{}_CONSEL.pv", gj.gene));

        let seqmt = CommandSpec::new(consel_dir.join("seqmt").display().to_string())
            .arg("--puzzle")
            .arg_path(&sitelh)
            .arg_path(&mt);
        commands.push(seqmt.render());
        exec::run(&seqmt, gj.timeout, false)?;

        let makermt = CommandSpec::new(consel_dir.join("makermt").display().to_string())
            .arg_path(&mt);
        commands.push(makermt.render());
        exec::run(&makermt, gj.timeout, false)?;

        let consel = CommandSpec::new(consel_dir.join("consel").display().to_string())
            .arg_path(&rmt);
        commands.push(consel.render());
        exec::run(&consel, gj.timeout, false)?;

        let catpv = CommandSpec::new(consel_dir.join("catpv").display().to_string())
            .arg_path(&pv);
        commands.push(catpv.render());
        let out = exec::run(&catpv, gj.timeout, true)?;

        // Keep the table on disk next to the other CONSEL intermediates.
        let table = gj.workdir.join(format!("{}_CONSEL.consel", gj.gene));
        fs::write(&table, &out.stdout)
            .map_err(|e| GeneError::io(format!("writing {}", table.display()), e))?;

        parse_consel_au(&out.stdout, job.tree_count)
    }
}

/// Parse AU p-values from CONSEL's `catpv` table.
///
/// The table starts after three header lines; each row reads
/// `#  rank  item  obs  au  np | ...`, so field 2 is the 1-based tree
/// (item) number and field 4 the AU value. Rows come rank-ordered and are
/// re-placed by item number.
pub fn parse_consel_au(text: &str, tree_count: usize) -> Result<Vec<f64>, GeneError> {
    let mut values = vec![None; tree_count];
    for line in text.lines().skip(3).take(tree_count) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let item: usize = fields
            .get(2)
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| GeneError::Parse(format!("unparseable CONSEL row: '{line}'")))?;
        let au: f64 = fields
            .get(4)
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| GeneError::Parse(format!("unparseable CONSEL row: '{line}'")))?;
        if item == 0 || item > tree_count {
            return Err(GeneError::Parse(format!(
                "CONSEL item number {item} outside 1..={tree_count}"
            )));
        }
        values[item - 1] = Some(au);
    }
    values
        .into_iter()
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| GeneError::Parse("CONSEL table is missing tree rows".into()))
}

/// Row separator preceding the tree-ranking table in `.iqtree` reports.
const IQTREE_TABLE_SEPARATOR: &str =
    "-------------------------------------------------------------------------";

/// Parse AU p-values (the `p-AU` column, field 11) from an `.iqtree`
/// report: everything up to the dashed separator is skipped, then rows are
/// consumed until one no longer parses.
pub fn parse_iqtree_au(text: &str) -> Result<Vec<f64>, GeneError> {
    let mut lines = text.lines();
    let mut found = false;
    for line in lines.by_ref() {
        if line.trim() == IQTREE_TABLE_SEPARATOR {
            found = true;
            break;
        }
    }
    if !found {
        return Err(GeneError::Parse(
            "IQ-TREE report has no tree-ranking table".into(),
        ));
    }

    let mut values = Vec::new();
    for line in lines {
        match line.split_whitespace().nth(11).and_then(|f| f.parse::<f64>().ok()) {
            Some(v) => values.push(v),
            None => break,
        }
    }
    if values.is_empty() {
        return Err(GeneError::Parse(
            "IQ-TREE tree-ranking table has no parseable rows".into(),
        ));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_are_deterministic_and_five_digits() {
        assert_eq!(seed_for("rbcL"), seed_for("rbcL"));
        let s = seed_for("matK");
        assert!((10_000..100_000).contains(&s));
    }

    #[test]
    fn raxml_standard_command_shape() {
        let engine = MlEngine::RaxmlStandard {
            path: "raxmlHPC".into(),
            outgroup: Some("Cyanophora".into()),
        };
        let job = GeneJob {
            gene: "rbcL",
            alignment: Path::new("/work/rbcL/rbcL.fasta"),
            workdir: Path::new("/work/rbcL"),
            model: "GTRGAMMAI",
            threads: 4,
            timeout: None,
        };
        let (spec, best) = engine.build_search(&job, None);
        let line = spec.render();
        assert!(line.starts_with("raxmlHPC -s /work/rbcL/rbcL.fasta -n withoutConstraints_rbcL"));
        assert!(line.contains("-m GTRGAMMAI"));
        assert!(line.contains("-w /work/rbcL"));
        assert!(line.contains("-T 4"));
        assert!(line.ends_with("-o Cyanophora"));
        assert_eq!(best, Path::new("/work/rbcL/RAxML_bestTree.withoutConstraints_rbcL"));

        let (spec, best) = engine.build_search(&job, Some((1, Path::new("/work/rbcL/hypo1.tre"))));
        assert!(spec.render().contains("-g /work/rbcL/hypo1.tre"));
        assert_eq!(best, Path::new("/work/rbcL/RAxML_bestTree.hypothesis1_rbcL"));
    }

    #[test]
    fn raxml_ng_command_shape() {
        let engine = MlEngine::RaxmlNg { path: "raxml-ng".into() };
        let job = GeneJob {
            gene: "matK",
            alignment: Path::new("/work/matK/matK.fasta"),
            workdir: Path::new("/work/matK"),
            model: "GTR+G",
            threads: 2,
            timeout: None,
        };
        let (spec, best) = engine.build_search(&job, Some((0, Path::new("/work/matK/hypo0.tre"))));
        let line = spec.render();
        assert!(line.contains("--msa /work/matK/matK.fasta"));
        assert!(line.contains("--tree-constraint /work/matK/hypo0.tre"));
        assert_eq!(
            best,
            Path::new("/work/matK/RAxML_hypothesis0_matK.raxml.bestTree")
        );
    }

    #[test]
    fn iqtree_command_shape() {
        let engine = MlEngine::IqTree { path: "iqtree".into() };
        let job = GeneJob {
            gene: "psbA",
            alignment: Path::new("/work/psbA/psbA.fasta"),
            workdir: Path::new("/work/psbA"),
            model: "GTRGAMMAI",
            threads: 1,
            timeout: None,
        };
        let (spec, best) = engine.build_search(&job, None);
        let line = spec.render();
        assert!(line.contains("-pre /work/psbA/psbA_IQTree_unconst"));
        assert!(line.contains("-quiet"));
        // The RAxML model spelling never reaches IQ-TREE.
        assert!(line.contains("-m GTR+I+G"));
        assert!(!line.contains("GTRGAMMAI"));
        assert_eq!(best, Path::new("/work/psbA/psbA_IQTree_unconst.treefile"));
    }

    #[test]
    fn iqtree_au_command_uses_its_own_model() {
        let engine = AuEngine::IqTree { path: "iqtree".into() };
        let gene_job = GeneJob {
            gene: "rbcL",
            alignment: Path::new("/work/rbcL/rbcL.fasta"),
            workdir: Path::new("/work/rbcL"),
            model: "GTRGAMMAI",
            threads: 2,
            timeout: None,
        };
        let job = AuJob {
            gene_job: &gene_job,
            combined: Path::new("/work/rbcL/rbcL_COMBINED.tre"),
            unconstrained: Path::new("/work/rbcL/best.tre"),
            tree_count: 3,
            bootstrap_replicates: 10_000,
        };
        let (spec, report) = engine.build_iqtree_au(&job, "iqtree");
        let line = spec.render();
        assert!(line.contains("-m GTR+I+G"));
        assert!(!line.contains("GTRGAMMAI"));
        assert!(line.contains("-z /work/rbcL/rbcL_COMBINED.tre"));
        assert!(line.contains("-zb 10000"));
        assert_eq!(report, Path::new("/work/rbcL/rbcL_IQTree.iqtree"));
    }

    #[test]
    fn consel_table_parses_by_item_number() {
        // catpv orders rows by rank, not by tree number; values must land
        // at their item index.
        let text = "\
# reading gene1_CONSEL.pv

# rank item    obs     au     np |     bp     pp     kh     sh    wkh    wsh |
#    1    2   -2.7  0.874  0.752 |  0.745  1.000  0.761  0.897  0.761  0.926 |
#    2    1    2.7  0.126  0.248 |  0.255  4e-05  0.239  0.239  0.239  0.239 |
#    3    3    9.8  0.042  0.012 |  0.010  2e-09  0.051  0.063  0.051  0.063 |
";
        let values = parse_consel_au(text, 3).unwrap();
        assert_eq!(values, vec![0.126, 0.874, 0.042]);
    }

    #[test]
    fn consel_table_with_missing_rows_is_a_parse_error() {
        let text = "\
# reading gene1_CONSEL.pv

# rank item    obs     au     np |
#    1    2   -2.7  0.874  0.752 |
";
        assert!(matches!(
            parse_consel_au(text, 3),
            Err(GeneError::Parse(_))
        ));
    }

    #[test]
    fn iqtree_report_parses_p_au_column() {
        let text = "\
USER TREES
----------

See trees.tre for trees with branch lengths.

Tree      logL    deltaL  bp-RELL    p-KH     p-SH       c-ELW       p-AU
-------------------------------------------------------------------------
  1 -4586.07561       0   0.713 +  0.767 +      1 +     0.704 +    0.786 +
  2 -4590.33945  4.2638   0.287 +  0.233 +  0.233 +     0.296 +    0.214 +
  3 -4601.11945  15.044  0.0001 - 0.0045 - 0.0045 -   0.000779 -   0.0019 -

deltaL  : logL difference from the maximal logl in the set.
";
        let values = parse_iqtree_au(text).unwrap();
        assert_eq!(values, vec![0.786, 0.214, 0.0019]);
    }

    #[test]
    fn iqtree_report_without_table_is_a_parse_error() {
        assert!(matches!(
            parse_iqtree_au("no table here\n"),
            Err(GeneError::Parse(_))
        ));
    }
}
