//! Per-gene orchestration and the run driver.
//!
//! One gene moves through a fixed sequence: normalize the alignment, prune
//! every hypothesis to the gene's taxa, run the unconstrained and
//! constrained tree searches, rank the hypotheses by bipartition distance,
//! then hand the combined tree file to each configured AU backend. A gene
//! that fails at any stage is logged and dropped; the run continues.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use phylotree::tree::Tree as PhyloTree;
use rayon::prelude::*;

use crate::alignment::{self, AlignmentFormat};
use crate::backends::{AuEngine, AuJob, GeneJob, MlEngine, RaxmlFlavor, detect_iqtree, detect_raxml};
use crate::config::{AuChoice, MlChoice, RunConfig};
use crate::constraints;
use crate::error::{GeneError, RunError};
use crate::ranking;
use crate::report::{GeneRow, RunLog, RunReport};
use crate::topology::Clade;

/// Subdirectory of the output folder holding the run-level artifacts.
pub const SUMMARY_DIR: &str = "SUMMARY";

/// The resolved backend set for one run: versions are probed once, before
/// any gene work, so a broken executable path fails the run immediately.
pub struct Engines {
    pub ml: MlEngine,
    pub au: Vec<AuEngine>,
    /// Version lines recorded in the provenance log.
    pub versions: Vec<String>,
}

/// Probe the configured executables and build the engine set.
pub fn resolve_engines(cfg: &RunConfig) -> Result<Engines, RunError> {
    let mut versions = Vec::new();

    let raxml = if cfg.needs_raxml() {
        let (version, flavor) = detect_raxml(&cfg.raxml_path)?;
        versions.push(version);
        Some(flavor)
    } else {
        None
    };
    if cfg.needs_iqtree() {
        versions.push(detect_iqtree(&cfg.iqtree_path)?);
    }
    if cfg.au_inference.contains(&AuChoice::IqTree2) {
        let path = cfg
            .iqtree2_path
            .as_deref()
            .ok_or_else(|| RunError::Config("IQTree2 selected but no --path-iqtree2".into()))?;
        versions.push(detect_iqtree(path)?);
    }

    let ml = match cfg.ml_inference {
        MlChoice::Raxml => {
            let flavor = raxml
                .ok_or_else(|| RunError::Config("RAxML selected but not probed".into()))?;
            match flavor {
                RaxmlFlavor::Standard => MlEngine::RaxmlStandard {
                    path: cfg.raxml_path.clone(),
                    outgroup: cfg.outgroup.clone(),
                },
                RaxmlFlavor::Ng => {
                    if cfg.outgroup.is_some() {
                        log::warn!("RAxML-NG has no outgroup flag; --outgroup is ignored");
                    }
                    MlEngine::RaxmlNg { path: cfg.raxml_path.clone() }
                }
            }
        }
        MlChoice::IqTree => MlEngine::IqTree { path: cfg.iqtree_path.clone() },
    };

    let mut au = Vec::with_capacity(cfg.au_inference.len());
    for choice in &cfg.au_inference {
        au.push(match choice {
            AuChoice::Consel => AuEngine::Consel {
                consel_dir: cfg
                    .consel_path
                    .clone()
                    .ok_or_else(|| RunError::Config("CONSEL selected but no --path-consel".into()))?,
                raxml_path: cfg.raxml_path.clone(),
                flavor: raxml
                    .ok_or_else(|| RunError::Config("CONSEL needs a probed RAxML".into()))?,
            },
            AuChoice::IqTree => AuEngine::IqTree { path: cfg.iqtree_path.clone() },
            AuChoice::IqTree2 => AuEngine::IqTree2 {
                path: cfg
                    .iqtree2_path
                    .clone()
                    .ok_or_else(|| RunError::Config("IQTree2 selected but no --path-iqtree2".into()))?,
            },
        });
    }

    Ok(Engines { ml, au, versions })
}

/// How one gene ended.
#[derive(Debug)]
pub enum GeneOutcome {
    Completed(GeneRow),
    /// Nothing to analyze (empty or unreadable alignment).
    Skipped { reason: String },
    /// Analysis started but a stage failed.
    Failed { reason: String },
}

/// Run-level tallies, returned to the caller after the report is complete.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub genes_total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Execute the whole run: every supported alignment in the input directory
/// against every hypothesis of the constraint file.
pub fn run(cfg: &RunConfig) -> Result<RunSummary, RunError> {
    cfg.validate()?;
    let engines = resolve_engines(cfg)?;
    let constraints = constraints::load_constraints(&cfg.constraint_file)?;
    let genes = scan_alignment_dir(&cfg.alignment_dir)?;
    if genes.is_empty() {
        return Err(RunError::Config(format!(
            "no supported alignment files in {}",
            cfg.alignment_dir.display()
        )));
    }
    log::info!(
        "{} genes x {} hypotheses, ML by {}, AU by {}",
        genes.len(),
        constraints.len(),
        engines.ml.name(),
        engines.au.iter().map(AuEngine::name).collect::<Vec<_>>().join(";")
    );

    let summary_dir = cfg.output_dir.join(SUMMARY_DIR);
    fs::create_dir_all(&summary_dir)
        .map_err(|e| RunError::io(format!("creating {}", summary_dir.display()), e))?;

    let mut preamble = cfg.describe();
    preamble.extend(engines.versions.iter().cloned());

    let backend_names: Vec<String> = engines.au.iter().map(|e| e.name().to_string()).collect();
    let report = Mutex::new(RunReport::create(
        &summary_dir,
        backend_names,
        constraints.len(),
        cfg.alpha_level,
    )?);
    let run_log = Mutex::new(RunLog::create(&summary_dir, &preamble)?);

    let genes_total = genes.len();
    let done = AtomicUsize::new(0);
    let tallies = Mutex::new(RunSummary { genes_total, ..RunSummary::default() });
    let write_error: Mutex<Option<RunError>> = Mutex::new(None);

    // jobs = 1 keeps gene processing strictly sequential.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.jobs.max(1))
        .build()
        .map_err(|e| RunError::Config(format!("cannot build worker pool: {e}")))?;

    pool.install(|| {
        genes.par_iter().for_each(|(gene, path)| {
            let (commands, outcome) = process_gene(gene, path, cfg, &engines, &constraints);
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;

            if !commands.is_empty() {
                if let Err(e) = run_log.lock().unwrap().gene_commands(gene, &commands) {
                    write_error.lock().unwrap().get_or_insert(e);
                }
            }

            let mut tallies = tallies.lock().unwrap();
            match outcome {
                GeneOutcome::Completed(row) => {
                    match report.lock().unwrap().append(&row) {
                        Ok(()) => tallies.completed += 1,
                        Err(e) => {
                            write_error.lock().unwrap().get_or_insert(e);
                        }
                    }
                    log::info!("{gene}: done ({finished}/{genes_total})");
                }
                GeneOutcome::Skipped { reason } => {
                    tallies.skipped += 1;
                    log::warn!("{gene}: skipped ({finished}/{genes_total}): {reason}");
                }
                GeneOutcome::Failed { reason } => {
                    tallies.failed += 1;
                    log::error!("{gene}: failed ({finished}/{genes_total}): {reason}");
                }
            }
        });
    });

    if let Some(e) = write_error.into_inner().unwrap() {
        return Err(e);
    }
    let summary = tallies.into_inner().unwrap();
    log::info!(
        "run finished: {} completed, {} skipped, {} failed of {}",
        summary.completed,
        summary.skipped,
        summary.failed,
        summary.genes_total
    );
    Ok(summary)
}

/// Collect `(gene, path)` pairs from the alignment directory, sorted by
/// gene name so gene indices and log order are stable across runs.
/// Files with unsupported extensions are logged and skipped; two files
/// mapping to the same gene name abort the run.
pub fn scan_alignment_dir(dir: &Path) -> Result<Vec<(String, PathBuf)>, RunError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| RunError::io(format!("reading alignment directory {}", dir.display()), e))?;

    let mut genes = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| RunError::io(format!("reading alignment directory {}", dir.display()), e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match AlignmentFormat::from_path(&path) {
            Ok(_) => {
                let gene = entry
                    .file_name()
                    .to_string_lossy()
                    .split('.')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                if gene.is_empty() {
                    log::warn!("skipping {}: empty gene name", path.display());
                } else {
                    genes.push((gene, path));
                }
            }
            Err(e) => log::warn!("skipping {}: {e}", path.display()),
        }
    }
    genes.sort();
    // Gene names key the working directories, so two files with the same
    // stem would write into one directory and clobber each other's
    // intermediates.
    for pair in genes.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(RunError::Config(format!(
                "alignment files {} and {} both map to gene name '{}'; rename one of them",
                pair[0].1.display(),
                pair[1].1.display(),
                pair[0].0
            )));
        }
    }
    Ok(genes)
}

/// Drive one gene and classify its error, if any. Empty or unrecognized
/// alignments are skips; anything after analysis has started is a failure.
pub fn process_gene(
    gene: &str,
    source: &Path,
    cfg: &RunConfig,
    engines: &Engines,
    constraints: &[Clade],
) -> (Vec<String>, GeneOutcome) {
    let mut commands = Vec::new();
    let outcome = match run_gene(gene, source, cfg, engines, constraints, &mut commands) {
        Ok(row) => GeneOutcome::Completed(row),
        Err(e @ (GeneError::EmptyAlignment | GeneError::Format(_))) => {
            GeneOutcome::Skipped { reason: e.to_string() }
        }
        Err(e) => GeneOutcome::Failed { reason: e.to_string() },
    };
    (commands, outcome)
}

fn run_gene(
    gene: &str,
    source: &Path,
    cfg: &RunConfig,
    engines: &Engines,
    constraints: &[Clade],
    commands: &mut Vec<String>,
) -> Result<GeneRow, GeneError> {
    let workdir = cfg.output_dir.join(gene);
    fs::create_dir_all(&workdir)
        .map_err(|e| GeneError::io(format!("creating {}", workdir.display()), e))?;

    // Normalize to FASTA; every external tool sees only this copy.
    let records = alignment::usable_records(alignment::read_alignment(source)?);
    if records.is_empty() {
        return Err(GeneError::EmptyAlignment);
    }
    let fasta = workdir.join(format!("{gene}.fasta"));
    alignment::write_fasta(&fasta, &records)?;

    // Prune each hypothesis to the gene's taxa and write it out.
    let mut hypothesis_files = Vec::with_capacity(constraints.len());
    for (index, constraint) in constraints.iter().enumerate() {
        let labels: Vec<String> = constraint.leaf_labels().into_iter().collect();
        let kept: HashSet<String> =
            constraints::kept_labels(&labels, &fasta).into_iter().collect();
        let pruned = constraints::prune_for_gene(constraint, &kept)
            .filter(|p| p.leaf_count() >= 2)
            .ok_or(GeneError::EmptyConstraint { index })?;
        let file = workdir.join(format!("hypothesis{index}.tre"));
        fs::write(&file, format!("{}\n", pruned.to_newick()))
            .map_err(|e| GeneError::io(format!("writing {}", file.display()), e))?;
        hypothesis_files.push(file);
    }

    let job = GeneJob {
        gene,
        alignment: &fasta,
        workdir: &workdir,
        model: &cfg.model,
        threads: cfg.thread_number,
        timeout: cfg.timeout,
    };

    let unconstrained_file = engines.ml.search_unconstrained(&job, commands)?;
    let mut best_tree_files = vec![unconstrained_file.clone()];
    for (index, file) in hypothesis_files.iter().enumerate() {
        best_tree_files.push(engines.ml.search_constrained(&job, index, file, commands)?);
    }

    // Combined tree file, unconstrained first; every AU backend and the
    // distance ranking read trees in this order.
    let mut newicks = Vec::with_capacity(best_tree_files.len());
    for file in &best_tree_files {
        newicks.push(read_newick_line(file)?);
    }
    let combined = workdir.join(format!("{gene}_COMBINED.tre"));
    fs::write(&combined, format!("{}\n", newicks.join("\n")))
        .map_err(|e| GeneError::io(format!("writing {}", combined.display()), e))?;

    let unconstrained_tree = parse_tree(&newicks[0], &unconstrained_file)?;
    let mut hypothesis_trees = Vec::with_capacity(hypothesis_files.len());
    for (newick, file) in newicks[1..].iter().zip(&best_tree_files[1..]) {
        hypothesis_trees.push(parse_tree(newick, file)?);
    }
    let best_index = ranking::select_best_hypothesis(&unconstrained_tree, &hypothesis_trees)?;

    let au_job = AuJob {
        gene_job: &job,
        combined: &combined,
        unconstrained: &unconstrained_file,
        tree_count: hypothesis_trees.len() + 1,
        bootstrap_replicates: cfg.bootstrap_replicates,
    };
    let mut au_values = Vec::with_capacity(engines.au.len());
    let mut runtimes = Vec::with_capacity(engines.au.len());
    for engine in &engines.au {
        let started = Instant::now();
        match engine.run(&au_job, commands) {
            Ok(mut values) => {
                // Index 0 is the unconstrained tree; the report carries
                // hypothesis values only.
                values.remove(0);
                au_values.push(Some(values));
            }
            Err(e) => {
                log::warn!("{gene}: {} AU test failed: {e}", engine.name());
                au_values.push(None);
            }
        }
        runtimes.push(Some(started.elapsed().as_secs_f64()));
    }

    Ok(GeneRow {
        gene: gene.to_string(),
        best_index,
        best_newick: newicks[best_index + 1].clone(),
        au_values,
        runtimes,
    })
}

/// First non-empty line of a best-tree file.
fn read_newick_line(path: &Path) -> Result<String, GeneError> {
    let text = fs::read_to_string(path)
        .map_err(|e| GeneError::io(format!("reading {}", path.display()), e))?;
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GeneError::Parse(format!("{} contains no tree", path.display())))
}

fn parse_tree(newick: &str, origin: &Path) -> Result<PhyloTree, GeneError> {
    PhyloTree::from_newick(newick)
        .map_err(|e| GeneError::Parse(format!("{}: {e}", origin.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuChoice, MlChoice};
    use std::time::Duration;

    fn test_config(dir: &Path) -> RunConfig {
        RunConfig {
            alignment_dir: dir.join("alignments"),
            constraint_file: dir.join("constraints.tre"),
            output_dir: dir.join("output"),
            model: "GTRGAMMAI".into(),
            ml_inference: MlChoice::Raxml,
            au_inference: vec![AuChoice::IqTree],
            raxml_path: "/nonexistent/raxmlHPC".into(),
            iqtree_path: "/nonexistent/iqtree".into(),
            iqtree2_path: None,
            consel_path: None,
            alpha_level: 0.05,
            outgroup: None,
            thread_number: 1,
            jobs: 1,
            bootstrap_replicates: 10_000,
            timeout: Some(Duration::from_secs(60)),
        }
    }

    fn test_engines() -> Engines {
        Engines {
            ml: MlEngine::RaxmlStandard {
                path: "/nonexistent/raxmlHPC".into(),
                outgroup: None,
            },
            au: vec![AuEngine::IqTree { path: "/nonexistent/iqtree".into() }],
            versions: vec![],
        }
    }

    #[test]
    fn scan_sorts_and_skips_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zeta.fasta"), ">A\nACGT\n").unwrap();
        std::fs::write(dir.path().join("alpha.phy"), "1 4\nA ACGT\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored\n").unwrap();

        let genes = scan_alignment_dir(dir.path()).unwrap();
        let names: Vec<&str> = genes.iter().map(|(g, _)| g.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn duplicate_gene_stems_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("g1.fasta"), ">A\nACGT\n").unwrap();
        std::fs::write(dir.path().join("g1.phy"), "1 4\nA ACGT\n").unwrap();

        let err = scan_alignment_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("gene name 'g1'"));
    }

    #[test]
    fn gene_name_stops_at_first_dot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rbcL.aligned.fasta"), ">A\nACGT\n").unwrap();
        let genes = scan_alignment_dir(dir.path()).unwrap();
        assert_eq!(genes[0].0, "rbcL");
    }

    #[test]
    fn gap_only_alignment_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        let ali = dir.path().join("g1.fasta");
        std::fs::write(&ali, ">A\n----\n>B\n----\n").unwrap();

        let constraints = vec![Clade::from_newick("(A,B,(C,D))").unwrap()];
        let (commands, outcome) =
            process_gene("g1", &ali, &cfg, &test_engines(), &constraints);
        assert!(commands.is_empty());
        assert!(matches!(outcome, GeneOutcome::Skipped { .. }));
    }

    #[test]
    fn hypothesis_sharing_too_few_taxa_fails_the_gene() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        let ali = dir.path().join("g1.fasta");
        std::fs::write(&ali, ">X\nACGT\n>Y\nACGT\n").unwrap();

        let constraints = vec![Clade::from_newick("(A,B,(C,D))").unwrap()];
        let (_, outcome) = process_gene("g1", &ali, &cfg, &test_engines(), &constraints);
        match outcome {
            GeneOutcome::Failed { reason } => assert!(reason.contains("hypothesis 0")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn missing_ml_executable_fails_not_skips() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        std::fs::create_dir_all(&cfg.output_dir).unwrap();
        let ali = dir.path().join("g1.fasta");
        std::fs::write(&ali, ">A\nACGT\n>B\nACCT\n>C\nAGGT\n>D\nACGA\n").unwrap();

        let constraints = vec![Clade::from_newick("(A,B,(C,D))").unwrap()];
        let (commands, outcome) =
            process_gene("g1", &ali, &cfg, &test_engines(), &constraints);
        assert!(matches!(outcome, GeneOutcome::Failed { .. }));
        // The attempted search command is still recorded for provenance.
        assert_eq!(commands.len(), 1);
        assert!(commands[0].contains("withoutConstraints_g1"));
    }

    #[test]
    fn run_rejects_existing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path());
        cfg.output_dir = dir.path().to_path_buf();
        assert!(matches!(run(&cfg), Err(RunError::Config(_))));
    }

    #[test]
    fn read_newick_line_takes_first_tree() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("best.tre");
        std::fs::write(&file, "\n(A:0.1,B:0.2,(C:0.1,D:0.1):0.3);\n").unwrap();
        assert_eq!(
            read_newick_line(&file).unwrap(),
            "(A:0.1,B:0.2,(C:0.1,D:0.1):0.3);"
        );
    }
}
