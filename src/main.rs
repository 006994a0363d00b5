use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use aupipe::config::{RunConfig, parse_au_selection};
use aupipe::error::RunError;

#[derive(Parser, Debug)]
#[command(
    name = "aupipe",
    version,
    about = "Constrained tree searches and AU tests across gene alignments"
)]
struct Args {
    /// Directory of per-gene alignment files (fasta, fa, phy, nex)
    #[arg(short = 'a', long = "alignment")]
    alignment: PathBuf,

    /// Newick file with one or more hypothesis topologies
    #[arg(short = 'c', long = "constraint")]
    constraint: PathBuf,

    /// Substitution model for RAxML invocations (IQ-TREE runs use GTR+I+G)
    #[arg(long, default_value = "GTRGAMMAI")]
    model: String,

    /// Program for the ML tree searches: RAxML or IQTree
    #[arg(long = "ml-inference", default_value = "RAxML")]
    ml_inference: String,

    /// Programs for the AU test, ';'-separated: CONSEL, IQTree, IQTree2
    #[arg(long = "au-inference", default_value = "CONSEL")]
    au_inference: String,

    /// RAxML executable (classic raxmlHPC or raxml-ng, auto-detected)
    #[arg(long = "path-raxml", default_value = "raxmlHPC")]
    path_raxml: String,

    /// IQ-TREE executable
    #[arg(long = "path-iqtree", default_value = "iqtree")]
    path_iqtree: String,

    /// IQ-TREE 2 executable; required when IQTree2 is selected
    #[arg(long = "path-iqtree2")]
    path_iqtree2: Option<String>,

    /// CONSEL bin directory; required when CONSEL is selected
    #[arg(long = "path-consel")]
    path_consel: Option<PathBuf>,

    /// Significance level for flagging AU p-values
    #[arg(long = "alpha-level", default_value_t = 0.05)]
    alpha_level: f64,

    /// Outgroup taxon for classic RAxML searches
    #[arg(long)]
    outgroup: Option<String>,

    /// Threads per external invocation
    #[arg(long = "thread-number", default_value_t = 1)]
    thread_number: usize,

    /// Genes processed in parallel
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Bootstrap replicates for IQ-TREE AU tests
    #[arg(long = "bootstrap-replicates", default_value_t = 10_000)]
    bootstrap_replicates: u32,

    /// Kill an external invocation after this many seconds (0 = no limit)
    #[arg(long = "timeout-secs", default_value_t = 0)]
    timeout_secs: u64,

    /// Output directory; must not exist yet
    #[arg(short = 'o', long, default_value = "output")]
    output: PathBuf,

    /// Only warnings and errors on the console
    #[arg(short, long)]
    quiet: bool,
}

fn build_config(args: &Args) -> Result<RunConfig, RunError> {
    Ok(RunConfig {
        alignment_dir: args.alignment.clone(),
        constraint_file: args.constraint.clone(),
        output_dir: args.output.clone(),
        model: args.model.clone(),
        ml_inference: args.ml_inference.parse()?,
        au_inference: parse_au_selection(&args.au_inference)?,
        raxml_path: args.path_raxml.clone(),
        iqtree_path: args.path_iqtree.clone(),
        iqtree2_path: args.path_iqtree2.clone(),
        consel_path: args.path_consel.clone(),
        alpha_level: args.alpha_level,
        outgroup: args.outgroup.clone(),
        thread_number: args.thread_number,
        jobs: args.jobs,
        bootstrap_replicates: args.bootstrap_replicates,
        timeout: (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs)),
    })
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.quiet { "warn" } else { "info" }),
    )
    .init();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };

    match aupipe::pipeline::run(&config) {
        Ok(summary) => {
            if summary.completed == 0 {
                eprintln!(
                    "no gene completed ({} skipped, {} failed)",
                    summary.skipped, summary.failed
                );
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e @ RunError::Config(_)) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
