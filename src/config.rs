//! Run configuration and its up-front validation.
//!
//! Everything here is checked before any gene work starts: a bad backend
//! selection or a missing required path must never surface halfway through
//! a multi-hour run.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::RunError;

/// Which program runs the ML tree searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MlChoice {
    Raxml,
    IqTree,
}

impl FromStr for MlChoice {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RAxML" => Ok(MlChoice::Raxml),
            "IQTree" => Ok(MlChoice::IqTree),
            other => Err(RunError::Config(format!(
                "'{other}' is not a supported program for ML inference, \
                 supported programs are: 'RAxML' and 'IQTree'"
            ))),
        }
    }
}

/// Which program(s) run the AU test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuChoice {
    Consel,
    IqTree,
    IqTree2,
}

impl FromStr for AuChoice {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONSEL" => Ok(AuChoice::Consel),
            "IQTree" => Ok(AuChoice::IqTree),
            "IQTree2" => Ok(AuChoice::IqTree2),
            other => Err(RunError::Config(format!(
                "'{other}' is not a supported program for AU test calculation, \
                 supported programs are: 'CONSEL', 'IQTree' and 'IQTree2'"
            ))),
        }
    }
}

/// Parse the `;`-delimited AU selector (e.g. `CONSEL;IQTree`), keeping the
/// given order, which defines the report's backend column order.
pub fn parse_au_selection(selector: &str) -> Result<Vec<AuChoice>, RunError> {
    let choices = selector
        .split(';')
        .filter(|token| !token.trim().is_empty())
        .map(|token| token.trim().parse())
        .collect::<Result<Vec<AuChoice>, _>>()?;
    if choices.is_empty() {
        return Err(RunError::Config(
            "please specify at least one program for AU test calculation".into(),
        ));
    }
    Ok(choices)
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory of per-gene alignment files.
    pub alignment_dir: PathBuf,
    /// Newick file with all hypothesis topologies.
    pub constraint_file: PathBuf,
    pub output_dir: PathBuf,
    /// Substitution model, forwarded verbatim to RAxML invocations.
    /// IQ-TREE invocations always use [`crate::backends::IQTREE_MODEL`].
    pub model: String,
    pub ml_inference: MlChoice,
    pub au_inference: Vec<AuChoice>,
    pub raxml_path: String,
    pub iqtree_path: String,
    pub iqtree2_path: Option<String>,
    pub consel_path: Option<PathBuf>,
    /// p-values at or below this level are flagged significant.
    pub alpha_level: f64,
    pub outgroup: Option<String>,
    /// Thread-count hint forwarded to every external invocation.
    pub thread_number: usize,
    /// Gene-level worker count; 1 reproduces strictly sequential runs.
    pub jobs: usize,
    pub bootstrap_replicates: u32,
    /// Deadline per external invocation; `None` waits forever.
    pub timeout: Option<Duration>,
}

impl RunConfig {
    /// Check everything that can be checked without touching a gene.
    pub fn validate(&self) -> Result<(), RunError> {
        if self.output_dir.exists() {
            return Err(RunError::Config(format!(
                "there is already an output folder at {}; rename or remove it first",
                self.output_dir.display()
            )));
        }
        if !self.alignment_dir.is_dir() {
            return Err(RunError::Config(format!(
                "alignment path {} is not a directory",
                self.alignment_dir.display()
            )));
        }
        if self.au_inference.is_empty() {
            return Err(RunError::Config(
                "please specify at least one program for AU test calculation".into(),
            ));
        }
        if self.au_inference.contains(&AuChoice::Consel) && self.consel_path.is_none() {
            return Err(RunError::Config(
                "please specify the path of CONSEL with --path-consel".into(),
            ));
        }
        if self.au_inference.contains(&AuChoice::IqTree2) && self.iqtree2_path.is_none() {
            return Err(RunError::Config(
                "please specify the path of IQTree2 with --path-iqtree2".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.alpha_level) {
            return Err(RunError::Config(format!(
                "alpha level {} is outside [0, 1]",
                self.alpha_level
            )));
        }
        Ok(())
    }

    /// RAxML is needed for ML searches and for CONSEL site likelihoods.
    pub fn needs_raxml(&self) -> bool {
        self.ml_inference == MlChoice::Raxml || self.au_inference.contains(&AuChoice::Consel)
    }

    pub fn needs_iqtree(&self) -> bool {
        self.ml_inference == MlChoice::IqTree || self.au_inference.contains(&AuChoice::IqTree)
    }

    /// Preamble lines of the provenance log: the resolved parameters.
    pub fn describe(&self) -> Vec<String> {
        let au: Vec<&str> = self
            .au_inference
            .iter()
            .map(|c| match c {
                AuChoice::Consel => "CONSEL",
                AuChoice::IqTree => "IQTree",
                AuChoice::IqTree2 => "IQTree2",
            })
            .collect();
        vec![
            format!("alignment: {}", self.alignment_dir.display()),
            format!("constraint_path: {}", self.constraint_file.display()),
            format!("model: {}", self.model),
            format!(
                "ml_inference: {}",
                match self.ml_inference {
                    MlChoice::Raxml => "RAxML",
                    MlChoice::IqTree => "IQTree",
                }
            ),
            format!("au_inference: {}", au.join(";")),
            format!("alpha_level: {}", self.alpha_level),
            format!("outgroup: {}", self.outgroup.as_deref().unwrap_or("-")),
            format!("thread_number: {}", self.thread_number),
            format!("jobs: {}", self.jobs),
            format!("bootstrap_replicates: {}", self.bootstrap_replicates),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(dir: &std::path::Path) -> RunConfig {
        RunConfig {
            alignment_dir: dir.to_path_buf(),
            constraint_file: dir.join("constraints.tre"),
            output_dir: dir.join("output"),
            model: "GTRGAMMAI".into(),
            ml_inference: MlChoice::Raxml,
            au_inference: vec![AuChoice::IqTree],
            raxml_path: "raxmlHPC".into(),
            iqtree_path: "iqtree".into(),
            iqtree2_path: None,
            consel_path: None,
            alpha_level: 0.05,
            outgroup: None,
            thread_number: 1,
            jobs: 1,
            bootstrap_replicates: 10_000,
            timeout: None,
        }
    }

    #[test]
    fn au_selector_keeps_order() {
        assert_eq!(
            parse_au_selection("CONSEL;IQTree").unwrap(),
            vec![AuChoice::Consel, AuChoice::IqTree]
        );
        assert_eq!(parse_au_selection("IQTree2").unwrap(), vec![AuChoice::IqTree2]);
    }

    #[test]
    fn unknown_au_program_is_rejected_with_supported_list() {
        let err = parse_au_selection("PAUP").unwrap_err();
        assert!(err.to_string().contains("'CONSEL', 'IQTree' and 'IQTree2'"));
    }

    #[test]
    fn empty_au_selector_is_rejected() {
        assert!(parse_au_selection(";").is_err());
    }

    #[test]
    fn unknown_ml_program_is_rejected() {
        let err = "PhyML".parse::<MlChoice>().unwrap_err();
        assert!(err.to_string().contains("'RAxML' and 'IQTree'"));
    }

    #[test]
    fn consel_requires_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path());
        cfg.au_inference = vec![AuChoice::Consel];
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("--path-consel"));
        cfg.consel_path = Some(dir.path().join("consel"));
        cfg.validate().unwrap();
    }

    #[test]
    fn iqtree2_requires_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path());
        cfg.au_inference = vec![AuChoice::IqTree2];
        assert!(cfg.validate().is_err());
        cfg.iqtree2_path = Some("iqtree2".into());
        cfg.validate().unwrap();
    }

    #[test]
    fn existing_output_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path());
        cfg.output_dir = dir.path().to_path_buf();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("already an output folder"));
    }

    #[test]
    fn raxml_needed_for_consel_even_under_iqtree_ml() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path());
        cfg.ml_inference = MlChoice::IqTree;
        cfg.au_inference = vec![AuChoice::Consel];
        assert!(cfg.needs_raxml());
        cfg.au_inference = vec![AuChoice::IqTree];
        assert!(!cfg.needs_raxml());
    }
}
