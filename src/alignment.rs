//! Alignment file boundary: FASTA, relaxed PHYLIP, and NEXUS readers.
//!
//! Every gene alignment is normalized to FASTA before any external tool
//! sees it; the ML and AU engines are only ever invoked on the normalized
//! copy inside the gene's working directory.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::GeneError;

/// Extensions accepted when scanning the alignment directory.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["fasta", "fa", "phy", "nex"];

/// One aligned sequence. `id` is the taxon label used for constraint
/// matching and must match constraint-tree leaf labels exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub id: String,
    pub seq: String,
}

impl SeqRecord {
    /// A record is unusable when nothing but gap characters remains.
    pub fn is_empty(&self) -> bool {
        self.seq.chars().all(|c| c == '-')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentFormat {
    Fasta,
    Phylip,
    Nexus,
}

impl AlignmentFormat {
    /// Map a file extension to a format; anything else is a `FormatError`
    /// (the file is skipped, the run continues).
    pub fn from_extension(ext: &str) -> Result<Self, GeneError> {
        match ext.to_ascii_lowercase().as_str() {
            "fasta" | "fa" => Ok(AlignmentFormat::Fasta),
            "phy" => Ok(AlignmentFormat::Phylip),
            "nex" => Ok(AlignmentFormat::Nexus),
            other => Err(GeneError::Format(format!(
                "'{other}' is not supported; supported endings: fasta, fa, phy, nex"
            ))),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, GeneError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| GeneError::Format("file has no extension".into()))?;
        Self::from_extension(ext)
    }
}

/// Read an alignment in whatever supported format the extension announces.
pub fn read_alignment(path: &Path) -> Result<Vec<SeqRecord>, GeneError> {
    let format = AlignmentFormat::from_path(path)?;
    let text = fs::read_to_string(path)
        .map_err(|e| GeneError::io(format!("reading {}", path.display()), e))?;
    match format {
        AlignmentFormat::Fasta => parse_fasta(&text),
        AlignmentFormat::Phylip => parse_phylip(&text),
        AlignmentFormat::Nexus => parse_nexus(&text),
    }
}

/// Taxon labels of an alignment file.
pub fn alignment_labels(path: &Path) -> Result<HashSet<String>, GeneError> {
    Ok(read_alignment(path)?
        .into_iter()
        .map(|r| r.id)
        .collect())
}

/// Drop records that contain only gaps. Logs each removal.
pub fn usable_records(records: Vec<SeqRecord>) -> Vec<SeqRecord> {
    records
        .into_iter()
        .filter(|r| {
            if r.is_empty() {
                log::info!("dropping empty sequence record '{}'", r.id);
                false
            } else {
                true
            }
        })
        .collect()
}

/// Write records as FASTA, one sequence per line.
pub fn write_fasta(path: &Path, records: &[SeqRecord]) -> Result<(), GeneError> {
    let mut out = fs::File::create(path)
        .map_err(|e| GeneError::io(format!("creating {}", path.display()), e))?;
    for record in records {
        writeln!(out, ">{}", record.id)
            .and_then(|_| writeln!(out, "{}", record.seq))
            .map_err(|e| GeneError::io(format!("writing {}", path.display()), e))?;
    }
    Ok(())
}

fn parse_fasta(text: &str) -> Result<Vec<SeqRecord>, GeneError> {
    let mut records: Vec<SeqRecord> = Vec::new();
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            let id = header
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            if id.is_empty() {
                return Err(GeneError::Parse("FASTA record with empty header".into()));
            }
            records.push(SeqRecord { id, seq: String::new() });
        } else if let Some(current) = records.last_mut() {
            current.seq.push_str(line.trim());
        } else {
            return Err(GeneError::Parse("FASTA data before first '>' header".into()));
        }
    }
    Ok(records)
}

/// Relaxed PHYLIP: a `ntax nchar` header line, then one `name sequence`
/// entry per taxon; further unnamed lines are interleaved continuations
/// appended round-robin.
fn parse_phylip(text: &str) -> Result<Vec<SeqRecord>, GeneError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| GeneError::Parse("empty PHYLIP file".into()))?;
    let mut counts = header.split_whitespace();
    let ntax: usize = counts
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| GeneError::Parse("PHYLIP header lacks a taxon count".into()))?;
    let _nchar: usize = counts
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| GeneError::Parse("PHYLIP header lacks a site count".into()))?;

    let mut records: Vec<SeqRecord> = Vec::with_capacity(ntax);
    for (i, line) in lines.enumerate() {
        if i < ntax {
            let mut tokens = line.split_whitespace();
            let id = tokens
                .next()
                .ok_or_else(|| GeneError::Parse("PHYLIP entry without a name".into()))?
                .to_string();
            let seq: String = tokens.collect();
            records.push(SeqRecord { id, seq });
        } else {
            // Interleaved block: bare sequence chunks in taxon order.
            let chunk: String = line.split_whitespace().collect();
            records[i % ntax].seq.push_str(&chunk);
        }
    }
    if records.len() < ntax {
        return Err(GeneError::Parse(format!(
            "PHYLIP header announces {ntax} taxa but only {} entries found",
            records.len()
        )));
    }
    Ok(records)
}

/// NEXUS: entries of the `matrix` block, interleaved rows concatenated by
/// taxon name.
fn parse_nexus(text: &str) -> Result<Vec<SeqRecord>, GeneError> {
    let mut records: Vec<SeqRecord> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut in_matrix = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if !in_matrix {
            if trimmed.eq_ignore_ascii_case("matrix") {
                in_matrix = true;
            }
            continue;
        }
        if trimmed.starts_with(';') {
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with('[') {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        let id = tokens
            .next()
            .unwrap_or_default()
            .trim_matches('\'')
            .to_string();
        let chunk: String = tokens.collect::<String>().trim_end_matches(';').to_string();
        if id.is_empty() || chunk.is_empty() {
            continue;
        }
        match by_name.get(&id) {
            Some(&idx) => records[idx].seq.push_str(&chunk),
            None => {
                by_name.insert(id.clone(), records.len());
                records.push(SeqRecord { id, seq: chunk });
            }
        }
    }

    if !in_matrix {
        return Err(GeneError::Parse("NEXUS file has no matrix block".into()));
    }
    if records.is_empty() {
        return Err(GeneError::Parse("NEXUS matrix block has no entries".into()));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fasta_roundtrip() {
        let text = ">A extra description\nACGT\nACGT\n>B\n----\n";
        let records = parse_fasta(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "A");
        assert_eq!(records[0].seq, "ACGTACGT");
        assert!(records[1].is_empty());
    }

    #[test]
    fn empty_records_are_dropped() {
        let records = vec![
            SeqRecord { id: "A".into(), seq: "ACGT".into() },
            SeqRecord { id: "B".into(), seq: "----".into() },
        ];
        let usable = usable_records(records);
        assert_eq!(usable.len(), 1);
        assert_eq!(usable[0].id, "A");
    }

    #[test]
    fn phylip_sequential() {
        let text = "3 8\nA ACGTACGT\nB ACGT ACGT\nC ACGTACGT\n";
        let records = parse_phylip(text).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].seq, "ACGTACGT");
    }

    #[test]
    fn phylip_interleaved_continuations() {
        let text = "2 8\nA ACGT\nB TTTT\nACGT\nGGGG\n";
        let records = parse_phylip(text).unwrap();
        assert_eq!(records[0].seq, "ACGTACGT");
        assert_eq!(records[1].seq, "TTTTGGGG");
    }

    #[test]
    fn phylip_bad_header() {
        assert!(matches!(
            parse_phylip("not a header\nA ACGT\n"),
            Err(GeneError::Parse(_))
        ));
    }

    #[test]
    fn nexus_matrix_block() {
        let text = "#NEXUS\nbegin data;\ndimensions ntax=2 nchar=8;\nmatrix\n\
                    A ACGT\nB TTTT\n\nA ACGT\nB GGGG\n;\nend;\n";
        let records = parse_nexus(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seq, "ACGTACGT");
        assert_eq!(records[1].seq, "TTTTGGGG");
    }

    #[test]
    fn nexus_without_matrix_is_parse_error() {
        assert!(matches!(
            parse_nexus("#NEXUS\nbegin trees;\nend;\n"),
            Err(GeneError::Parse(_))
        ));
    }

    #[test]
    fn unsupported_extension_is_format_error() {
        assert!(matches!(
            AlignmentFormat::from_extension("aln"),
            Err(GeneError::Format(_))
        ));
        assert_eq!(
            AlignmentFormat::from_extension("FA").unwrap(),
            AlignmentFormat::Fasta
        );
    }

    #[test]
    fn write_and_reread_fasta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gene1.fasta");
        let records = vec![
            SeqRecord { id: "A".into(), seq: "ACGT".into() },
            SeqRecord { id: "B".into(), seq: "AC-T".into() },
        ];
        write_fasta(&path, &records).unwrap();
        assert_eq!(read_alignment(&path).unwrap(), records);
    }
}
