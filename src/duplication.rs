use crate::locus::Interval;
use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// genomicSuperDups column layout (0-based)
const SRC_CHROM: usize = 1;
const SRC_START: usize = 2;
const SRC_END: usize = 3;
const MATCH_CHROM: usize = 7;
const MATCH_START: usize = 8;
const MATCH_END: usize = 9;
const FRAC_MATCH: usize = 26;

/// The other copy of a duplicated region.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicationHit {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
    pub frac_match: f64,
}

impl DuplicationHit {
    pub fn as_interval(&self) -> Interval {
        Interval::new(self.chrom.clone(), self.start, self.end, false)
    }
}

pub fn strip_chr(chrom: &str) -> &str {
    chrom.strip_prefix("chr").unwrap_or(chrom)
}

pub fn parse_duplication_line(line: &str) -> Result<(Interval, DuplicationHit)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() <= FRAC_MATCH {
        return Err(anyhow!(
            "expected at least {} fields, found {}",
            FRAC_MATCH + 1,
            fields.len()
        ));
    }

    let int = |idx: usize| -> Result<u32> {
        fields[idx]
            .trim()
            .parse::<u32>()
            .map_err(|e| anyhow!("field {} ({:?}): {}", idx, fields[idx], e))
    };

    let source = Interval::new(
        strip_chr(fields[SRC_CHROM]),
        int(SRC_START)?,
        int(SRC_END)?,
        false,
    );
    let hit = DuplicationHit {
        chrom: strip_chr(fields[MATCH_CHROM]).to_string(),
        start: int(MATCH_START)?,
        end: int(MATCH_END)?,
        frac_match: fields[FRAC_MATCH]
            .trim()
            .parse::<f64>()
            .map_err(|e| anyhow!("field {} ({:?}): {}", FRAC_MATCH, fields[FRAC_MATCH], e))?,
    };

    Ok((source, hit))
}

/// Read a segmental duplication table (UCSC genomicSuperDups layout).
pub fn read_duplication_table(path: &Path) -> Result<Vec<(Interval, DuplicationHit)>> {
    let file = File::open(path)
        .with_context(|| format!("cannot open duplication table {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut entries = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let entry = parse_duplication_line(&line)
            .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
        entries.push(entry);
    }

    tracing::info!(entries = entries.len(), "loaded duplication table");
    Ok(entries)
}
