use crate::types::{HashMap, HashMapExt};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// Gene pair column holds two fixed-width ids separated by "::".
const GENE_ID_WIDTH: usize = 15;
const SECOND_GENE_OFFSET: usize = GENE_ID_WIDTH + 2;

/// Genome-wide background: alignment totals and, per gene, the number of
/// normal (non-split) alignments confined to it.
#[derive(Debug, Default, Clone)]
pub struct BackgroundCounts {
    pub total_normal: u64,
    pub total_chimeric: u64,
    gene_counts: HashMap<String, u64>,
}

impl BackgroundCounts {
    pub fn new(total_normal: u64, total_chimeric: u64) -> Self {
        Self {
            total_normal,
            total_chimeric,
            gene_counts: HashMap::new(),
        }
    }

    pub fn set_gene_count(&mut self, gene_id: &str, count: u64) {
        self.gene_counts.insert(gene_id.to_string(), count);
    }

    /// Zero for genes never seen in a normal alignment.
    pub fn gene_count(&self, gene_id: &str) -> u64 {
        self.gene_counts.get(gene_id).copied().unwrap_or(0)
    }

    /// Chimeric alignments per normal alignment.
    pub fn chimera_rate(&self) -> f64 {
        self.total_chimeric as f64 / self.total_normal.max(1) as f64
    }

    /// Count one feature-table row.
    pub fn add_row(&mut self, line: &str) -> bool {
        let fields: Vec<&str> = line.split('\t').collect();
        let Some(split) = fields.get(2).and_then(|f| f.trim().parse::<i64>().ok()) else {
            return false;
        };
        if split != 0 {
            self.total_chimeric += 1;
            return true;
        }
        self.total_normal += 1;

        let pair = fields[1];
        match (pair.get(..GENE_ID_WIDTH), pair.get(SECOND_GENE_OFFSET..)) {
            (Some(first), Some(second)) => {
                if first == second {
                    *self.gene_counts.entry(first.to_string()).or_insert(0) += 1;
                }
                true
            }
            _ => false,
        }
    }
}

/// Tally background counts from a feature table, one row per alignment.
pub fn count_genes(path: &Path) -> Result<BackgroundCounts> {
    let file = File::open(path)
        .with_context(|| format!("cannot open feature table {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut counts = BackgroundCounts::default();
    let mut skipped = 0usize;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if !counts.add_row(&line) {
            skipped += 1;
            tracing::warn!(path = %path.display(), line = lineno + 1, "malformed feature table row");
        }
    }

    tracing::info!(
        normal = counts.total_normal,
        chimeric = counts.total_chimeric,
        genes = counts.gene_counts.len(),
        skipped,
        "counted background alignments"
    );
    Ok(counts)
}
