use crate::classify::ClassifyConfig;
use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "fusion-annotate-rs",
    about = "Cluster chimeric long-read alignments into gene fusions and call them against background",
    version
)]
pub struct Args {
    /// Candidate read chains (read header followed by its exon blocks)
    #[arg(short = 'i', long = "input", value_name = "CHAINS")]
    pub input: PathBuf,

    /// Output path for PASS calls; other outputs derive from it
    #[arg(short = 'o', long = "output", value_name = "TSV")]
    pub output: PathBuf,

    /// Segmental duplication table
    #[arg(short = 'd', long = "duplications", value_name = "TSV")]
    pub duplications: PathBuf,

    /// Reference gene annotation
    #[arg(short = 'r', long = "reference", value_name = "GTF")]
    pub reference: PathBuf,

    /// Per-alignment feature table used as the background
    #[arg(short = 'f', long = "feature-table", value_name = "TSV")]
    pub feature_table: PathBuf,

    /// Minimum number of forward, backward and multi-first reads
    #[arg(short = 's', long = "min-support", default_value_t = 3)]
    pub min_support: usize,

    /// Maximum FiN score of a read-through call
    #[arg(long, default_value_t = 0.5)]
    pub max_rt_fin: f64,

    /// Maximum junction distance of a read-through call
    #[arg(long, default_value_t = 600_000)]
    pub max_rt_distance: i64,

    /// Do not fail clusters that touch non protein-coding genes
    #[arg(short = 'c', long)]
    pub keep_non_coding: bool,

    /// Also write a wide diagnostic table to <output>.full.tsv
    #[arg(long)]
    pub full_table: bool,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Args {
    fn input_files(&self) -> [(&'static str, &PathBuf); 4] {
        [
            ("input", &self.input),
            ("duplications", &self.duplications),
            ("reference", &self.reference),
            ("feature-table", &self.feature_table),
        ]
    }

    /// Check that every input file exists, reporting all missing ones at once.
    pub fn validate_inputs(&self) -> Result<()> {
        let missing: Vec<String> = self
            .input_files()
            .iter()
            .filter(|(_, path)| !path.is_file())
            .map(|(name, path)| format!("--{} {}", name, path.display()))
            .collect();
        if !missing.is_empty() {
            bail!("missing input file(s): {}", missing.join(", "));
        }
        if self.min_support == 0 {
            tracing::warn!("min-support of 0 disables the low-support filter");
        }
        Ok(())
    }

    pub fn classify_config(&self) -> ClassifyConfig {
        ClassifyConfig {
            min_support: self.min_support,
            max_rt_distance: self.max_rt_distance,
            max_rt_fin: self.max_rt_fin,
            only_coding: !self.keep_non_coding,
        }
    }
}
