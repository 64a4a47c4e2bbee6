//! fusion-annotate-rs: cluster chimeric long-read alignments into candidate
//! gene fusions and call them against a background of normal alignments.
//!
//! # Library usage
//!
//! ```no_run
//! use fusion_annotate_rs::{FusionManager, ClassifyConfig};
//! use fusion_annotate_rs::annotation::load_gene_annotation;
//! use fusion_annotate_rs::candidate::read_chains;
//! use fusion_annotate_rs::background::count_genes;
//! use fusion_annotate_rs::stats::{score_fusions, DEFAULT_ALPHA};
//! use fusion_annotate_rs::classify::classify_fusions;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let annotation = load_gene_annotation(Path::new("genes.gtf"))?;
//! let reads = read_chains(Path::new("chains.tsv"))?;
//! let manager = FusionManager::from_reads(reads, &annotation);
//!
//! let background = count_genes(Path::new("features.tsv"))?;
//! let tests = score_fusions(&manager, &background, DEFAULT_ALPHA)?;
//! let calls = classify_fusions(&manager, &tests, &annotation, &background, &ClassifyConfig::default())?;
//! for call in &calls {
//!     println!("{}\t{}", call.fusion.id, call.verdict);
//! }
//! # Ok(())
//! # }
//! ```

pub mod annotate;
pub mod annotation;
pub mod background;
pub mod candidate;
pub mod classify;
pub mod cli;
pub mod duplication;
pub mod fusion;
pub mod interval_index;
pub mod locus;
pub mod output;
pub mod pipeline;
pub mod stats;
pub mod types;

// Flat re-exports for the most commonly used public types.
pub use candidate::{Block, CandidateRead, Exon};
pub use classify::{ClassifyConfig, FailReason, Verdict};
pub use fusion::{CandidateFusion, FusionManager, ReadBucket};
pub use interval_index::DuplicationIndex;
pub use locus::{Interval, Locus};
