use crate::annotate::annotate_duplications_and_overlaps;
use crate::annotation::load_gene_annotation;
use crate::background::count_genes;
use crate::candidate::read_chains;
use crate::classify::classify_fusions;
use crate::cli::Args;
use crate::duplication::read_duplication_table;
use crate::fusion::FusionManager;
use crate::interval_index::DuplicationIndex;
use crate::output::{write_calls, OutputPaths};
use crate::stats::{score_fusions, DEFAULT_ALPHA};
use anyhow::Result;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub reads: u64,
    pub clusters: u64,
    pub pass: u64,
    pub fail: u64,
    pub breakpoint_rows: u64,
    /// Clusters with at least one duplication hit.
    pub duplication_hits: u64,
    /// Clusters with at least one overlapping gene pair.
    pub gene_overlaps: u64,
}

/// Run the whole batch: load inputs, cluster, annotate, score, classify and
/// write every output. Nothing is written until scoring has succeeded.
pub fn run(args: &Args) -> Result<Stats> {
    args.validate_inputs()?;
    let config = args.classify_config();

    let annotation = load_gene_annotation(&args.reference)?;
    let reads = read_chains(&args.input)?;
    let read_count = reads.len() as u64;

    let mut manager = FusionManager::from_reads(reads, &annotation);
    tracing::info!(reads = read_count, clusters = manager.len(), "clustered candidate reads");

    let duplications = DuplicationIndex::build(read_duplication_table(&args.duplications)?);
    annotate_duplications_and_overlaps(&mut manager, &annotation, &duplications);

    let background = count_genes(&args.feature_table)?;
    let tests = score_fusions(&manager, &background, DEFAULT_ALPHA)?;
    let calls = classify_fusions(&manager, &tests, &annotation, &background, &config)?;

    let paths = OutputPaths::from_output(&args.output);
    let summary = write_calls(&calls, &paths, args.full_table)?;

    Ok(Stats {
        reads: read_count,
        clusters: manager.len() as u64,
        pass: summary.pass as u64,
        fail: summary.fail as u64,
        breakpoint_rows: summary.breakpoints as u64,
        duplication_hits: manager
            .fusions()
            .filter(|f| !f.duplications.is_empty())
            .count() as u64,
        gene_overlaps: manager
            .fusions()
            .filter(|f| !f.gene_overlaps.is_empty())
            .count() as u64,
    })
}
