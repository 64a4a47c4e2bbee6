use anyhow::Result;
use clap::Parser;
use fusion_annotate_rs::{cli, pipeline};
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let stats = pipeline::run(&args)?;
    tracing::info!(
        reads = stats.reads,
        clusters = stats.clusters,
        pass = stats.pass,
        fail = stats.fail,
        breakpoint_rows = stats.breakpoint_rows,
        duplication_hits = stats.duplication_hits,
        gene_overlaps = stats.gene_overlaps,
        "fusion-annotate-rs: processing complete"
    );
    Ok(())
}
