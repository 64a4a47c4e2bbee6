use crate::classify::FusionCall;
use crate::fusion::ReadBucket;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Every file a run writes, derived from the main output path.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub pass: PathBuf,
    pub fail: PathBuf,
    pub log: PathBuf,
    pub breakpoints: PathBuf,
    pub full_table: PathBuf,
}

impl OutputPaths {
    pub fn from_output(output: &Path) -> Self {
        let with_suffix = |suffix: &str| {
            let mut s = output.as_os_str().to_owned();
            s.push(suffix);
            PathBuf::from(s)
        };
        Self {
            pass: output.to_path_buf(),
            fail: with_suffix(".fail"),
            log: with_suffix(".log"),
            breakpoints: with_suffix(".breakpoints.tsv"),
            full_table: with_suffix(".full.tsv"),
        }
    }
}

fn background_string(call: &FusionCall) -> String {
    call.scores
        .background_counts
        .iter()
        .map(|c| format!("{};", c))
        .collect()
}

fn median_range_string(call: &FusionCall) -> String {
    call.fusion
        .median_range()
        .into_iter()
        .map(|(chrom, start, end)| format!("{}:{}-{};", chrom, start, end))
        .collect()
}

fn record_prefix(call: &FusionCall) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        call.fusion.id,
        call.fusion.name,
        call.scores.tfidf_full_length,
        call.scores.fin,
        call.scores.total_count,
        background_string(call),
        call.verdict
    )
}

/// PASS line: common prefix plus the per-gene median range.
pub fn pass_record(call: &FusionCall) -> String {
    format!("{}\t{}", record_prefix(call), median_range_string(call))
}

pub fn fail_record(call: &FusionCall) -> String {
    record_prefix(call)
}

/// Read log lines of a cluster, forward reads first.
pub fn read_log_lines(call: &FusionCall) -> Vec<String> {
    call.fusion
        .reads_by_bucket()
        .map(|read| read.log_line())
        .collect()
}

/// `read_id, fusion_id, gene_id, chrom, position` rows. Forward reads are
/// oriented with the first gene as 5' partner, backward reads the opposite.
pub fn breakpoint_rows(call: &FusionCall) -> Vec<String> {
    let mut rows = Vec::new();
    for (bucket, direction) in [(ReadBucket::Forward, true), (ReadBucket::Backward, false)] {
        for read in call.fusion.bucket(bucket) {
            for (gene, locus) in read.get_breakpoints(direction) {
                rows.push(format!(
                    "{}\t{}\t{}\t{}",
                    read.read_id, call.fusion.id, gene, locus
                ));
            }
        }
    }
    rows
}

/// Wide diagnostic row with every intermediate score.
pub fn full_record(call: &FusionCall) -> String {
    let f = call.fusion;
    let s = &call.scores;
    let idf_string: String = s.idf_counts.iter().map(|c| format!("{};", c)).collect();
    [
        f.id.clone(),
        f.count(ReadBucket::Forward).to_string(),
        f.count(ReadBucket::Backward).to_string(),
        f.count(ReadBucket::MultiFirst).to_string(),
        f.count(ReadBucket::NoFirst).to_string(),
        f.gene_overlaps.len().to_string(),
        f.duplications.len().to_string(),
        f.name.clone(),
        s.fin.to_string(),
        call.verdict.to_string(),
        s.background_sum.to_string(),
        s.total_count.to_string(),
        background_string(call),
        s.full_length_count.to_string(),
        s.full_length_fin.to_string(),
        s.total_idf.to_string(),
        idf_string,
        s.tfidf.to_string(),
        s.tfidf_full_length.to_string(),
        s.fg_count.to_string(),
        s.lg_count.to_string(),
        s.forward_rt_ratio.to_string(),
        s.backward_rt_ratio.to_string(),
        call.test.pvalue.to_string(),
        call.test.corrected.to_string(),
        if call.test.null_rejected { "pPASS" } else { "pFAIL" }.to_string(),
        s.bad_strand_ratio.to_string(),
    ]
    .join("\t")
}

pub const FULL_TABLE_HEADER: &str = "#fusion_id\tforward\tbackward\tmulti_first\tno_first\t\
gene_overlaps\tsegdups\tfusion_name\tfin\tcode\tbackground_sum\ttotal_count\tbackground_counts\t\
full_length_count\tfull_length_fin\ttotal_idf\tidf_counts\ttfidf\ttfidf_full_length\tfg_count\t\
lg_count\tforward_rt_ratio\tbackward_rt_ratio\tpvalue\tcorrected_pvalue\tptest\tbad_strand_ratio";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub pass: usize,
    pub fail: usize,
    pub log_lines: usize,
    pub breakpoints: usize,
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("cannot create output {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Remove `path` if it exists and is empty.
pub fn remove_if_empty(path: &Path) -> Result<()> {
    if let Ok(meta) = std::fs::metadata(path) {
        if meta.len() == 0 {
            std::fs::remove_file(path)
                .with_context(|| format!("cannot remove {}", path.display()))?;
        }
    }
    Ok(())
}

/// Write PASS, FAIL, read-log and breakpoint files (and optionally the full
/// table) for already classified calls, in call order.
pub fn write_calls(calls: &[FusionCall], paths: &OutputPaths, full_table: bool) -> Result<WriteSummary> {
    let mut pass_out = create(&paths.pass)?;
    let mut fail_out = create(&paths.fail)?;
    let mut log_out = create(&paths.log)?;
    let mut bp_out = create(&paths.breakpoints)?;
    let mut full_out = if full_table {
        let mut w = create(&paths.full_table)?;
        writeln!(w, "{}", FULL_TABLE_HEADER)?;
        Some(w)
    } else {
        None
    };

    let mut summary = WriteSummary::default();
    for call in calls {
        if call.verdict.is_pass() {
            writeln!(pass_out, "{}", pass_record(call))?;
            summary.pass += 1;
            for line in read_log_lines(call) {
                writeln!(log_out, "{}", line)?;
                summary.log_lines += 1;
            }
        } else {
            writeln!(fail_out, "{}", fail_record(call))?;
            summary.fail += 1;
        }

        for row in breakpoint_rows(call) {
            writeln!(bp_out, "{}", row)?;
            summary.breakpoints += 1;
        }

        if let Some(w) = full_out.as_mut() {
            writeln!(w, "{}", full_record(call))?;
        }
    }

    for w in [&mut pass_out, &mut fail_out, &mut log_out, &mut bp_out] {
        w.flush()?;
    }
    if let Some(mut w) = full_out {
        w.flush()?;
    }
    drop((fail_out, log_out));

    remove_if_empty(&paths.log)?;
    remove_if_empty(&paths.fail)?;

    Ok(summary)
}
