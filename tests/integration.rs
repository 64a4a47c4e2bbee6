/// End-to-end tests: small fixture files are written into a temporary
/// directory, then run through `pipeline::run` and through the compiled binary.
use fusion_annotate_rs::cli::Args;
use fusion_annotate_rs::pipeline;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

// ── helpers ──────────────────────────────────────────────────────────────────

const G1: &str = "ENSG00000000001";
const G2: &str = "ENSG00000000002";
const G3: &str = "ENSG00000000003";
const G4: &str = "ENSG00000000004";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fusion-annotate-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn gtf() -> String {
    let mut s = String::new();
    let genes = [
        (G1, "1", 1_000, 3_000, "+", "ONE", "T1"),
        (G2, "2", 50_000, 52_000, "+", "TWO", "T2"),
        (G3, "3", 1_000, 2_000, "-", "THREE", "T3"),
        (G4, "3", 90_000, 91_000, "-", "FOUR", "T4"),
    ];
    for (id, chrom, start, end, strand, name, tid) in genes {
        s.push_str(&format!(
            "{chrom}\ttest\tgene\t{start}\t{end}\t.\t{strand}\t.\tgene_id \"{id}.1\"; gene_name \"{name}\"; gene_type \"protein_coding\";\n"
        ));
        for k in 0..2 {
            let es = start + k * 500;
            s.push_str(&format!(
                "{chrom}\ttest\texon\t{es}\t{}\t.\t{strand}\t.\tgene_id \"{id}.1\"; transcript_id \"{tid}.2\"; exon_number \"{}\";\n",
                es + 200,
                k + 1
            ));
        }
    }
    s
}

/// One chain block line with the 14 columns the reader expects.
fn block(chrom: &str, start: u32, end: u32, gene: &str, tid: &str, exon_no: u32) -> String {
    format!(
        "0\t{start}\t{end}\t{chrom}\t.\t.\t0\t.\t{start}\t{end}\t0\t{gene}\t{tid}\t{exon_no}\n"
    )
}

fn chains() -> String {
    let mut s = String::new();
    // Four forward reads (first exon on the later gene), two backward.
    for i in 0..6 {
        let (g1_exon, g2_exon) = if i < 4 { (2, 1) } else { (1, 2) };
        s.push_str(&format!("read{}\t2\n", i));
        s.push_str(&block("1", 1_500 + i * 10, 1_700, G1, "T1", g1_exon));
        s.push_str(&block("2", 50_000, 50_200 + i * 10, G2, "T2", g2_exon));
    }
    // Single unsupported read on another pair.
    s.push_str("lonely\t2\n");
    s.push_str(&block("3", 1_100, 1_300, G3, "T3", 2));
    s.push_str(&block("3", 90_100, 90_300, G4, "T4", 2));
    s
}

fn duplication_line(src: (&str, u32, u32), matched: (&str, u32, u32)) -> String {
    let mut fields = vec!["0".to_string(); 27];
    fields[1] = src.0.to_string();
    fields[2] = src.1.to_string();
    fields[3] = src.2.to_string();
    fields[7] = matched.0.to_string();
    fields[8] = matched.1.to_string();
    fields[9] = matched.2.to_string();
    fields[26] = "0.99".to_string();
    fields.join("\t") + "\n"
}

fn feature_table() -> String {
    let mut s = String::new();
    for (gene, count) in [(G1, 2), (G2, 2), (G3, 500), (G4, 500)] {
        for i in 0..count {
            s.push_str(&format!("aln{}\t{}::{}\t0\n", i, gene, gene));
        }
    }
    s.push_str(&format!("chim\t{}::{}\t1\n", G1, G2));
    s
}

struct Fixture {
    dir: PathBuf,
    args: Args,
}

fn fixture(name: &str) -> Fixture {
    let dir = scratch_dir(name);
    let write = |file: &str, content: String| {
        let path = dir.join(file);
        fs::write(&path, content).expect("write fixture");
        path
    };

    let args = Args {
        input: write("chains.tsv", chains()),
        output: dir.join("calls.tsv"),
        // Duplication far from every fusion partner.
        duplications: write(
            "dups.tsv",
            duplication_line(("chr9", 1_000, 2_000), ("chr10", 5_000, 6_000)),
        ),
        reference: write("genes.gtf", gtf()),
        feature_table: write("features.tsv", feature_table()),
        min_support: 3,
        max_rt_fin: 0.5,
        max_rt_distance: 600_000,
        keep_non_coding: false,
        full_table: true,
        quiet: true,
    };
    Fixture { dir, args }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("read {}: {}", path.display(), e))
        .lines()
        .map(str::to_string)
        .collect()
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[test]
fn pipeline_writes_pass_fail_log_and_breakpoints() {
    let fx = fixture("run");
    let stats = pipeline::run(&fx.args).expect("pipeline run");

    assert_eq!(stats.reads, 7);
    assert_eq!(stats.clusters, 2);
    assert_eq!(stats.pass, 1);
    assert_eq!(stats.fail, 1);
    assert_eq!(stats.duplication_hits, 0);
    assert_eq!(stats.gene_overlaps, 0);

    let out = &fx.args.output;
    let pass = read_lines(out);
    assert_eq!(pass.len(), 1);
    let cols: Vec<&str> = pass[0].split('\t').collect();
    assert_eq!(cols.len(), 8);
    assert_eq!(cols[0], format!("{}::{}", G1, G2));
    assert_eq!(cols[1], "ONE::TWO");
    assert_eq!(cols[4], "6");
    assert_eq!(cols[5], "2;2;");
    assert_eq!(cols[6], "PASS:GF");
    assert!(cols[7].starts_with("1:") && cols[7].contains(";2:"));

    let fail = read_lines(&with_suffix(out, ".fail"));
    assert_eq!(fail.len(), 1);
    assert!(fail[0].starts_with(&format!("{}::{}", G3, G4)));
    assert!(fail[0].contains("FAIL:lowsup"));

    let log = read_lines(&with_suffix(out, ".log"));
    assert_eq!(log.len(), 6);
    assert!(log[0].starts_with("read0\t"));

    // 6 full-length reads, one row per gene each.
    let bps = read_lines(&with_suffix(out, ".breakpoints.tsv"));
    assert_eq!(bps.len(), 12);
    assert_eq!(stats.breakpoint_rows, 12);
    assert!(bps.iter().all(|row| row.split('\t').count() == 5));

    let full = read_lines(&with_suffix(out, ".full.tsv"));
    assert_eq!(full.len(), 3);
    assert!(full[0].starts_with('#'));
    assert_eq!(full[1].split('\t').count(), full[0].split('\t').count());

    let _ = fs::remove_dir_all(&fx.dir);
}

#[test]
fn pipeline_output_is_deterministic() {
    let fx = fixture("idempotent");
    pipeline::run(&fx.args).expect("first run");
    let first = fs::read_to_string(&fx.args.output).unwrap();
    let first_bps = fs::read_to_string(with_suffix(&fx.args.output, ".breakpoints.tsv")).unwrap();

    pipeline::run(&fx.args).expect("second run");
    assert_eq!(first, fs::read_to_string(&fx.args.output).unwrap());
    assert_eq!(
        first_bps,
        fs::read_to_string(with_suffix(&fx.args.output, ".breakpoints.tsv")).unwrap()
    );

    let _ = fs::remove_dir_all(&fx.dir);
}

#[test]
fn duplication_between_partners_fails_cluster() {
    let mut fx = fixture("segdup");
    let dups = fx.dir.join("dups-hit.tsv");
    fs::write(&dups, duplication_line(("chr1", 1_600, 1_650), ("chr2", 50_100, 50_150))).unwrap();
    fx.args.duplications = dups;

    let stats = pipeline::run(&fx.args).expect("pipeline run");
    assert_eq!(stats.pass, 0);
    assert_eq!(stats.duplication_hits, 1);

    let fail = read_lines(&with_suffix(&fx.args.output, ".fail"));
    assert!(fail.iter().any(|l| l.contains("segdup")));
    // No PASS cluster means no read log.
    assert!(!with_suffix(&fx.args.output, ".log").exists());

    let _ = fs::remove_dir_all(&fx.dir);
}

#[test]
fn missing_inputs_are_reported_together() {
    let mut fx = fixture("missing");
    fx.args.input = fx.dir.join("nope.tsv");
    fx.args.reference = fx.dir.join("nope.gtf");

    let err = pipeline::run(&fx.args).unwrap_err().to_string();
    assert!(err.contains("nope.tsv"), "{}", err);
    assert!(err.contains("nope.gtf"), "{}", err);
    assert!(!fx.args.output.exists());

    let _ = fs::remove_dir_all(&fx.dir);
}

#[test]
fn binary_runs_end_to_end() {
    let fx = fixture("binary");
    let a = &fx.args;
    let status = Command::new(env!("CARGO_BIN_EXE_fusion-annotate-rs"))
        .arg("-i").arg(&a.input)
        .arg("-o").arg(&a.output)
        .arg("-d").arg(&a.duplications)
        .arg("-r").arg(&a.reference)
        .arg("-f").arg(&a.feature_table)
        .arg("-q")
        .status()
        .expect("failed to spawn fusion-annotate-rs");
    assert!(status.success(), "exited with status {status}");
    assert_eq!(read_lines(&a.output).len(), 1);
    assert!(!with_suffix(&a.output, ".full.tsv").exists());

    let _ = fs::remove_dir_all(&fx.dir);
}

#[test]
fn binary_rejects_missing_arguments() {
    let status = Command::new(env!("CARGO_BIN_EXE_fusion-annotate-rs"))
        .arg("-i")
        .arg("chains.tsv")
        .status()
        .expect("failed to spawn fusion-annotate-rs");
    assert!(!status.success());
}
