use crate::annotation::GeneAnnotation;
use crate::background::BackgroundCounts;
use crate::fusion::{CandidateFusion, FusionManager, ReadBucket};
use crate::stats::FusionTest;
use anyhow::{anyhow, Result};
use std::fmt;

/// Fraction of strand-inconsistent reads above which a cluster fails.
pub const MAX_BAD_STRAND_RATIO: f64 = 0.25;
/// Minimum coverage-completeness ratio on both sides of a read-through.
pub const MIN_RT_COVERAGE_RATIO: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    pub min_support: usize,
    pub max_rt_distance: i64,
    pub max_rt_fin: f64,
    /// Fail clusters touching a non protein-coding gene.
    pub only_coding: bool,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            min_support: 3,
            max_rt_distance: 600_000,
            max_rt_fin: 0.5,
            only_coding: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    NonCoding,
    Overlaps,
    SegDup,
    BadStrand,
    LowSupport,
    /// Not an artifact, but not significant over background either.
    NotSignificant,
}

impl FailReason {
    pub fn tag(&self) -> &'static str {
        match self {
            FailReason::NonCoding => "noncoding",
            FailReason::Overlaps => "overlaps",
            FailReason::SegDup => "segdup",
            FailReason::BadStrand => "badstrand",
            FailReason::LowSupport => "lowsup",
            FailReason::NotSignificant => "RP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// `PASS:RT`
    ReadThrough,
    /// `PASS:GF`
    GeneFusion,
    Fail(Vec<FailReason>),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        !matches!(self, Verdict::Fail(_))
    }

    pub fn has(&self, reason: FailReason) -> bool {
        matches!(self, Verdict::Fail(reasons) if reasons.contains(&reason))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::ReadThrough => write!(f, "PASS:RT"),
            Verdict::GeneFusion => write!(f, "PASS:GF"),
            Verdict::Fail(reasons) => {
                write!(f, "FAIL")?;
                for r in reasons {
                    write!(f, ":{}", r.tag())?;
                }
                Ok(())
            }
        }
    }
}

/// Derived per-cluster scores that feed classification and output.
#[derive(Debug, Clone)]
pub struct FusionScores {
    pub total_count: usize,
    pub full_length_count: usize,
    /// Background count of each gene, in fusion-id order.
    pub background_counts: Vec<u64>,
    pub background_sum: f64,
    /// Per gene: reads touching it anywhere minus this cluster's reads.
    pub idf_counts: Vec<i64>,
    pub total_idf: f64,
    pub tfidf: f64,
    pub tfidf_full_length: f64,
    pub fin: f64,
    pub full_length_fin: f64,
    pub fg_count: f64,
    pub lg_count: f64,
    pub forward_rt_ratio: f64,
    pub backward_rt_ratio: f64,
    pub bad_strand_ratio: f64,
}

impl FusionScores {
    pub fn compute(
        fusion: &CandidateFusion,
        manager: &FusionManager,
        background: &BackgroundCounts,
    ) -> Self {
        let total_count = fusion.total_count();
        let full_length_count = fusion.full_length_count();
        let n_genes = fusion.genes.len();

        let background_counts: Vec<u64> = fusion
            .genes
            .iter()
            .map(|g| background.gene_count(g))
            .collect();
        let background_sum = background_counts.iter().sum::<u64>() as f64;

        let idf_counts: Vec<i64> = fusion
            .genes
            .iter()
            .map(|g| manager.gene_count(g) as i64 - total_count as i64)
            .collect();
        let total_idf = idf_counts.iter().sum::<i64>() as f64;
        let idf = (manager.len() as f64 / (1.0 + total_idf / 2.0)).ln();

        // tcpflnz: total count, never zero as a denominator.
        let tcpflnz = total_count.max(1) as f64;
        let side = |idx: usize| {
            fusion
                .genes
                .get(idx)
                .and_then(|g| fusion.non_covered_sum_ratio.get(g))
                .copied()
                .unwrap_or(0.0)
        };
        let fg_count = side(0);
        let lg_count = side(1);

        Self {
            total_count,
            full_length_count,
            background_sum,
            tfidf: total_count as f64 * idf,
            tfidf_full_length: full_length_count as f64 * idf,
            fin: (n_genes * total_count) as f64 / (background_sum + 1.0),
            full_length_fin: (n_genes * full_length_count) as f64 / (background_sum + 1.0),
            fg_count,
            lg_count,
            forward_rt_ratio: fg_count / tcpflnz,
            backward_rt_ratio: lg_count / tcpflnz,
            bad_strand_ratio: fusion.invalid as f64 / tcpflnz,
            background_counts,
            idf_counts,
            total_idf,
        }
    }
}

/// Distance between the two blocks flanking the first gene switch of the
/// cluster's representative read, if that junction stays on one chromosome.
pub fn read_through_distance(fusion: &CandidateFusion) -> Option<i64> {
    let read = fusion
        .bucket(ReadBucket::Forward)
        .chain(fusion.bucket(ReadBucket::Backward))
        .chain(fusion.bucket(ReadBucket::MultiFirst))
        .chain(fusion.bucket(ReadBucket::NoFirst))
        .find(|r| r.blocks().len() >= 2)?;

    let blocks = read.blocks();
    let i = (1..blocks.len()).find(|&i| blocks[i].exon.gene_id != blocks[i - 1].exon.gene_id)?;

    let a = &blocks[i - 1].exon.range;
    let b = &blocks[i].exon.range;
    if a.chrom != b.chrom {
        return None;
    }
    let mut positions = [a.start, a.end, b.start, b.end];
    positions.sort_unstable();
    Some(positions[2] as i64 - positions[1] as i64)
}

pub fn is_cluster_rt(fusion: &CandidateFusion, scores: &FusionScores, config: &ClassifyConfig) -> bool {
    let Some(distance) = read_through_distance(fusion) else {
        return false;
    };
    distance <= config.max_rt_distance
        && scores.forward_rt_ratio >= MIN_RT_COVERAGE_RATIO
        && scores.backward_rt_ratio >= MIN_RT_COVERAGE_RATIO
        && scores.fin <= config.max_rt_fin
}

fn has_noncoding_gene(fusion: &CandidateFusion, annotation: &GeneAnnotation) -> bool {
    fusion.genes.iter().any(|g| match annotation.gene(g) {
        Some(gene) => !gene.coding,
        None => {
            tracing::warn!(gene_id = %g, fusion_id = %fusion.id, "gene is not in annotation");
            false
        }
    })
}

/// Apply the PASS/FAIL rules to one cluster.
///
/// Artifact checks accumulate; only a clean cluster is tested for read-through
/// and then for statistical significance.
pub fn classify(
    fusion: &CandidateFusion,
    scores: &FusionScores,
    test: &FusionTest,
    annotation: &GeneAnnotation,
    config: &ClassifyConfig,
) -> Verdict {
    let mut reasons = Vec::new();
    if config.only_coding && has_noncoding_gene(fusion, annotation) {
        reasons.push(FailReason::NonCoding);
    }
    if !fusion.gene_overlaps.is_empty() {
        reasons.push(FailReason::Overlaps);
    }
    if !fusion.duplications.is_empty() {
        reasons.push(FailReason::SegDup);
    }
    if scores.bad_strand_ratio > MAX_BAD_STRAND_RATIO {
        reasons.push(FailReason::BadStrand);
    }
    if fusion.supporting_count() < config.min_support {
        reasons.push(FailReason::LowSupport);
    }

    if !reasons.is_empty() {
        Verdict::Fail(reasons)
    } else if is_cluster_rt(fusion, scores, config) {
        Verdict::ReadThrough
    } else if test.null_rejected {
        Verdict::GeneFusion
    } else {
        Verdict::Fail(vec![FailReason::NotSignificant])
    }
}

/// One classified cluster, ready for output.
#[derive(Debug, Clone)]
pub struct FusionCall<'a> {
    pub fusion: &'a CandidateFusion,
    pub scores: FusionScores,
    pub test: FusionTest,
    pub verdict: Verdict,
}

/// Classify every cluster, walking clusters and test results in lockstep.
pub fn classify_fusions<'a>(
    manager: &'a FusionManager,
    tests: &[FusionTest],
    annotation: &GeneAnnotation,
    background: &BackgroundCounts,
    config: &ClassifyConfig,
) -> Result<Vec<FusionCall<'a>>> {
    if tests.len() != manager.len() {
        return Err(anyhow!(
            "{} test results for {} clusters",
            tests.len(),
            manager.len()
        ));
    }

    Ok(manager
        .fusions()
        .zip(tests.iter())
        .map(|(fusion, test)| {
            let scores = FusionScores::compute(fusion, manager, background);
            let verdict = classify(fusion, &scores, test, annotation, config);
            FusionCall {
                fusion,
                scores,
                test: *test,
                verdict,
            }
        })
        .collect())
}
