//! Clustering of candidate reads into fusion events.
//!
//! Reads touching the same set of genes form one `CandidateFusion`. Within a
//! cluster every read is assigned exactly one `ReadBucket` according to where
//! its first-exon blocks are.

use crate::annotation::{Gene, GeneAnnotation};
use crate::candidate::CandidateRead;
use crate::locus::Interval;
use crate::types::FUSION_SEP;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadBucket {
    /// Last first-exon block lies on the lexicographically last gene.
    Forward,
    /// Single first-exon block on any other gene.
    Backward,
    /// No block on a first exon.
    NoFirst,
    /// More than one block on a first exon.
    MultiFirst,
}

impl ReadBucket {
    pub fn classify(read: &CandidateRead, last_gene: &str) -> Self {
        match read.first_exons() {
            [] => ReadBucket::NoFirst,
            [idx] => {
                if read.blocks()[*idx].exon.gene_id == last_gene {
                    ReadBucket::Forward
                } else {
                    ReadBucket::Backward
                }
            }
            _ => ReadBucket::MultiFirst,
        }
    }
}

/// A candidate fusion read together with its bucket.
#[derive(Debug, Clone)]
pub struct BucketedRead {
    pub bucket: ReadBucket,
    pub read: CandidateRead,
}

#[derive(Debug, Clone, Default)]
pub struct CandidateFusion {
    pub id: String,
    pub name: String,
    /// Gene ids, sorted.
    pub genes: Vec<String>,
    pub reads: Vec<BucketedRead>,
    pub duplications: Vec<(Interval, Interval)>,
    pub gene_overlaps: Vec<(Gene, Gene)>,
    pub invalid: usize,
    pub non_covered_sum_ratio: BTreeMap<String, f64>,
}

impl CandidateFusion {
    pub fn count(&self, bucket: ReadBucket) -> usize {
        self.reads.iter().filter(|r| r.bucket == bucket).count()
    }

    pub fn bucket(&self, bucket: ReadBucket) -> impl Iterator<Item = &CandidateRead> + '_ {
        self.reads
            .iter()
            .filter(move |r| r.bucket == bucket)
            .map(|r| &r.read)
    }

    /// Reads grouped forward, backward, no-first, multi-first; insertion order
    /// is kept inside each group.
    pub fn reads_by_bucket(&self) -> impl Iterator<Item = &CandidateRead> + '_ {
        [
            ReadBucket::Forward,
            ReadBucket::Backward,
            ReadBucket::NoFirst,
            ReadBucket::MultiFirst,
        ]
        .into_iter()
        .flat_map(move |b| self.bucket(b))
    }

    pub fn total_count(&self) -> usize {
        self.reads.len()
    }

    /// Reads with a single, unambiguous first exon.
    pub fn full_length_count(&self) -> usize {
        self.count(ReadBucket::Forward) + self.count(ReadBucket::Backward)
    }

    /// Reads counted towards minimum support.
    pub fn supporting_count(&self) -> usize {
        self.full_length_count() + self.count(ReadBucket::MultiFirst)
    }

    /// Per-gene bounding interval over the alignment blocks of every read.
    /// Chromosome and strand are taken from the last block seen.
    pub fn fusion_gene_intervals(&self) -> BTreeMap<String, Interval> {
        let mut ivals: BTreeMap<String, Interval> = BTreeMap::new();
        for read in self.reads_by_bucket() {
            for block in read.blocks() {
                let aln = &block.alignment;
                ivals
                    .entry(block.exon.gene_id.clone())
                    .and_modify(|iv| {
                        iv.start = iv.start.min(aln.start);
                        iv.end = iv.end.max(aln.end);
                        iv.chrom = aln.chrom.clone();
                        iv.reverse_strand = aln.reverse_strand;
                    })
                    .or_insert_with(|| aln.clone());
            }
        }
        ivals
    }

    /// Median start and end of each gene's per-read range, keyed by gene id.
    pub fn median_range(&self) -> Vec<(String, f64, f64)> {
        let mut begins: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        let mut ends: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        let mut chroms: BTreeMap<&str, &str> = BTreeMap::new();

        for read in self.reads_by_bucket() {
            for (gene, range) in read.ranges() {
                begins.entry(gene).or_default().push(range.start);
                ends.entry(gene).or_default().push(range.end);
                chroms.insert(gene, chrom_of(read, gene));
            }
        }

        begins
            .into_iter()
            .filter_map(|(gene, mut starts)| {
                let mut stops = ends.remove(gene)?;
                starts.sort_unstable();
                stops.sort_unstable();
                Some((
                    chroms.get(gene).copied().unwrap_or_default().to_string(),
                    median(&starts)?,
                    median(&stops)?,
                ))
            })
            .collect()
    }
}

fn chrom_of<'a>(read: &'a CandidateRead, gene: &str) -> &'a str {
    read.blocks()
        .iter()
        .rev()
        .find(|b| b.exon.gene_id == gene)
        .map(|b| b.alignment.chrom.as_str())
        .unwrap_or_default()
}

/// Median of sorted values: the middle element, or the mean of the two
/// middle elements for an even count.
pub fn median(sorted: &[u32]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 0 {
        Some((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

/// Owns every fusion cluster of a run plus the per-gene read counts.
///
/// Filled by a single clustering pass; read-only afterwards.
#[derive(Debug, Default)]
pub struct FusionManager {
    fusions: BTreeMap<String, CandidateFusion>,
    gene_counts: BTreeMap<String, u64>,
}

impl FusionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reads(
        reads: impl IntoIterator<Item = CandidateRead>,
        annotation: &GeneAnnotation,
    ) -> Self {
        let mut manager = Self::new();
        for read in reads {
            manager.add_read(read, annotation);
        }
        manager
    }

    pub fn add_read(&mut self, read: CandidateRead, annotation: &GeneAnnotation) {
        if read.blocks().is_empty() {
            tracing::warn!(read_id = %read.read_id, "read without blocks skipped");
            return;
        }

        let mut gene_ids: BTreeSet<&str> = BTreeSet::new();
        let mut transcript_ids: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut block_counts: BTreeMap<&str, u32> = BTreeMap::new();

        for block in read.blocks() {
            let gene_id = block.exon.gene_id.as_str();
            if gene_ids.insert(gene_id) && annotation.gene(gene_id).is_none() {
                tracing::warn!(gene_id, read_id = %read.read_id, "gene is not in annotation");
            }
            transcript_ids
                .entry(gene_id)
                .or_default()
                .insert(block.exon.transcript_id.as_str());
            *block_counts.entry(gene_id).or_insert(0) += 1;
        }

        let genes: Vec<String> = gene_ids.iter().map(|g| g.to_string()).collect();
        let fusion_id = genes.join(FUSION_SEP);
        let fusion_name = genes
            .iter()
            .map(|g| annotation.gene_name(g))
            .collect::<Vec<_>>()
            .join(FUSION_SEP);

        for gene in &genes {
            *self.gene_counts.entry(gene.clone()).or_insert(0) += 1;
        }

        let mut ratios: Vec<(String, f64)> = Vec::with_capacity(genes.len());
        for gene in gene_ids.iter().copied() {
            let max_exon_count = transcript_ids
                .get(gene)
                .into_iter()
                .flatten()
                .filter_map(|tid| {
                    let count = annotation.exon_count(tid);
                    if count.is_none() {
                        tracing::warn!(transcript_id = tid, gene_id = gene, "transcript has no exon count");
                    }
                    count
                })
                .fold(1, u32::max);
            let covered = block_counts.get(gene).copied().unwrap_or(0) as i64;
            let denom = (10 + max_exon_count as i64 - covered).max(1);
            ratios.push((gene.to_string(), 10.0 / denom as f64));
        }

        // Last gene of the sorted set decides forward vs backward.
        let last_gene = genes.last().cloned().unwrap_or_default();
        let bucket = ReadBucket::classify(&read, &last_gene);
        let consistent = read.is_strand_consistent();

        let cand = self
            .fusions
            .entry(fusion_id.clone())
            .or_insert_with(|| CandidateFusion {
                id: fusion_id,
                name: fusion_name,
                genes,
                ..Default::default()
            });

        if !consistent {
            cand.invalid += 1;
        }
        for (gene, ratio) in ratios {
            *cand.non_covered_sum_ratio.entry(gene).or_insert(0.0) += ratio;
        }
        cand.reads.push(BucketedRead { bucket, read });
    }

    /// Clusters in fusion-id order.
    pub fn fusions(&self) -> impl Iterator<Item = &CandidateFusion> + '_ {
        self.fusions.values()
    }

    pub fn fusions_mut(&mut self) -> impl Iterator<Item = &mut CandidateFusion> + '_ {
        self.fusions.values_mut()
    }

    pub fn get(&self, fusion_id: &str) -> Option<&CandidateFusion> {
        self.fusions.get(fusion_id)
    }

    pub fn len(&self) -> usize {
        self.fusions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fusions.is_empty()
    }

    /// Number of reads touching `gene_id`, over all clusters.
    pub fn gene_count(&self, gene_id: &str) -> u64 {
        self.gene_counts.get(gene_id).copied().unwrap_or(0)
    }

    pub fn gene_counts(&self) -> &BTreeMap<String, u64> {
        &self.gene_counts
    }
}
