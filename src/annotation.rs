use crate::locus::Interval;
use crate::types::{HashMap, HashMapExt};
use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const PROTEIN_CODING: &str = "protein_coding";

#[derive(Debug, Clone)]
pub struct Gene {
    pub range: Interval,
    pub gene_id: String,
    pub gene_name: String,
    pub gene_type: String,
    pub coding: bool,
}

impl Gene {
    pub fn new(range: Interval, gene_id: &str, gene_name: &str, gene_type: &str) -> Self {
        Self {
            range,
            gene_id: gene_id.to_string(),
            gene_name: gene_name.to_string(),
            gene_type: gene_type.to_string(),
            coding: gene_type == PROTEIN_CODING,
        }
    }
}

/// Gene records keyed by id, plus the number of exons of every transcript.
///
/// Built once per run and only read afterwards.
#[derive(Debug, Default)]
pub struct GeneAnnotation {
    genes: HashMap<String, Gene>,
    transcript_exon_counts: HashMap<String, u32>,
}

impl GeneAnnotation {
    pub fn new() -> Self {
        Self {
            genes: HashMap::new(),
            transcript_exon_counts: HashMap::new(),
        }
    }

    pub fn insert_gene(&mut self, gene: Gene) {
        self.genes.insert(gene.gene_id.clone(), gene);
    }

    pub fn set_exon_count(&mut self, transcript_id: &str, count: u32) {
        self.transcript_exon_counts
            .insert(transcript_id.to_string(), count);
    }

    pub fn gene(&self, gene_id: &str) -> Option<&Gene> {
        self.genes.get(gene_id)
    }

    pub fn exon_count(&self, transcript_id: &str) -> Option<u32> {
        self.transcript_exon_counts.get(transcript_id).copied()
    }

    /// Display name of a gene, falling back to its id when unannotated.
    pub fn gene_name<'a>(&'a self, gene_id: &'a str) -> &'a str {
        self.genes
            .get(gene_id)
            .map(|g| g.gene_name.as_str())
            .unwrap_or(gene_id)
    }

    pub fn gene_count(&self) -> usize {
        self.genes.len()
    }

    pub fn transcript_count(&self) -> usize {
        self.transcript_exon_counts.len()
    }
}

/// Drop an Ensembl-style version suffix: `ENSG00000186092.6` -> `ENSG00000186092`.
pub fn strip_version(id: &str) -> &str {
    match id.find('.') {
        Some(pos) => &id[..pos],
        None => id,
    }
}

/// Load gene records and transcript exon counts from a GTF.
///
/// Gene ranges keep the GTF's raw 1-based coordinates; they are only compared
/// with each other, and the upstream chain coordinates use the same convention.
pub fn load_gene_annotation(path: &Path) -> Result<GeneAnnotation> {
    let reader = File::open(path)
        .with_context(|| format!("cannot open annotation {}", path.display()))?;
    let mut reader = noodles::gtf::io::Reader::new(BufReader::new(reader));

    let mut annotation = GeneAnnotation::new();

    for result in reader.record_bufs() {
        let record = result.with_context(|| format!("failed to parse {}", path.display()))?;

        let feature_type: &[u8] = record.ty().as_ref();
        let attrs = record.attributes();

        if feature_type == b"gene" {
            let seqname = record.reference_sequence_name().to_string();
            let start = u32::try_from(record.start().get())
                .map_err(|_| anyhow!("GTF start out of range"))?;
            let end = u32::try_from(record.end().get())
                .map_err(|_| anyhow!("GTF end out of range"))?;
            let reverse = matches!(
                record.strand(),
                noodles::gff::feature::record::Strand::Reverse
            );

            let raw_id = get_record_buf_attribute(attrs, b"gene_id")
                .ok_or_else(|| anyhow!("missing gene_id in GTF attributes"))?;
            let gene_id = strip_version(&raw_id).to_string();
            let gene_name = get_record_buf_attribute(attrs, b"gene_name")
                .unwrap_or_else(|| gene_id.clone());
            let gene_type = get_record_buf_attribute(attrs, b"gene_type")
                .or_else(|| get_record_buf_attribute(attrs, b"gene_biotype"))
                .unwrap_or_default();

            annotation.insert_gene(Gene::new(
                Interval::new(seqname, start, end, reverse),
                &gene_id,
                &gene_name,
                &gene_type,
            ));
        } else if feature_type == b"exon" {
            let Some(raw_tid) = get_record_buf_attribute(attrs, b"transcript_id") else {
                tracing::warn!(path = %path.display(), "exon without transcript_id");
                continue;
            };
            *annotation
                .transcript_exon_counts
                .entry(strip_version(&raw_tid).to_string())
                .or_insert(0) += 1;
        }
    }

    tracing::info!(
        genes = annotation.gene_count(),
        transcripts = annotation.transcript_count(),
        "loaded gene annotation"
    );

    Ok(annotation)
}

fn get_record_buf_attribute(
    attrs: &noodles::gff::feature::record_buf::Attributes,
    key: &[u8],
) -> Option<String> {
    let value = attrs.get(key)?;
    value.iter().next().map(|v| v.to_string())
}
