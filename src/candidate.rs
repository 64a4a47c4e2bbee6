use crate::locus::{merge_bounds, Interval, Locus};
use anyhow::{anyhow, Context, Result};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Exon {
    pub range: Interval,
    pub gene_id: String,
    pub transcript_id: String,
    pub exon_no: u32,
}

/// One aligned piece of a read and the exon it was assigned to.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub alignment: Interval,
    pub exon: Exon,
}

impl Block {
    pub fn strand_mismatch(&self) -> bool {
        self.alignment.reverse_strand ^ self.exon.range.reverse_strand
    }
}

/// A chimeric read: its blocks in alignment order plus the positions of
/// blocks assigned to a first exon.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRead {
    pub read_id: String,
    blocks: Vec<Block>,
    first_exons: Vec<usize>,
}

impl CandidateRead {
    pub fn new(read_id: impl Into<String>) -> Self {
        Self {
            read_id: read_id.into(),
            blocks: Vec::new(),
            first_exons: Vec::new(),
        }
    }

    pub fn add_block(&mut self, alignment: Interval, exon: Exon) {
        if exon.exon_no == 1 {
            self.first_exons.push(self.blocks.len());
        }
        self.blocks.push(Block { alignment, exon });
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn first_exons(&self) -> &[usize] {
        &self.first_exons
    }

    /// True when every block carries the same alignment/exon strand relation.
    pub fn is_strand_consistent(&self) -> bool {
        let mut flags = self.blocks.iter().map(Block::strand_mismatch);
        match flags.next() {
            Some(first) => flags.all(|f| f == first),
            None => true,
        }
    }

    /// Gene ids in order of first appearance along the read.
    pub fn genes_in_order(&self) -> Vec<&str> {
        let mut genes: Vec<&str> = Vec::new();
        for block in &self.blocks {
            if !genes.contains(&block.exon.gene_id.as_str()) {
                genes.push(&block.exon.gene_id);
            }
        }
        genes
    }

    /// Bounding alignment interval of the read on each gene.
    pub fn ranges(&self) -> BTreeMap<&str, Interval> {
        let mut acc: BTreeMap<&str, Option<Interval>> = BTreeMap::new();
        for block in &self.blocks {
            let slot = acc.entry(block.exon.gene_id.as_str()).or_default();
            *slot = merge_bounds(slot.take(), &block.alignment);
        }
        acc.into_iter()
            .filter_map(|(gene, bounds)| bounds.map(|b| (gene, b)))
            .collect()
    }

    /// Breakpoint locus per gene.
    ///
    /// With `direction == true` the gene of the first block is the 5' side of
    /// the junction; with `false` the roles are swapped. Each gene's locus is
    /// pushed monotonically towards the junction as more blocks are seen.
    pub fn get_breakpoints(&self, direction: bool) -> BTreeMap<&str, Locus> {
        let mut bps: BTreeMap<&str, Locus> = BTreeMap::new();
        let Some(first_gene) = self.blocks.first().map(|b| b.exon.gene_id.as_str()) else {
            return bps;
        };

        for block in &self.blocks {
            let gene_id = block.exon.gene_id.as_str();
            let is_first = (gene_id == first_gene) == direction;
            let iv = &block.alignment;
            let reverse = iv.reverse_strand;

            match bps.entry(gene_id) {
                Entry::Vacant(slot) => {
                    slot.insert(if reverse == is_first {
                        iv.end_locus()
                    } else {
                        iv.start_locus()
                    });
                }
                Entry::Occupied(mut slot) => match (reverse, is_first) {
                    (true, true) | (false, false) => {
                        if slot.get().position < iv.end {
                            slot.insert(iv.end_locus());
                        }
                    }
                    (true, false) | (false, true) => {
                        if slot.get().position > iv.start {
                            slot.insert(iv.start_locus());
                        }
                    }
                },
            }
        }

        bps
    }

    /// `read_id<TAB>gene<TAB>chrom:start-end...` for the per-read log.
    pub fn log_line(&self) -> String {
        let mut line = self.read_id.clone();
        for (gene, range) in self.ranges() {
            line.push('\t');
            line.push_str(gene);
            line.push('\t');
            line.push_str(&range.region());
        }
        line
    }
}

// chain block column layout (0-based)
const ALN_START: usize = 1;
const ALN_END: usize = 2;
const CHROM: usize = 3;
const ALN_REVERSE: usize = 6;
const EXON_START: usize = 8;
const EXON_END: usize = 9;
const EXON_REVERSE: usize = 10;
const GENE_ID: usize = 11;
const TRANSCRIPT_ID: usize = 12;
const EXON_NO: usize = 13;

/// Parse one block line of a chain file into its alignment interval and exon.
pub fn parse_block_line(line: &str) -> Result<(Interval, Exon)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() <= EXON_NO {
        return Err(anyhow!(
            "expected at least {} fields in block line, found {}",
            EXON_NO + 1,
            fields.len()
        ));
    }
    let int = |idx: usize| -> Result<u32> {
        fields[idx]
            .trim()
            .parse::<u32>()
            .map_err(|e| anyhow!("field {} ({:?}): {}", idx, fields[idx], e))
    };

    let chrom = fields[CHROM];
    let alignment = Interval::new(
        chrom,
        int(ALN_START)?,
        int(ALN_END)?,
        fields[ALN_REVERSE].trim() == "1",
    );
    let exon = Exon {
        range: Interval::new(
            chrom,
            int(EXON_START)?,
            int(EXON_END)?,
            fields[EXON_REVERSE].trim() == "1",
        ),
        gene_id: fields[GENE_ID].to_string(),
        transcript_id: fields[TRANSCRIPT_ID].to_string(),
        exon_no: int(EXON_NO)?,
    };
    Ok((alignment, exon))
}

/// Read per-read block chains: a `read_id<TAB>block_count` header followed by
/// `block_count` block lines, repeated.
pub fn read_chains(path: &Path) -> Result<Vec<CandidateRead>> {
    let file =
        File::open(path).with_context(|| format!("cannot open chains {}", path.display()))?;
    let mut lines = BufReader::new(file).lines().enumerate();

    let mut reads = Vec::new();
    while let Some((lineno, line)) = lines.next() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut header = line.split('\t');
        let read_id = header.next().unwrap_or_default();
        let block_count: usize = header
            .next()
            .ok_or_else(|| anyhow!("missing block count"))
            .and_then(|c| c.trim().parse::<usize>().map_err(|e| anyhow!("bad block count: {}", e)))
            .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;

        let mut read = CandidateRead::new(read_id);
        for _ in 0..block_count {
            let (lineno, line) = lines.next().ok_or_else(|| {
                anyhow!(
                    "{}: chain for read {} truncated, expected {} blocks",
                    path.display(),
                    read_id,
                    block_count
                )
            })?;
            let (alignment, exon) = parse_block_line(&line?)
                .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
            read.add_block(alignment, exon);
        }
        reads.push(read);
    }

    tracing::info!(reads = reads.len(), "loaded candidate chains");
    Ok(reads)
}
