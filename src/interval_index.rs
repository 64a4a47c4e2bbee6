use crate::duplication::DuplicationHit;
use crate::locus::Interval;
use crate::types::{HashMap, HashMapExt};
use coitrees::{BasicCOITree, Interval as CoitreeInterval, IntervalTree as CoitreeIntervalTree};

/// One chromosome worth of duplication intervals. Metadata is an index into
/// `DuplicationIndex::hits`.
struct ChromTree {
    intervals: Vec<CoitreeInterval<usize>>,
    tree: Option<BasicCOITree<usize, u32>>,
}

impl ChromTree {
    fn new() -> Self {
        Self {
            intervals: Vec::new(),
            tree: None,
        }
    }

    fn add_interval(&mut self, start: u32, end: u32, idx: usize) {
        // COITree intervals are end-inclusive; convert [start, end) -> [start, end-1].
        let first = start as i32;
        let last = end.saturating_sub(1) as i32;
        if last >= first {
            self.intervals.push(CoitreeInterval::new(first, last, idx));
        }
    }

    fn index(&mut self) {
        self.tree = Some(BasicCOITree::new(&self.intervals));
    }

    fn query(&self, qstart: u32, qend: u32, mut visit: impl FnMut(usize)) {
        let Some(tree) = self.tree.as_ref() else {
            return;
        };
        if qend <= qstart {
            return;
        }
        let q_last = qend.saturating_sub(1) as i32;
        tree.query(qstart as i32, q_last, |node| {
            visit(node.metadata.to_owned());
        });
    }
}

/// Immutable overlap index over the duplication table.
///
/// Built once from every entry; queries return the payload of each source
/// interval overlapping the query, in no particular order.
pub struct DuplicationIndex {
    trees: HashMap<String, ChromTree>,
    hits: Vec<DuplicationHit>,
}

impl DuplicationIndex {
    pub fn build(entries: Vec<(Interval, DuplicationHit)>) -> Self {
        let mut trees: HashMap<String, ChromTree> = HashMap::new();
        let mut hits = Vec::with_capacity(entries.len());

        for (interval, hit) in entries {
            let idx = hits.len();
            hits.push(hit);
            trees
                .entry(interval.chrom)
                .or_insert_with(ChromTree::new)
                .add_interval(interval.start, interval.end, idx);
        }

        // Index all trees only after all intervals are inserted.
        for tree in trees.values_mut() {
            tree.index();
        }

        Self { trees, hits }
    }

    pub fn query(&self, interval: &Interval) -> Vec<&DuplicationHit> {
        let mut found = Vec::new();
        if let Some(tree) = self.trees.get(&interval.chrom) {
            tree.query(interval.start, interval.end, |idx| found.push(&self.hits[idx]));
        }
        found
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
