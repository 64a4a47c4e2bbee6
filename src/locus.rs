use std::fmt;

/// A single genomic position, ordered by chromosome then position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Locus {
    pub chrom: String,
    pub position: u32,
}

impl Locus {
    pub fn new(chrom: impl Into<String>, position: u32) -> Self {
        Self {
            chrom: chrom.into(),
            position,
        }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.chrom, self.position)
    }
}

/// Stranded genomic interval. Overlap tests are half-open: [start, end).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
    pub reverse_strand: bool,
}

impl Interval {
    pub fn new(chrom: impl Into<String>, start: u32, end: u32, reverse_strand: bool) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            chrom: chrom.into(),
            start,
            end,
            reverse_strand,
        }
    }

    pub fn start_locus(&self) -> Locus {
        Locus::new(self.chrom.clone(), self.start)
    }

    pub fn end_locus(&self) -> Locus {
        Locus::new(self.chrom.clone(), self.end)
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.chrom == other.chrom && self.start < other.end && other.start < self.end
    }

    /// Widen `self` to the bounding range of both intervals.
    ///
    /// Returns `false` and leaves `self` untouched when the intervals are on
    /// different strands or chromosomes.
    pub fn extend(&mut self, other: &Interval) -> bool {
        if self.chrom != other.chrom || self.reverse_strand != other.reverse_strand {
            return false;
        }
        self.start = self.start.min(other.start);
        self.end = self.end.max(other.end);
        true
    }

    /// `chrom:start-end`, without strand.
    pub fn region(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start, self.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}{}",
            self.chrom,
            self.start,
            self.end,
            if self.reverse_strand { '-' } else { '+' }
        )
    }
}

/// Fold step for bounding intervals: the first interval seeds the accumulator,
/// later ones widen it. Inconsistent intervals (strand or chromosome) are
/// skipped, mirroring `Interval::extend`.
pub fn merge_bounds(acc: Option<Interval>, next: &Interval) -> Option<Interval> {
    match acc {
        None => Some(next.clone()),
        Some(mut bounds) => {
            bounds.extend(next);
            Some(bounds)
        }
    }
}
