use fusion_annotate_rs::annotate::{annotate_duplications_and_overlaps, key_pairs};
use fusion_annotate_rs::annotation::{Gene, GeneAnnotation};
use fusion_annotate_rs::duplication::DuplicationHit;
use fusion_annotate_rs::{CandidateRead, DuplicationIndex, Exon, FusionManager, Interval};
use std::collections::BTreeMap;

fn two_gene_read(id: &str, a: (&str, &str, u32, u32), b: (&str, &str, u32, u32)) -> CandidateRead {
    let mut r = CandidateRead::new(id);
    for (gene, chrom, start, end) in [a, b] {
        r.add_block(
            Interval::new(chrom, start, end, false),
            Exon {
                range: Interval::new(chrom, start, end, false),
                gene_id: gene.to_string(),
                transcript_id: format!("{}-T", gene),
                exon_no: 2,
            },
        );
    }
    r
}

fn annotation(overlapping: bool) -> GeneAnnotation {
    let mut ann = GeneAnnotation::new();
    ann.insert_gene(Gene::new(Interval::new("1", 1_000, 10_000, false), "GA", "A", "protein_coding"));
    let (start, end) = if overlapping { (9_000, 15_000) } else { (20_000, 30_000) };
    ann.insert_gene(Gene::new(Interval::new("1", start, end, false), "GB", "B", "protein_coding"));
    ann
}

fn manager(ann: &GeneAnnotation) -> FusionManager {
    let reads = vec![
        two_gene_read("r1", ("GA", "1", 2_000, 2_200), ("GB", "1", 21_000, 21_300)),
        two_gene_read("r2", ("GA", "1", 2_500, 2_700), ("GB", "1", 21_500, 21_800)),
    ];
    FusionManager::from_reads(reads, ann)
}

fn dup(src: (u32, u32), matched: (&str, u32, u32)) -> (Interval, DuplicationHit) {
    (
        Interval::new("1", src.0, src.1, false),
        DuplicationHit {
            chrom: matched.0.to_string(),
            start: matched.1,
            end: matched.2,
            frac_match: 0.98,
        },
    )
}

#[test]
fn duplication_linking_both_genes_is_recorded() {
    let ann = annotation(false);
    let mut m = manager(&ann);
    let index = DuplicationIndex::build(vec![dup((2_100, 2_600), ("1", 21_200, 21_600))]);

    annotate_duplications_and_overlaps(&mut m, &ann, &index);
    let fusion = m.get("GA::GB").unwrap();
    assert_eq!(fusion.duplications.len(), 1);
    let (query, matched) = &fusion.duplications[0];
    assert_eq!(query, &Interval::new("1", 2_000, 2_700, false));
    assert_eq!(matched, &Interval::new("1", 21_200, 21_600, false));
    assert!(fusion.gene_overlaps.is_empty());
}

#[test]
fn duplication_elsewhere_is_ignored() {
    let ann = annotation(false);
    let mut m = manager(&ann);
    let index = DuplicationIndex::build(vec![
        // Source hits gene A but the copy is on another chromosome.
        dup((2_100, 2_600), ("5", 21_200, 21_600)),
        // Source misses gene A entirely.
        dup((50_000, 60_000), ("1", 21_200, 21_600)),
    ]);

    annotate_duplications_and_overlaps(&mut m, &ann, &index);
    assert!(m.get("GA::GB").unwrap().duplications.is_empty());
}

#[test]
fn overlapping_gene_annotations_are_flagged() {
    let ann = annotation(true);
    let mut m = manager(&ann);
    annotate_duplications_and_overlaps(&mut m, &ann, &DuplicationIndex::build(Vec::new()));

    let fusion = m.get("GA::GB").unwrap();
    assert_eq!(fusion.gene_overlaps.len(), 1);
    assert_eq!(fusion.gene_overlaps[0].0.gene_id, "GA");
    assert_eq!(fusion.gene_overlaps[0].1.gene_id, "GB");
}

#[test]
fn pairs_with_unannotated_gene_are_skipped() {
    let ann = GeneAnnotation::new();
    let mut m = manager(&ann);
    annotate_duplications_and_overlaps(&mut m, &ann, &DuplicationIndex::build(Vec::new()));
    assert!(m.get("GA::GB").unwrap().gene_overlaps.is_empty());
}

#[test]
fn key_pairs_are_unordered_and_sorted() {
    let map: BTreeMap<&str, ()> = [("c", ()), ("a", ()), ("b", ())].into_iter().collect();
    assert_eq!(key_pairs(&map), vec![("a", "b"), ("a", "c"), ("b", "c")]);
}
