use crate::annotation::GeneAnnotation;
use crate::fusion::{CandidateFusion, FusionManager};
use crate::interval_index::DuplicationIndex;

/// Unordered key pairs of a sorted map, in map order.
pub fn key_pairs<K: Clone, V>(map: &std::collections::BTreeMap<K, V>) -> Vec<(K, K)> {
    let keys: Vec<&K> = map.keys().collect();
    let mut pairs = Vec::new();
    for (i, a) in keys.iter().enumerate() {
        for b in &keys[i + 1..] {
            pairs.push(((*a).clone(), (*b).clone()));
        }
    }
    pairs
}

/// Flag duplicated loci and overlapping gene annotations on one cluster.
pub fn annotate_fusion(
    fusion: &mut CandidateFusion,
    annotation: &GeneAnnotation,
    duplications: &DuplicationIndex,
) {
    let ivals = fusion.fusion_gene_intervals();
    let pairs = key_pairs(&ivals);

    for (first, second) in &pairs {
        let query = &ivals[first];
        let other = &ivals[second];
        for hit in duplications.query(query) {
            let matched = hit.as_interval();
            if matched.overlaps(other) {
                fusion.duplications.push((query.clone(), matched));
            }
        }
    }

    for (first, second) in &pairs {
        match (annotation.gene(first), annotation.gene(second)) {
            (Some(f), Some(s)) => {
                if f.range.overlaps(&s.range) {
                    fusion.gene_overlaps.push((f.clone(), s.clone()));
                }
            }
            _ => {
                tracing::warn!(
                    fusion_id = %fusion.id,
                    first = %first,
                    second = %second,
                    "gene overlap check skipped, gene not in annotation"
                );
            }
        }
    }
}

pub fn annotate_duplications_and_overlaps(
    manager: &mut FusionManager,
    annotation: &GeneAnnotation,
    duplications: &DuplicationIndex,
) {
    for fusion in manager.fusions_mut() {
        annotate_fusion(fusion, annotation, duplications);
    }
}
