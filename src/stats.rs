//! Background-corrected significance of fusion clusters.
//!
//! Each cluster gets a one-sided hypergeometric enrichment p-value; the
//! vector of p-values, in fusion-id order, is then corrected jointly with
//! Benjamini–Yekutieli.

use crate::background::BackgroundCounts;
use crate::fusion::{CandidateFusion, FusionManager};
use anyhow::{anyhow, Result};
use statrs::distribution::{DiscreteCDF, Hypergeometric};

pub const DEFAULT_ALPHA: f64 = 0.05;

/// `P(X >= x)` for `X ~ Hypergeometric(population, successes, draws)`.
pub fn hypergeom_upper_tail(x: u64, population: u64, successes: u64, draws: u64) -> Result<f64> {
    if x == 0 {
        return Ok(1.0);
    }
    let dist = Hypergeometric::new(population, successes, draws).map_err(|e| {
        anyhow!(
            "invalid hypergeometric parameters (N={}, m={}, n={}): {}",
            population,
            successes,
            draws,
            e
        )
    })?;
    Ok(dist.sf(x - 1).clamp(0.0, 1.0))
}

/// Result of a joint multiple-testing correction, index-aligned with the
/// input p-values.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    pub corr_pvals: Vec<f64>,
    pub null_rejected: Vec<bool>,
}

/// Benjamini–Yekutieli step-up correction at level `alpha`.
pub fn benjamini_yekutieli(pvalues: &[f64], alpha: f64) -> Hypothesis {
    let m = pvalues.len();
    if m == 0 {
        return Hypothesis {
            corr_pvals: Vec::new(),
            null_rejected: Vec::new(),
        };
    }

    let harmonic: f64 = (1..=m).map(|i| 1.0 / i as f64).sum();
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| pvalues[a].total_cmp(&pvalues[b]).then(a.cmp(&b)));

    let mut corr_pvals = vec![1.0; m];
    let mut running_min = 1.0_f64;
    for (rank, &idx) in order.iter().enumerate().rev() {
        let scaled = pvalues[idx] * m as f64 * harmonic / (rank + 1) as f64;
        running_min = running_min.min(scaled);
        corr_pvals[idx] = running_min.clamp(0.0, 1.0);
    }

    let null_rejected = corr_pvals.iter().map(|&p| p <= alpha).collect();
    Hypothesis {
        corr_pvals,
        null_rejected,
    }
}

/// Geometric mean of the background counts of the cluster's genes.
pub fn average_normal_count(fusion: &CandidateFusion, background: &BackgroundCounts) -> f64 {
    if fusion.genes.is_empty() {
        return 0.0;
    }
    let product: f64 = fusion
        .genes
        .iter()
        .map(|g| background.gene_count(g) as f64)
        .product();
    product.powf(1.0 / fusion.genes.len() as f64)
}

/// Enrichment p-value of a cluster's read count against the background of
/// its genes.
pub fn test_candidate(fusion: &CandidateFusion, background: &BackgroundCounts) -> Result<f64> {
    let avg = average_normal_count(fusion, background);
    let x = fusion.total_count() as u64;
    let n = x + avg as u64;
    let population = 2 * n;
    let m = (x + (background.chimera_rate() * avg) as u64).min(population);
    hypergeom_upper_tail(x, population, m, n)
}

/// Per-cluster outcome of the significance test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionTest {
    pub pvalue: f64,
    pub corrected: f64,
    pub null_rejected: bool,
}

/// Test every cluster and correct jointly. The result is in the manager's
/// fusion-id order and has one entry per cluster.
pub fn score_fusions(
    manager: &FusionManager,
    background: &BackgroundCounts,
    alpha: f64,
) -> Result<Vec<FusionTest>> {
    let pvalues = manager
        .fusions()
        .map(|f| test_candidate(f, background))
        .collect::<Result<Vec<f64>>>()?;
    let hypothesis = benjamini_yekutieli(&pvalues, alpha);

    let tests: Vec<FusionTest> = pvalues
        .iter()
        .zip(hypothesis.corr_pvals.iter())
        .zip(hypothesis.null_rejected.iter())
        .map(|((&pvalue, &corrected), &null_rejected)| FusionTest {
            pvalue,
            corrected,
            null_rejected,
        })
        .collect();

    if tests.len() != manager.len() {
        return Err(anyhow!(
            "corrected p-values ({}) do not line up with clusters ({})",
            tests.len(),
            manager.len()
        ));
    }

    let significant = tests.iter().filter(|t| t.null_rejected).count();
    tracing::info!(clusters = tests.len(), significant, "scored fusion clusters");
    Ok(tests)
}
