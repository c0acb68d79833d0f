//! Burst kernel.

use super::stats::{mad, median};
use crate::types::BurstMetrics;

/// A bin is bursting if its count exceeds `median + 3*MAD` of its own
/// series. Two bursts are aligned when their bin indices differ by at most
/// 1. Score is `aligned / sqrt(|bursts_a| * |bursts_b|)`.
pub fn evaluate(a: &[u32], b: &[u32], min_support: usize) -> Option<BurstMetrics> {
    if a.len() < 3 || b.len() < 3 {
        return None;
    }

    let bursts_a = bursting_indices(a);
    let bursts_b = bursting_indices(b);
    if bursts_a.is_empty() || bursts_b.is_empty() {
        return None;
    }

    let aligned = bursts_a
        .iter()
        .filter(|&&ia| bursts_b.iter().any(|&ib| (ia as i64 - ib as i64).abs() <= 1))
        .count();

    let score = aligned as f64 / ((bursts_a.len() * bursts_b.len()) as f64).sqrt();

    if aligned >= min_support && score >= 0.2 {
        Some(BurstMetrics { aligned, score })
    } else {
        None
    }
}

fn bursting_indices(series: &[u32]) -> Vec<usize> {
    let values: Vec<f64> = series.iter().map(|&c| c as f64).collect();
    let threshold = median(&values) + 3.0 * mad(&values);
    series
        .iter()
        .enumerate()
        .filter(|(_, &count)| (count as f64) > threshold)
        .map(|(idx, _)| idx)
        .collect()
}
