//! Shared order-statistics helpers for the burst kernel, built on `statrs`
//! rather than hand-rolling order statistics.

use statrs::statistics::{Data, OrderStatistics};

pub fn median(values: &[f64]) -> f64 {
    Data::new(values.to_vec()).median()
}

/// Median absolute deviation around the sample median.
pub fn mad(values: &[f64]) -> f64 {
    let m = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - m).abs()).collect();
    median(&deviations)
}
