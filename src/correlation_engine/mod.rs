//! Stage 6: runs the burst, PMI, and lead-lag kernels over every series pair
//! inside a situation.

mod burst;
mod leadlag;
mod pmi;
mod stats;

use crate::types::{CorrelationMetrics, CorrelationMethod, CorrelationRecord, Situation};

/// Series cap: only the 400 series with the largest total count survive.
const MAX_SERIES: usize = 400;
/// Pair cap: truncate to the first 20,000 pairs in combination order.
const MAX_PAIRS: usize = 20_000;
/// Resource-id samples kept per side, for drill-down.
const RESOURCE_SAMPLE_CAP: usize = 10;

/// Evaluate every series pair in `situation` and return the correlation
/// records it emits, in burst-then-PMI-then-lead-lag order.
pub fn evaluate(situation: &Situation, min_support: usize, max_lag_sec: i64) -> Vec<CorrelationRecord> {
    if situation.insufficient_temporal_spread {
        return Vec::new();
    }
    let Some(bin_size_s) = situation.bin_size_s else {
        return Vec::new();
    };
    let window = match situation.padded_window {
        Some(w) => w,
        None => situation.window,
    };
    let bin_size_ms = bin_size_s * 1000;
    let max_lag_bins = ((max_lag_sec / bin_size_s).max(1)) as usize;

    let mut series: Vec<(&String, &Vec<u32>)> = situation.bins.iter().collect();
    if series.len() > MAX_SERIES {
        series.sort_by_key(|(_, v)| std::cmp::Reverse(v.iter().map(|&c| c as u64).sum::<u64>()));
        series.truncate(MAX_SERIES);
    }
    series.sort_by_key(|(k, _)| (*k).clone());

    let mut pairs: Vec<(&String, &Vec<u32>, &String, &Vec<u32>)> = Vec::new();
    'outer: for i in 0..series.len() {
        for j in (i + 1)..series.len() {
            if pairs.len() >= MAX_PAIRS {
                break 'outer;
            }
            let (key_a, vec_a) = series[i];
            let (key_b, vec_b) = series[j];
            if key_a < key_b {
                pairs.push((key_a, vec_a, key_b, vec_b));
            } else {
                pairs.push((key_b, vec_b, key_a, vec_a));
            }
        }
    }

    let mut records = Vec::new();

    for &(series_a, a, series_b, b) in &pairs {
        if let Some(metrics) = burst::evaluate(a, b, min_support) {
            records.push(record(situation, series_a, series_b, window, CorrelationMetrics::Burst(metrics)));
        }
    }
    for &(series_a, a, series_b, b) in &pairs {
        if let Some(metrics) = pmi::evaluate(a, b, min_support) {
            records.push(record(situation, series_a, series_b, window, CorrelationMetrics::Pmi(metrics)));
        }
    }
    for &(series_a, a, series_b, b) in &pairs {
        if let Some(metrics) = leadlag::evaluate(a, b, max_lag_bins, bin_size_ms) {
            records.push(record(situation, series_a, series_b, window, CorrelationMetrics::LeadLag(metrics)));
        }
    }

    records
}

fn record(
    situation: &Situation,
    series_a: &str,
    series_b: &str,
    window: crate::types::Window,
    metrics: CorrelationMetrics,
) -> CorrelationRecord {
    CorrelationRecord {
        method: match metrics {
            CorrelationMetrics::Burst(_) => CorrelationMethod::Burst,
            CorrelationMetrics::Pmi(_) => CorrelationMethod::Pmi,
            CorrelationMetrics::LeadLag(_) => CorrelationMethod::LeadLag,
        },
        situation_id: situation.situation_id.clone(),
        series_a: series_a.to_string(),
        series_b: series_b.to_string(),
        window,
        metrics,
        resource_ids_a: resource_ids_for_series(situation, series_a),
        resource_ids_b: resource_ids_for_series(situation, series_b),
    }
}

fn resource_ids_for_series(situation: &Situation, fingerprint: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for episode in &situation.episodes {
        if episode.fingerprint != fingerprint {
            continue;
        }
        for alert in &episode.alerts {
            if ids.len() >= RESOURCE_SAMPLE_CAP {
                return ids;
            }
            if !ids.contains(&alert.resource_id) {
                ids.push(alert.resource_id.clone());
            }
        }
    }
    ids
}
