//! Stage 5: adaptive padding and binning.

use crate::types::{Alert, Situation, Window};
use std::collections::{HashMap, HashSet};

const MIN_BINS: usize = 3;
const MIN_SITUATION_MS: i64 = 10_000;
/// Padding steps tried in order; all four stay within `MAX_PAD_MS`.
const PAD_STEPS_MS: [i64; 4] = [60_000, 120_000, 240_000, 480_000];
const BIN_SIZES_S: [i64; 2] = [1, 5];

/// Spread every situation: pick the smallest padding/bin-width combination
/// that exposes at least `MIN_BINS` non-empty bins, or mark it insufficient.
///
/// `all_alerts` is the full post-`NoiseFilter` alert set; relevant alerts
/// may fall outside a situation's own episodes once the window is padded.
pub fn spread(situations: Vec<Situation>, all_alerts: &[Alert]) -> Vec<Situation> {
    situations.into_iter().map(|s| spread_one(s, all_alerts)).collect()
}

fn spread_one(mut situation: Situation, all_alerts: &[Alert]) -> Situation {
    let raw_duration = situation.window.end - situation.window.start;
    if raw_duration < MIN_SITUATION_MS {
        situation.insufficient_temporal_spread = true;
        situation.reason = Some("raw situation duration below MIN_SITUATION_MS".to_string());
        return situation;
    }

    let entity_keys: HashSet<&str> = situation.episodes.iter().map(|e| e.entity_key.as_str()).collect();
    let fingerprints: HashSet<&str> = situation.episodes.iter().map(|e| e.fingerprint.as_str()).collect();
    let deploy_keys: HashSet<&str> = situation
        .episodes
        .iter()
        .flat_map(|e| e.deploy_keys.iter().map(String::as_str))
        .collect();
    let net_keys: HashSet<&str> = situation
        .episodes
        .iter()
        .flat_map(|e| e.net_keys.iter().map(String::as_str))
        .collect();

    let relevant: Vec<&Alert> = all_alerts
        .iter()
        .filter(|a| {
            entity_keys.contains(a.entity_key.as_str())
                || fingerprints.contains(a.fingerprint.as_str())
                || a.deploy_key.as_deref().is_some_and(|k| deploy_keys.contains(k))
                || a.net_key.as_deref().is_some_and(|k| net_keys.contains(k))
        })
        .collect();

    for &pad_ms in &PAD_STEPS_MS {
        let padded_start = situation.window.start - pad_ms;
        let padded_end = situation.window.end + pad_ms;

        for &bin_size_s in &BIN_SIZES_S {
            let bin_size_ms = bin_size_s * 1000;
            let bins = bin_series(&relevant, padded_start, padded_end, bin_size_ms);
            if count_non_empty_bins(&bins) >= MIN_BINS {
                situation.pad_ms_used = Some(pad_ms);
                situation.bin_size_s = Some(bin_size_s);
                situation.padded_window = Some(Window { start: padded_start, end: padded_end });
                situation.bins = bins;
                situation.insufficient_temporal_spread = false;
                situation.reason = None;
                return situation;
            }
        }
    }

    situation.insufficient_temporal_spread = true;
    situation.reason = Some("exhausted padding/bin-width options without reaching MIN_BINS".to_string());
    situation
}

fn bin_series(alerts: &[&Alert], padded_start: i64, padded_end: i64, bin_size_ms: i64) -> HashMap<String, Vec<u32>> {
    let num_bins = ((padded_end - padded_start) / bin_size_ms) as usize + 1;
    let mut bins: HashMap<String, Vec<u32>> = HashMap::new();
    for alert in alerts {
        if alert.ts < padded_start || alert.ts > padded_end {
            continue;
        }
        let idx = (((alert.ts - padded_start) / bin_size_ms) as usize).min(num_bins - 1);
        let series = bins.entry(alert.fingerprint.clone()).or_insert_with(|| vec![0u32; num_bins]);
        series[idx] += 1;
    }
    bins
}

fn count_non_empty_bins(bins: &HashMap<String, Vec<u32>>) -> usize {
    let mut occupied: HashSet<usize> = HashSet::new();
    for series in bins.values() {
        for (idx, &count) in series.iter().enumerate() {
            if count > 0 {
                occupied.insert(idx);
            }
        }
    }
    occupied.len()
}
