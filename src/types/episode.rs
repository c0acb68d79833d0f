//! `Episode`: a contiguous run of alerts sharing `(entity_key, fingerprint)`.

use super::{Alert, Severity};
use serde::Serialize;
use std::sync::Arc;

/// Maximum number of distinct samples kept for each sampled field.
pub const EPISODE_SAMPLE_CAP: usize = 50;

/// A contiguous run of alerts for one `(entity_key, fingerprint)` pair.
///
/// Invariant: `start <= end`, `count() >= 1`, and every alert in `alerts`
/// shares this episode's `(entity_key, fingerprint)`. No two consecutive
/// alerts are separated by more than the configured `episode_gap`.
#[derive(Debug, Clone)]
pub struct Episode {
    pub entity_key: String,
    pub fingerprint: String,
    pub start: i64,
    pub end: i64,
    /// All alerts in the episode, sorted ascending by `ts`. Excess beyond
    /// the sample caps below remain counted here but unsampled in output.
    pub alerts: Vec<Arc<Alert>>,
    pub vendors: Vec<String>,
    pub sample_vendor_event_ids: Vec<String>,
    pub sample_resource_ids: Vec<String>,
    pub sample_timestamps: Vec<i64>,
    pub deploy_keys: Vec<String>,
    pub net_keys: Vec<String>,
}

impl Episode {
    /// Build an episode from a time-sorted, non-empty run of alerts sharing
    /// `(entity_key, fingerprint)`.
    pub fn from_run(alerts: Vec<Arc<Alert>>) -> Self {
        debug_assert!(!alerts.is_empty());
        let first = &alerts[0];
        let entity_key = first.entity_key.clone();
        let fingerprint = first.fingerprint.clone();
        let start = alerts[0].ts;
        let end = alerts[alerts.len() - 1].ts;

        let mut vendors: Vec<String> = Vec::new();
        let mut deploy_keys: Vec<String> = Vec::new();
        let mut net_keys: Vec<String> = Vec::new();
        let mut sample_vendor_event_ids: Vec<String> = Vec::new();
        let mut sample_resource_ids: Vec<String> = Vec::new();
        let mut sample_timestamps: Vec<i64> = Vec::new();

        for a in &alerts {
            if !vendors.contains(&a.source) {
                vendors.push(a.source.clone());
            }
            if let Some(dk) = &a.deploy_key {
                if !deploy_keys.contains(dk) {
                    deploy_keys.push(dk.clone());
                }
            }
            if let Some(nk) = &a.net_key {
                if !net_keys.contains(nk) {
                    net_keys.push(nk.clone());
                }
            }
            if sample_vendor_event_ids.len() < EPISODE_SAMPLE_CAP
                && !sample_vendor_event_ids.contains(&a.vendor_event_id)
            {
                sample_vendor_event_ids.push(a.vendor_event_id.clone());
            }
            if sample_resource_ids.len() < EPISODE_SAMPLE_CAP
                && !sample_resource_ids.contains(&a.resource_id)
            {
                sample_resource_ids.push(a.resource_id.clone());
            }
            if sample_timestamps.len() < EPISODE_SAMPLE_CAP {
                sample_timestamps.push(a.ts);
            }
        }

        Self {
            entity_key,
            fingerprint,
            start,
            end,
            alerts,
            vendors,
            sample_vendor_event_ids,
            sample_resource_ids,
            sample_timestamps,
            deploy_keys,
            net_keys,
        }
    }

    pub fn count(&self) -> usize {
        self.alerts.len()
    }

    /// Max severity across the episode's alerts — used by `CauseSelector`.
    pub fn max_severity(&self) -> Severity {
        self.alerts
            .iter()
            .map(|a| a.severity)
            .max()
            .unwrap_or(Severity::Low)
    }

    pub fn summary(&self) -> EpisodeSummary {
        EpisodeSummary {
            entity_key: self.entity_key.clone(),
            fingerprint: self.fingerprint.clone(),
            start: self.start,
            end: self.end,
            count: self.count(),
        }
    }
}

/// The slim per-episode view embedded in a `situation` output record.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeSummary {
    pub entity_key: String,
    pub fingerprint: String,
    pub start: i64,
    pub end: i64,
    pub count: usize,
}
