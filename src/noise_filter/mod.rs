//! Stage 2: dedup TTL, cross-vendor echo suppression, and flap tracking.
//!
//! The dedup cache, echo tracker and flap tracker are owned fields here
//! rather than process-wide globals; `CauseSelector` later reads flap/echo
//! state through a shared reference, the filter itself is never mutated
//! again after `apply` returns.

use crate::types::{Alert, AlertStatus, Severity};
use std::collections::HashMap;

/// Cross-vendor echo window.
const ECHO_WINDOW_MS: i64 = 10_000;
/// Flap history window.
const FLAP_WINDOW_MS: i64 = 10 * 60 * 1000;
/// Flap score cap.
const FLAP_SCORE_CAP: f64 = 0.3;
/// Echo-penalty constant used by `CauseSelector`'s composite score.
pub const ECHO_PENALTY: f64 = 0.3;

type DedupKey = (String, Severity, String);
type TrackerKey = (String, String);

/// Owns the mutable noise-reduction trackers for one run.
#[derive(Debug, Default)]
pub struct NoiseFilter {
    dedup_cache: HashMap<DedupKey, i64>,
    echo_tracker: HashMap<TrackerKey, Vec<(i64, String)>>,
    flap_tracker: HashMap<TrackerKey, Vec<(i64, AlertStatus)>>,
}

impl NoiseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the three in-pass filters in order over alerts sorted
    /// ascending by `ts`. Returns the surviving alerts, still ascending.
    pub fn apply(&mut self, mut alerts: Vec<Alert>, dedup_ttl_sec: i64) -> Vec<Alert> {
        alerts.sort_by_key(|a| a.ts);
        let dedup_ttl_ms = dedup_ttl_sec * 1000;
        let mut survivors = Vec::with_capacity(alerts.len());

        for alert in alerts {
            let dedup_key = (alert.fingerprint.clone(), alert.severity, alert.entity_key.clone());
            if let Some(&prev_ts) = self.dedup_cache.get(&dedup_key) {
                if alert.ts - prev_ts < dedup_ttl_ms {
                    continue;
                }
            }
            self.dedup_cache.insert(dedup_key, alert.ts);

            let echo_key = (alert.fingerprint.clone(), alert.entity_key.clone());
            let recent = self.echo_tracker.entry(echo_key.clone()).or_default();
            recent.retain(|(ts, _)| alert.ts - *ts <= ECHO_WINDOW_MS);
            let is_echo = recent.iter().any(|(_, src)| *src != alert.source);
            if is_echo {
                continue;
            }
            recent.push((alert.ts, alert.source.clone()));

            let flap_key = (alert.fingerprint.clone(), alert.entity_key.clone());
            let history = self.flap_tracker.entry(flap_key).or_default();
            history.retain(|(ts, _)| alert.ts - *ts <= FLAP_WINDOW_MS);
            history.push((alert.ts, alert.status));

            survivors.push(alert);
        }

        survivors
    }

    /// `min(0.3, flips / window_length)`.
    pub fn flap_score(&self, fingerprint: &str, entity_key: &str) -> f64 {
        let key = (fingerprint.to_string(), entity_key.to_string());
        let Some(history) = self.flap_tracker.get(&key) else {
            return 0.0;
        };
        if history.len() < 2 {
            return 0.0;
        }
        let flips = history.windows(2).filter(|w| w[0].1 != w[1].1).count();
        (flips as f64 / history.len() as f64).min(FLAP_SCORE_CAP)
    }

    /// Whether the echo tracker retained more than one distinct source for
    /// this `(fingerprint, entity_key)` — feeds the `echo` penalty in
    /// `CauseSelector`'s composite score.
    pub fn has_multi_source_echo(&self, fingerprint: &str, entity_key: &str) -> bool {
        let key = (fingerprint.to_string(), entity_key.to_string());
        self.echo_tracker
            .get(&key)
            .is_some_and(|sources| sources.iter().map(|(_, s)| s).collect::<std::collections::HashSet<_>>().len() > 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagValue;
    use std::collections::HashMap as Map;

    fn alert(ts: i64, fingerprint: &str, entity_key: &str, source: &str, status: AlertStatus) -> Alert {
        Alert {
            ts,
            source: source.to_string(),
            vendor_event_id: format!("evt-{ts}"),
            resource_id: format!("res-{ts}"),
            fingerprint: fingerprint.to_string(),
            status,
            severity: Severity::High,
            title: Some("title".to_string()),
            service: Some("svc".to_string()),
            cluster: None,
            ns: None,
            pod: None,
            host: None,
            deploy_key: None,
            net_key: None,
            tags: Map::<String, TagValue>::new(),
            entity_key: entity_key.to_string(),
        }
    }

    #[test]
    fn middle_alert_within_ttl_is_dropped() {
        // Three alerts with identical fingerprint/severity/entity at
        // t = 0, 60_000, 125_000 ms, dedup_ttl = 120s. Expected: alerts at
        // 0 and 125_000 survive; the 60_000 one is dropped.
        let alerts = vec![
            alert(0, "fp", "svc:a", "datadog", AlertStatus::Firing),
            alert(60_000, "fp", "svc:a", "datadog", AlertStatus::Firing),
            alert(125_000, "fp", "svc:a", "datadog", AlertStatus::Firing),
        ];
        let mut filter = NoiseFilter::new();
        let survivors = filter.apply(alerts, 120);
        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].ts, 0);
        assert_eq!(survivors[1].ts, 125_000);
    }

    #[test]
    fn invariant_no_two_survivors_within_ttl() {
        let alerts = vec![
            alert(0, "fp", "svc:a", "datadog", AlertStatus::Firing),
            alert(1_000, "fp", "svc:a", "datadog", AlertStatus::Firing),
        ];
        let mut filter = NoiseFilter::new();
        let survivors = filter.apply(alerts, 120);
        assert_eq!(survivors.len(), 1);
    }

    #[test]
    fn cross_vendor_echo_is_suppressed() {
        let alerts = vec![
            alert(0, "fp", "svc:a", "datadog", AlertStatus::Firing),
            alert(5_000, "fp", "svc:a", "prometheus", AlertStatus::Firing),
        ];
        let mut filter = NoiseFilter::new();
        let survivors = filter.apply(alerts, 0);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].source, "datadog");
    }

    #[test]
    fn echo_outside_window_is_not_suppressed() {
        let alerts = vec![
            alert(0, "fp", "svc:a", "datadog", AlertStatus::Firing),
            alert(11_000, "fp", "svc:a", "prometheus", AlertStatus::Firing),
        ];
        let mut filter = NoiseFilter::new();
        let survivors = filter.apply(alerts, 0);
        assert_eq!(survivors.len(), 2);
    }

    #[test]
    fn flap_score_counts_status_toggles() {
        let alerts = vec![
            alert(0, "fp", "svc:a", "datadog", AlertStatus::Firing),
            alert(60_000, "fp", "svc:a", "datadog", AlertStatus::Resolved),
            alert(120_000, "fp", "svc:a", "datadog", AlertStatus::Firing),
        ];
        let mut filter = NoiseFilter::new();
        let _ = filter.apply(alerts, 0);
        // 3 entries, 2 toggles -> 2/3, capped at 0.3
        assert_eq!(filter.flap_score("fp", "svc:a"), FLAP_SCORE_CAP);
    }

    #[test]
    fn filtering_an_already_filtered_list_is_a_no_op() {
        let alerts = vec![
            alert(0, "fp", "svc:a", "datadog", AlertStatus::Firing),
            alert(500_000, "fp", "svc:a", "datadog", AlertStatus::Firing),
        ];
        let mut first_pass = NoiseFilter::new();
        let once = first_pass.apply(alerts, 120);

        let mut second_pass = NoiseFilter::new();
        let twice = second_pass.apply(once.clone(), 120);
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.ts, b.ts);
            assert_eq!(a.fingerprint, b.fingerprint);
        }
    }
}
