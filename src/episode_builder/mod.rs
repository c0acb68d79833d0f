//! Stage 3: groups filtered alerts into episodes.

use crate::types::{Alert, Episode};
use std::collections::HashMap;
use std::sync::Arc;

/// Group alerts by `(entity_key, fingerprint)`, sort each group by `ts`, and
/// split on gaps exceeding `episode_gap_sec`.
///
/// Every input alert belongs to exactly one output episode.
pub fn build_episodes(alerts: Vec<Alert>, episode_gap_sec: i64) -> Vec<Episode> {
    let gap_ms = episode_gap_sec * 1000;
    let mut groups: HashMap<(String, String), Vec<Arc<Alert>>> = HashMap::new();

    for alert in alerts {
        let key = (alert.entity_key.clone(), alert.fingerprint.clone());
        groups.entry(key).or_default().push(Arc::new(alert));
    }

    let mut keyed_groups: Vec<((String, String), Vec<Arc<Alert>>)> = groups.into_iter().collect();
    keyed_groups.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut episodes = Vec::new();
    for (_, mut group) in keyed_groups {
        group.sort_by_key(|a| a.ts);
        let mut run: Vec<Arc<Alert>> = Vec::new();
        for alert in group {
            if let Some(last) = run.last() {
                if alert.ts - last.ts > gap_ms {
                    episodes.push(Episode::from_run(std::mem::take(&mut run)));
                }
            }
            run.push(alert);
        }
        if !run.is_empty() {
            episodes.push(Episode::from_run(run));
        }
    }

    episodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertStatus, Severity, TagValue};
    use std::collections::HashMap as Map;

    fn alert(ts: i64, entity_key: &str, fingerprint: &str) -> Alert {
        Alert {
            ts,
            source: "datadog".to_string(),
            vendor_event_id: format!("evt-{ts}"),
            resource_id: format!("res-{ts}"),
            fingerprint: fingerprint.to_string(),
            status: AlertStatus::Firing,
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
    fn gap_exceeding_threshold_splits_into_two_episodes() {
        let alerts = vec![
            alert(0, "svc:a", "fp"),
            alert(10_000, "svc:a", "fp"),
            alert(20_000, "svc:a", "fp"),
            alert(700_000, "svc:a", "fp"),
            alert(710_000, "svc:a", "fp"),
        ];
        let mut episodes = build_episodes(alerts, 300);
        episodes.sort_by_key(|e| e.start);
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].count(), 3);
        assert_eq!(episodes[0].start, 0);
        assert_eq!(episodes[0].end, 20_000);
        assert_eq!(episodes[1].count(), 2);
        assert_eq!(episodes[1].start, 700_000);
        assert_eq!(episodes[1].end, 710_000);
    }

    #[test]
    fn distinct_entity_keys_never_share_an_episode() {
        let alerts = vec![alert(0, "svc:a", "fp"), alert(1_000, "svc:b", "fp")];
        let episodes = build_episodes(alerts, 300);
        assert_eq!(episodes.len(), 2);
    }

    #[test]
    fn distinct_fingerprints_never_share_an_episode() {
        let alerts = vec![alert(0, "svc:a", "fp1"), alert(1_000, "svc:a", "fp2")];
        let episodes = build_episodes(alerts, 300);
        assert_eq!(episodes.len(), 2);
    }

    #[test]
    fn single_alert_makes_one_episode() {
        let episodes = build_episodes(vec![alert(0, "svc:a", "fp")], 300);
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].start, episodes[0].end);
        assert_eq!(episodes[0].count(), 1);
    }

    #[test]
    fn empty_input_yields_no_episodes() {
        assert!(build_episodes(Vec::new(), 300).is_empty());
    }
}
