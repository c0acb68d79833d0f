//! Stage 7: picks the primary cause and computes a composite confidence
//! score.

use crate::noise_filter::NoiseFilter;
use crate::types::{ExternalGraph, PrimaryCause, Situation};

/// Confidence above which a rollback + page is suggested.
const HIGH_CONFIDENCE: f64 = 0.8;
/// Confidence above which an investigate action is suggested.
const MEDIUM_CONFIDENCE: f64 = 0.5;
/// Confidence cap applied when an external graph is present but the cause
/// cannot reach any other member entity.
const PATH_GATE_CAP: f64 = 0.35;
const ECHO_WEIGHT: f64 = 0.05;
const FLAP_WEIGHT: f64 = 0.10;

/// Select the primary cause and populate `score`, `primary_cause`, and
/// `next_actions` on `situation` in place.
///
/// `graph_provided` reflects whether the run was configured with an
/// external graph at all, independent of whether that graph happens to be
/// empty or lacks edges for this situation's entities — gating triggers on
/// "a graph was supplied", not on "the graph is non-empty".
pub fn select(situation: &mut Situation, graph: &ExternalGraph, graph_provided: bool, noise_filter: &NoiseFilter) {
    let Some(cause_episode_idx) = earliest_episode_index(situation) else {
        return;
    };
    let cause_entity = situation.episodes[cause_episode_idx].entity_key.clone();
    let cause_fingerprint = situation.episodes[cause_episode_idx].fingerprint.clone();

    let other_entities: Vec<&str> = situation
        .episodes
        .iter()
        .map(|e| e.entity_key.as_str())
        .filter(|&e| e != cause_entity)
        .collect();

    let change_proximity = (!situation.episodes[cause_episode_idx].deploy_keys.is_empty())
        .then_some(1.0)
        .unwrap_or(0.0);

    // Reserved: no lead-lag signal is wired to the cause entity in the
    // current core.
    let lead_lag = 0.0;

    let best_path_len = other_entities
        .iter()
        .filter_map(|&other| graph.shortest_path_len(&cause_entity, other))
        .min();
    let graph_path = best_path_len.map(|len| 1.0 / (1.0 + len as f64)).unwrap_or(0.0);

    let distinct_entities = {
        let mut keys: Vec<&str> = situation.episodes.iter().map(|e| e.entity_key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    };
    let cardinality = (distinct_entities.max(1) as f64).log10();

    let severity = situation.episodes[cause_episode_idx].max_severity().score_weight();

    let flap = noise_filter.flap_score(&cause_fingerprint, &cause_entity);
    let echo = if noise_filter.has_multi_source_echo(&cause_fingerprint, &cause_entity) {
        crate::noise_filter::ECHO_PENALTY
    } else {
        0.0
    };

    let mut score = 0.35 * change_proximity + 0.20 * lead_lag + 0.20 * graph_path + 0.15 * cardinality
        + 0.15 * severity
        - FLAP_WEIGHT * flap
        - ECHO_WEIGHT * echo;
    score = score.clamp(0.0, 1.0);

    let gated = graph_provided && best_path_len.is_none();
    if gated {
        score = score.min(PATH_GATE_CAP);
    }

    // No lead-lag signal is wired to the cause entity yet, so there is
    // nothing to report here either.
    let lag_ms = 0;

    situation.primary_cause = Some(PrimaryCause {
        entity: cause_entity.clone(),
        fingerprint: cause_fingerprint.clone(),
        confidence: score,
        lag_ms,
    });
    situation.score = score;
    situation.next_actions = suggested_actions(score, &situation.episodes[cause_episode_idx].deploy_keys);
}

fn earliest_episode_index(situation: &Situation) -> Option<usize> {
    situation
        .episodes
        .iter()
        .enumerate()
        .min_by_key(|(_, e)| e.start)
        .map(|(idx, _)| idx)
}

fn suggested_actions(confidence: f64, deploy_keys: &[String]) -> Vec<String> {
    if confidence > HIGH_CONFIDENCE {
        let mut actions = Vec::new();
        if let Some(sha) = deploy_keys.first() {
            let short_sha = &sha[..sha.len().min(8)];
            actions.push(format!("rollback deployment {short_sha}"));
        }
        actions.push("page oncall team".to_string());
        actions
    } else if confidence > MEDIUM_CONFIDENCE {
        vec!["investigate root cause".to_string(), "check recent changes".to_string()]
    } else {
        vec!["monitor situation".to_string(), "gather more data".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Alert, AlertStatus, Episode, Severity, TagValue};
    use std::collections::HashMap as Map;
    use std::sync::Arc;

    fn alert(ts: i64, entity_key: &str, fingerprint: &str, severity: Severity) -> Alert {
        Alert {
            ts,
            source: "datadog".to_string(),
            vendor_event_id: format!("evt-{ts}"),
            resource_id: format!("res-{ts}"),
            fingerprint: fingerprint.to_string(),
            status: AlertStatus::Firing,
            severity,
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
    fn unreachable_cause_caps_confidence_at_gate() {
        let ep_a = Episode::from_run(vec![Arc::new(alert(0, "svc:a", "fp1", Severity::Critical))]);
        let ep_b = Episode::from_run(vec![Arc::new(alert(1_000, "svc:b", "fp2", Severity::Critical))]);
        let mut situation = Situation::from_episodes("S-x".to_string(), vec![ep_a, ep_b]);
        let graph: ExternalGraph = serde_json::from_value(serde_json::json!({ "adj": {} })).unwrap();
        let noise_filter = NoiseFilter::new();

        select(&mut situation, &graph, true, &noise_filter);
        assert_eq!(situation.score, PATH_GATE_CAP);
        assert_eq!(situation.primary_cause.as_ref().unwrap().confidence, PATH_GATE_CAP);
    }

    #[test]
    fn no_graph_means_no_gating() {
        let ep = Episode::from_run(vec![Arc::new(alert(0, "svc:a", "fp1", Severity::Low))]);
        let mut situation = Situation::from_episodes("S-x".to_string(), vec![ep]);
        let graph = ExternalGraph::default();
        let noise_filter = NoiseFilter::new();

        select(&mut situation, &graph, false, &noise_filter);
        assert!(situation.score > 0.0);
    }

    #[test]
    fn high_confidence_suggests_rollback_and_page() {
        let score = 0.9;
        let actions = suggested_actions(score, &["abc123def".to_string()]);
        assert!(actions.iter().any(|a| a.starts_with("rollback deployment")));
        assert!(actions.contains(&"page oncall team".to_string()));
    }

    #[test]
    fn low_confidence_suggests_monitoring() {
        let actions = suggested_actions(0.1, &[]);
        assert_eq!(actions, vec!["monitor situation".to_string(), "gather more data".to_string()]);
    }
}
