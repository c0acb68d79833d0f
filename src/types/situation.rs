//! `Situation`: a set of episodes joined by temporal overlap and identity or
//! topology bridges, enriched in place by later pipeline stages.

use super::{Episode, Window};
use serde::Serialize;
use std::collections::HashMap;

/// Distinct entities and services implicated by a situation.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BlastRadius {
    pub entities: usize,
    pub services: usize,
}

/// A reference to a deploy/release implicated in a situation, derived from
/// member episodes' `deploy_keys`.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeRef {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub sha: String,
    pub started_at: String,
}

/// A distinct resource implicated in a situation.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceRef {
    pub source: String,
    pub resource_id: String,
}

/// One entry in a situation's related-alerts sample (capped at 200).
#[derive(Debug, Clone, Serialize)]
pub struct RelatedAlert {
    pub ts: i64,
    pub entity_key: String,
    pub fingerprint: String,
    pub vendor_event_id: String,
    pub resource_id: String,
}

/// The selected primary cause and its confidence, from `CauseSelector`.
#[derive(Debug, Clone, Serialize)]
pub struct PrimaryCause {
    pub entity: String,
    pub fingerprint: String,
    pub confidence: f64,
    pub lag_ms: i64,
}

/// Maximum number of related-alert samples kept on a situation.
pub const RELATED_ALERTS_CAP: usize = 200;

/// A set of episodes joined by `SituationAssembler`, enriched in place by
/// `TemporalSpreader`, `CorrelationEngine` and `CauseSelector`.
///
/// Invariant: `window.start = min(ep.start)` and `window.end = max(ep.end)`
/// over member episodes.
#[derive(Debug, Clone)]
pub struct Situation {
    pub situation_id: String,
    pub window: Window,
    pub episodes: Vec<Episode>,
    pub blast_radius: BlastRadius,
    pub change_refs: Vec<ChangeRef>,
    pub resource_refs: Vec<ResourceRef>,
    pub related_alerts: Vec<RelatedAlert>,

    // Populated by TemporalSpreader.
    pub insufficient_temporal_spread: bool,
    pub reason: Option<String>,
    pub pad_ms_used: Option<i64>,
    pub bin_size_s: Option<i64>,
    pub padded_window: Option<Window>,
    /// Dense per-fingerprint bin-count vectors, all the same length.
    pub bins: HashMap<String, Vec<u32>>,

    // Populated by CauseSelector.
    pub primary_cause: Option<PrimaryCause>,
    pub score: f64,
    pub next_actions: Vec<String>,
}

impl Situation {
    /// Build a situation shell from its member episodes. `window`,
    /// `blast_radius`, `change_refs`, `resource_refs` and `related_alerts`
    /// are all derived here; everything else is left for later stages.
    pub fn from_episodes(situation_id: String, episodes: Vec<Episode>) -> Self {
        let start = episodes.iter().map(|e| e.start).min().unwrap_or(0);
        let end = episodes.iter().map(|e| e.end).max().unwrap_or(0);

        let mut entities: Vec<&str> = Vec::new();
        let mut services: Vec<&str> = Vec::new();
        let mut change_refs = Vec::new();
        let mut resource_refs = Vec::new();
        let mut seen_resources: Vec<&str> = Vec::new();
        let mut related_alerts = Vec::new();

        for ep in &episodes {
            if !entities.contains(&ep.entity_key.as_str()) {
                entities.push(ep.entity_key.as_str());
            }
            for a in &ep.alerts {
                if let Some(svc) = &a.service {
                    if !services.contains(&svc.as_str()) {
                        services.push(svc.as_str());
                    }
                }
                if !seen_resources.contains(&a.resource_id.as_str()) {
                    seen_resources.push(a.resource_id.as_str());
                    resource_refs.push(ResourceRef {
                        source: a.source.clone(),
                        resource_id: a.resource_id.clone(),
                    });
                }
                if related_alerts.len() < RELATED_ALERTS_CAP {
                    related_alerts.push(RelatedAlert {
                        ts: a.ts,
                        entity_key: a.entity_key.clone(),
                        fingerprint: a.fingerprint.clone(),
                        vendor_event_id: a.vendor_event_id.clone(),
                        resource_id: a.resource_id.clone(),
                    });
                }
            }
            for dk in &ep.deploy_keys {
                change_refs.push(ChangeRef {
                    kind: "deploy",
                    sha: dk.clone(),
                    started_at: crate::util::iso8601_utc(ep.start),
                });
            }
        }

        let blast_radius = BlastRadius {
            entities: entities.len(),
            services: services.len(),
        };

        Self {
            situation_id,
            window: Window { start, end },
            episodes,
            blast_radius,
            change_refs,
            resource_refs,
            related_alerts,
            insufficient_temporal_spread: false,
            reason: None,
            pad_ms_used: None,
            bin_size_s: None,
            padded_window: None,
            bins: HashMap::new(),
            primary_cause: None,
            score: 0.0,
            next_actions: Vec::new(),
        }
    }
}
