//! `CorrelationRecord` and its per-method metrics.

use super::Window;
use serde::Serialize;

/// Which correlation kernel produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    Burst,
    Pmi,
    LeadLag,
}

#[derive(Debug, Clone, Serialize)]
pub struct BurstMetrics {
    pub aligned: usize,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PmiMetrics {
    pub pmi: f64,
    pub co_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadLagMetrics {
    pub lag_ms: i64,
    pub score: f64,
}

/// Method-specific metrics, serialized as `{"burst": {...}}` etc.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMetrics {
    Burst(BurstMetrics),
    Pmi(PmiMetrics),
    LeadLag(LeadLagMetrics),
}

/// Maximum resource ids reported per side for drill-down.
pub const CORRELATION_RESOURCE_CAP: usize = 10;

/// One correlation finding between two fingerprint-keyed series within a
/// situation.
///
/// Invariant: `series_a < series_b` (canonical ordering avoids duplicate
/// pairs); for a given `(situation_id, method)` the pair appears at most
/// once.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationRecord {
    pub method: CorrelationMethod,
    pub situation_id: String,
    pub series_a: String,
    pub series_b: String,
    pub window: Window,
    pub metrics: CorrelationMetrics,
    pub resource_ids_a: Vec<String>,
    pub resource_ids_b: Vec<String>,
}
