//! The normalized `Alert` shape and its value types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alert lifecycle status, derived from the vendor's lifecycle field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Firing,
    Resolved,
}

/// Alert severity. Ordered low to critical so `max()` picks the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Weight used by `CauseSelector`'s composite score.
    pub fn score_weight(self) -> f64 {
        match self {
            Severity::Low => 0.25,
            Severity::Medium => 0.5,
            Severity::High => 0.75,
            Severity::Critical => 1.0,
        }
    }
}

/// A tag value flattened from the vendor's `"key:value"` tag list.
///
/// Values are coerced on extraction: `"true"`/`"false"` become
/// booleans, all-digit strings become integers, everything else stays a
/// string, and a bare tag (no `:`) becomes `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// A normalized, immutable alert.
///
/// Entity-key precedence: `svc:<service>` when a real service name is
/// present, else `pod:<pod>` when both namespace and pod are known, else
/// `host:<host>`, else `cluster:<cluster>`, else `entity:na`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Epoch milliseconds.
    pub ts: i64,
    pub source: String,
    pub vendor_event_id: String,
    pub resource_id: String,
    /// Stable content digest of `(title, severity, cluster, ns, service)`.
    pub fingerprint: String,
    pub status: AlertStatus,
    pub severity: Severity,
    pub title: Option<String>,
    pub service: Option<String>,
    pub cluster: Option<String>,
    pub ns: Option<String>,
    pub pod: Option<String>,
    pub host: Option<String>,
    pub deploy_key: Option<String>,
    pub net_key: Option<String>,
    pub tags: HashMap<String, TagValue>,
    /// Strongest available identifier, prefix-tagged (`svc:…`, `pod:…`, …).
    pub entity_key: String,
}
