//! Stage 1: maps raw vendor records to the uniform `Alert` shape.
//!
//! Reading alerts off disk and detecting file layout happens in the
//! binary; this module only ever sees one already-deserialized JSON value
//! per record.

mod fingerprint;

pub use fingerprint::fingerprint;

use crate::types::{Alert, AlertStatus, Severity, TagValue};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("alert has no usable timestamp and no entity-identifying field")]
    MalformedAlert,
}

/// Normalizer for the canonical vendor record shape recognized by this
/// pipeline.
pub struct Normalizer;

impl Normalizer {
    /// Normalize a single raw vendor record.
    ///
    /// `now_ms` is the fallback timestamp used when the record has no
    /// parseable timestamp at all, injected explicitly so normalization
    /// stays deterministic under test.
    pub fn normalize(raw: &Value, now_ms: i64) -> Result<Alert, NormalizeError> {
        let metadata = raw.get("metadata");
        let event = metadata.and_then(|m| m.get("event"));
        let attrs = event.and_then(|e| e.get("attributes"));

        let ts_raw = attrs
            .and_then(|a| a.get("timestamp"))
            .or_else(|| raw.get("first_seen"))
            .or_else(|| raw.get("created_at"));
        let (ts, ts_present) = parse_timestamp(ts_raw, now_ms);

        let tags = attrs
            .and_then(|a| a.get("tags"))
            .map(extract_tags)
            .unwrap_or_default();

        let status = derive_status(raw.get("current_status").and_then(Value::as_str));

        let service = tag_str(&tags, "service").filter(|s| s != "undefined");
        let cluster = tag_str(&tags, "kube_cluster_name").or_else(|| tag_str(&tags, "cluster"));
        let ns = tag_str(&tags, "kube_namespace").or_else(|| tag_str(&tags, "namespace"));
        let pod = tag_str(&tags, "pod_name").or_else(|| tag_str(&tags, "pod"));
        let host = tag_str(&tags, "host");

        let entity_key = entity_key(service.as_deref(), ns.as_deref(), pod.as_deref(), host.as_deref(), cluster.as_deref());

        if !ts_present && entity_key == "entity:na" {
            return Err(NormalizeError::MalformedAlert);
        }

        let title = attrs
            .and_then(|a| a.get("message"))
            .and_then(Value::as_str)
            .and_then(|m| m.lines().next())
            .map(str::to_string);

        let source = raw
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        let vendor_event_id = event
            .and_then(|e| e.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| raw.get("id").map(value_to_string))
            .unwrap_or_default();

        let resource_id = attrs
            .and_then(|a| a.get("event_object"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| event.and_then(|e| e.get("id")).and_then(Value::as_str).map(str::to_string))
            .or_else(|| attrs.and_then(|a| a.get("aggregation_key")).and_then(Value::as_str).map(str::to_string))
            .or_else(|| {
                let id = raw.get("id").map(value_to_string).unwrap_or_default();
                let group_key = attrs
                    .and_then(|a| a.get("group_key"))
                    .and_then(Value::as_str)
                    .unwrap_or("");
                let combined = format!("{id}|{group_key}");
                (combined != "|").then_some(combined)
            });

        let deploy_key = tag_str(&tags, "git_sha")
            .or_else(|| tag_str(&tags, "release"))
            .or_else(|| tag_str(&tags, "commit"));

        let net_key = net_key(&tags);

        let severity = Severity::High;

        let fp_input = fingerprint::Inputs {
            title: title.as_deref().unwrap_or(""),
            severity,
            cluster: cluster.as_deref().unwrap_or(""),
            ns: ns.as_deref().unwrap_or(""),
            service: service.as_deref().unwrap_or(""),
        };
        let fingerprint = fingerprint::fingerprint(&fp_input);

        let resource_id = resource_id.filter(|s| !s.is_empty()).unwrap_or_else(|| {
            fingerprint::fallback_resource_id(&source, &vendor_event_id, &entity_key)
        });

        Ok(Alert {
            ts,
            source,
            vendor_event_id,
            resource_id,
            fingerprint,
            status,
            severity,
            title,
            service,
            cluster,
            ns,
            pod,
            host,
            deploy_key,
            net_key,
            tags,
            entity_key,
        })
    }
}

/// Accept integer seconds if `< 10^12`, else milliseconds; accept ISO-8601
/// strings; fall back to `now_ms`. Returns whether a real timestamp was
/// found (vs. the fallback being used).
fn parse_timestamp(raw: Option<&Value>, now_ms: i64) -> (i64, bool) {
    match raw {
        Some(Value::Number(n)) => {
            if let Some(f) = n.as_f64() {
                let ms = if f.abs() < 1e12 { (f * 1000.0) as i64 } else { f as i64 };
                return (ms, true);
            }
            (now_ms, false)
        }
        Some(Value::String(s)) => match chrono::DateTime::parse_from_rfc3339(s) {
            Ok(dt) => (dt.timestamp_millis(), true),
            Err(_) => (now_ms, false),
        },
        _ => (now_ms, false),
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten a vendor `"key:value"` tag list into a mapping, applying the
/// same coercion rules as `coerce_tag_value`.
fn extract_tags(tags_value: &Value) -> HashMap<String, TagValue> {
    let mut out = HashMap::new();
    let Some(list) = tags_value.as_array() else {
        return out;
    };
    for tag in list {
        let Some(s) = tag.as_str() else { continue };
        if let Some((key, value)) = s.split_once(':') {
            out.insert(key.to_string(), coerce_tag_value(value));
        } else {
            out.insert(s.to_string(), TagValue::Bool(true));
        }
    }
    out
}

fn coerce_tag_value(value: &str) -> TagValue {
    if value.eq_ignore_ascii_case("true") {
        TagValue::Bool(true)
    } else if value.eq_ignore_ascii_case("false") {
        TagValue::Bool(false)
    } else if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        value.parse::<i64>().map(TagValue::Int).unwrap_or_else(|_| TagValue::Str(value.to_string()))
    } else {
        TagValue::Str(value.to_string())
    }
}

fn tag_str(tags: &HashMap<String, TagValue>, key: &str) -> Option<String> {
    match tags.get(key) {
        Some(TagValue::Str(s)) => Some(s.clone()),
        Some(TagValue::Int(i)) => Some(i.to_string()),
        Some(TagValue::Bool(b)) => Some(b.to_string()),
        None => None,
    }
}

/// Map `ok|resolved -> resolved`, `no data|error -> firing`, default
/// `firing`.
fn derive_status(current_status: Option<&str>) -> AlertStatus {
    match current_status.map(str::to_lowercase).as_deref() {
        Some("ok") | Some("resolved") => AlertStatus::Resolved,
        _ => AlertStatus::Firing,
    }
}

/// Entity-key precedence: service, then pod, then host, then cluster.
fn entity_key(service: Option<&str>, ns: Option<&str>, pod: Option<&str>, host: Option<&str>, cluster: Option<&str>) -> String {
    if let Some(svc) = service {
        return format!("svc:{svc}");
    }
    if let (Some(_), Some(pod)) = (ns, pod) {
        return format!("pod:{pod}");
    }
    if let Some(host) = host {
        return format!("host:{host}");
    }
    if let Some(cluster) = cluster {
        return format!("cluster:{cluster}");
    }
    "entity:na".to_string()
}

fn net_key(tags: &HashMap<String, TagValue>) -> Option<String> {
    let src_ip = tag_str(tags, "src_ip");
    let dst_ip = tag_str(tags, "dst_ip");
    if let (Some(s), Some(d)) = (&src_ip, &dst_ip) {
        return Some(format!("{s}\u{2192}{d}"));
    }
    let src_host = tag_str(tags, "src_host");
    let dst_host = tag_str(tags, "dst_host");
    if let (Some(s), Some(d)) = (&src_host, &dst_host) {
        return Some(format!("{s}\u{2192}{d}"));
    }
    None
}

/// Normalize a batch of raw records, logging and skipping any that fail.
/// Never aborts the run.
pub fn normalize_batch(raw_alerts: &[Value], now_ms: i64) -> Vec<Alert> {
    let mut out = Vec::with_capacity(raw_alerts.len());
    for raw in raw_alerts {
        match Normalizer::normalize(raw, now_ms) {
            Ok(alert) => out.push(alert),
            Err(e) => warn!(error = %e, "skipping malformed alert"),
        }
    }
    out
}
