//! Fingerprint computation.
//!
//! The fingerprint is a SHA-256 hex digest over `(title, severity, cluster,
//! ns, service)`, excluding volatile fields (pod name, vendor event id,
//! resource id) so multiple instances of the same logical failure across a
//! service aggregate into one series.

use crate::types::Severity;
use sha2::{Digest, Sha256};

pub struct Inputs<'a> {
    pub title: &'a str,
    pub severity: Severity,
    pub cluster: &'a str,
    pub ns: &'a str,
    pub service: &'a str,
}

/// Deterministic, cross-run-stable hex digest of the fingerprint tuple.
pub fn fingerprint(inputs: &Inputs<'_>) -> String {
    let severity_str = match inputs.severity {
        Severity::Low => "low",
        Severity::Medium => "medium",
        Severity::High => "high",
        Severity::Critical => "critical",
    };
    let fp_string = format!(
        "title={}|sev={}|cluster={}|ns={}|service={}",
        inputs.title, severity_str, inputs.cluster, inputs.ns, inputs.service
    );
    hex::encode(Sha256::digest(fp_string.as_bytes()))
}

/// Fallback `resource_id` when the raw record carries none:
/// `sha256(source|vendor_event_id|entity_key)`.
pub fn fallback_resource_id(source: &str, vendor_event_id: &str, entity_key: &str) -> String {
    let input = format!("{source}|{vendor_event_id}|{entity_key}");
    hex::encode(Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = Inputs {
            title: "CPU high",
            severity: Severity::High,
            cluster: "prod",
            ns: "checkout",
            service: "checkout-api",
        };
        let b = Inputs {
            title: "CPU high",
            severity: Severity::High,
            cluster: "prod",
            ns: "checkout",
            service: "checkout-api",
        };
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_excludes_volatile_fields() {
        // Same tuple, different caller-supplied context (pod/resource/event
        // id aren't parameters at all) -> identical fingerprint.
        let a = Inputs {
            title: "CPU high",
            severity: Severity::High,
            cluster: "prod",
            ns: "checkout",
            service: "checkout-api",
        };
        assert_eq!(fingerprint(&a).len(), 64);
    }

    #[test]
    fn different_titles_produce_different_fingerprints() {
        let a = Inputs {
            title: "CPU high",
            severity: Severity::High,
            cluster: "prod",
            ns: "checkout",
            service: "checkout-api",
        };
        let b = Inputs { title: "Memory high", ..a_clone(&a) };
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    fn a_clone<'a>(i: &Inputs<'a>) -> Inputs<'a> {
        Inputs {
            title: i.title,
            severity: i.severity,
            cluster: i.cluster,
            ns: i.ns,
            service: i.service,
        }
    }
}
