// Core types for endpoint monitoring

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured target to monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// HTTP(S) URL probed with a GET request
    Url(String),
    /// DNS hostname resolved and probed for reachability
    Dns(String),
    /// CRL distribution-point URL downloaded and validated
    Crl(String),
}

impl Endpoint {
    /// The literal string identity of this endpoint.
    pub fn identity(&self) -> &str {
        match self {
            Endpoint::Url(s) | Endpoint::Dns(s) | Endpoint::Crl(s) => s,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Url(s) => write!(f, "URL {}", s),
            Endpoint::Dns(s) => write!(f, "DNS {}", s),
            Endpoint::Crl(s) => write!(f, "CRL {}", s),
        }
    }
}

/// Reachability outcome for one resolved IP address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingOutcome {
    pub ip: String,
    pub success: bool,
    pub latency_ms: Option<u64>,
}

/// Kind-specific detail attached to a check result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckDetail {
    /// Raw HTTP status of the probe response
    Http { status: u16 },
    /// Number of revoked certificates listed by the CRL
    Crl { revoked_count: usize },
    /// Per-IP reachability outcomes
    Dns { pings: Vec<PingOutcome> },
}

/// Result of probing one endpoint.
///
/// `is_up == true` never implies the endpoint is free of warnings: a URL or
/// CRL can be reachable yet carry a near-expiry warning in `message`.
/// `is_up == false` always carries a message explaining the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub is_up: bool,
    pub message: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub detail: Option<CheckDetail>,
}

impl CheckResult {
    /// A healthy result with nothing to report.
    pub fn healthy() -> Self {
        Self {
            is_up: true,
            message: None,
            valid_from: None,
            valid_until: None,
            detail: None,
        }
    }

    /// A failed result carrying the failure's explanation.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_up: false,
            message: Some(message.into()),
            valid_from: None,
            valid_until: None,
            detail: None,
        }
    }
}

/// Ordered collection of the latest check result per configured endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MonitoringReport {
    pub entries: Vec<(Endpoint, CheckResult)>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl MonitoringReport {
    /// Look up the result for an endpoint identity.
    pub fn get(&self, identity: &str) -> Option<&CheckResult> {
        self.entries
            .iter()
            .find(|(endpoint, _)| endpoint.identity() == identity)
            .map(|(_, result)| result)
    }

    /// Replace the entry matching `identity` in place, preserving the order
    /// and untouched results of all other entries. Returns false when no
    /// entry matches.
    pub fn replace(&mut self, identity: &str, result: CheckResult) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|(endpoint, _)| endpoint.identity() == identity)
        {
            Some(entry) => {
                entry.1 = result;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> MonitoringReport {
        MonitoringReport {
            entries: vec![
                (
                    Endpoint::Url("https://a.example/".into()),
                    CheckResult::healthy(),
                ),
                (Endpoint::Dns("b.example".into()), CheckResult::healthy()),
                (
                    Endpoint::Crl("http://c.example/ca.crl".into()),
                    CheckResult::failure("HTTP Error: 404"),
                ),
            ],
            generated_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_identity() {
        assert_eq!(
            Endpoint::Url("https://a.example/".into()).identity(),
            "https://a.example/"
        );
        assert_eq!(Endpoint::Dns("b.example".into()).identity(), "b.example");
    }

    #[test]
    fn test_failure_always_has_message() {
        let result = CheckResult::failure("Connection refused");
        assert!(!result.is_up);
        assert_eq!(result.message.as_deref(), Some("Connection refused"));
    }

    #[test]
    fn test_replace_preserves_order_and_other_entries() {
        let mut report = sample_report();
        let before: Vec<_> = report.entries.clone();

        let replaced = report.replace("b.example", CheckResult::failure("DNS resolution timeout"));
        assert!(replaced);

        assert_eq!(report.entries.len(), before.len());
        assert_eq!(report.entries[0], before[0]);
        assert_eq!(report.entries[2], before[2]);
        assert_eq!(report.entries[1].0, before[1].0);
        assert_eq!(
            report.entries[1].1.message.as_deref(),
            Some("DNS resolution timeout")
        );
    }

    #[test]
    fn test_replace_unknown_identity_is_noop() {
        let mut report = sample_report();
        let before = report.clone();

        let replaced = report.replace("no-such-host.invalid", CheckResult::healthy());
        assert!(!replaced);
        assert_eq!(report, before);
    }

    #[test]
    fn test_result_serialization() {
        let result = CheckResult {
            is_up: true,
            message: Some("Certificate expires in 5 days".into()),
            valid_from: None,
            valid_until: None,
            detail: Some(CheckDetail::Http { status: 200 }),
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("expires in 5 days"));

        let roundtrip: CheckResult = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, result);
    }
}
