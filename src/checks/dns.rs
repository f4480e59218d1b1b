// DNS resolution with per-IP reachability probing
//
// Resolution runs under an explicit 5 second time box, independent of the
// underlying resolver's own timeout behavior. Resolvability alone decides
// the endpoint's up/down state; per-IP ping outcomes are carried as detail
// for display and never folded into `is_up`.

use crate::checks::reachability::{ReachabilityProbe, default_probe_chain};
use crate::error::ProbeError;
use crate::monitor::types::{CheckDetail, CheckResult, PingOutcome};
use crate::utils::hostname::normalize_hostname;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Full outcome of resolving one hostname, including the narrative log
/// consumed by the host application's log screen.
#[derive(Debug)]
pub struct DnsResolution {
    pub is_up: bool,
    pub message: Option<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub pings: Vec<PingOutcome>,
    pub logs: Vec<String>,
}

impl DnsResolution {
    fn failure(message: String, logs: Vec<String>) -> Self {
        Self {
            is_up: false,
            message: Some(message),
            ip_addresses: Vec::new(),
            pings: Vec::new(),
            logs,
        }
    }

    /// Convert into a report entry, keeping the per-IP detail.
    pub fn into_check_result(self) -> CheckResult {
        CheckResult {
            is_up: self.is_up,
            message: self.message,
            valid_from: None,
            valid_until: None,
            detail: Some(CheckDetail::Dns { pings: self.pings }),
        }
    }
}

/// Resolver for DNS hostname endpoints
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
    probes: Vec<Box<dyn ReachabilityProbe>>,
    resolve_timeout: Duration,
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsResolver {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
            probes: default_probe_chain(),
            resolve_timeout: Duration::from_secs(5),
        }
    }

    /// Summary path: up/down plus message, ping detail discarded.
    pub async fn resolve(&self, input: &str) -> (bool, Option<String>) {
        let resolution = self.resolve_with_ping(input).await;
        (resolution.is_up, resolution.message)
    }

    /// Resolve a hostname (or the host component of a URL) to all of its IP
    /// addresses and probe each one for reachability.
    pub async fn resolve_with_ping(&self, input: &str) -> DnsResolution {
        let mut logs = Vec::new();
        let normalized = normalize_hostname(input);
        logs.push(format!(
            "Resolving hostname: '{}' -> '{}'",
            input, normalized
        ));

        let lookup = timeout(
            self.resolve_timeout,
            self.resolver.lookup_ip(normalized.as_str()),
        )
        .await;

        let ips: Vec<IpAddr> = match lookup {
            Err(_) => {
                logs.push(format!(
                    "DNS resolution timeout after {}ms for '{}'",
                    self.resolve_timeout.as_millis(),
                    normalized
                ));
                warn!("DNS resolution timeout for {}", normalized);
                return DnsResolution::failure(ProbeError::DnsTimeout.to_string(), logs);
            }
            Ok(Err(e)) => {
                logs.push(format!("DNS resolution failed for '{}': {}", normalized, e));
                warn!("DNS resolution failed for {}: {}", normalized, e);
                return DnsResolution::failure(e.to_string(), logs);
            }
            Ok(Ok(lookup)) => lookup.iter().collect(),
        };

        if ips.is_empty() {
            let message = format!("No IP addresses returned for {}", normalized);
            logs.push(message.clone());
            return DnsResolution::failure(message, logs);
        }

        logs.push(format!(
            "Resolved {} IP(s): {}",
            ips.len(),
            ips.iter()
                .map(|ip| ip.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        info!("Resolved {} to {} IP(s)", normalized, ips.len());

        let mut pings = Vec::with_capacity(ips.len());
        for ip in &ips {
            let mut latency = None;
            for probe in &self.probes {
                if let Some(elapsed) = probe.probe(*ip, &mut logs).await {
                    latency = Some(elapsed);
                    break;
                }
            }
            pings.push(PingOutcome {
                ip: ip.to_string(),
                success: latency.is_some(),
                latency_ms: latency.map(|d| d.as_millis() as u64),
            });
        }

        DnsResolution {
            is_up: true,
            message: None,
            ip_addresses: ips,
            pings,
            logs,
        }
    }
}
