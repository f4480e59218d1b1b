// Reachability probing - platform ping with protocol-level fallback
//
// Per-IP reachability is inherently platform-dependent. The capability is
// abstracted behind a single trait with two implementations tried in order:
// the platform ping binary (two command-line spellings for portability),
// then an in-process ICMP echo. First success wins; a probe that exhausts
// its attempts reports failure through the narrative log.

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use surge_ping::{Client as PingClient, Config as PingConfig, ICMP, PingIdentifier, PingSequence};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// A single way of probing one IP address for reachability.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    fn name(&self) -> &'static str;

    /// Probe `ip`, appending narrative lines to `logs`. Returns the elapsed
    /// time on success, `None` on failure.
    async fn probe(&self, ip: IpAddr, logs: &mut Vec<String>) -> Option<Duration>;
}

/// Reachability via the platform `ping` binary, one echo request.
pub struct SystemPing {
    timeout: Duration,
}

impl Default for SystemPing {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
        }
    }
}

// Two spellings: `-w` (overall deadline) is Linux-specific, the bare form
// works everywhere a ping binary exists.
const PING_VARIANTS: [&[&str]; 2] = [&["-c", "1", "-w", "3"], &["-c", "1"]];

#[async_trait]
impl ReachabilityProbe for SystemPing {
    fn name(&self) -> &'static str {
        "ping"
    }

    async fn probe(&self, ip: IpAddr, logs: &mut Vec<String>) -> Option<Duration> {
        let ip_str = ip.to_string();

        for args in PING_VARIANTS {
            logs.push(format!("Pinging {} with: ping {} {}", ip, args.join(" "), ip_str));

            let mut command = Command::new("ping");
            command.args(args).arg(&ip_str).kill_on_drop(true);

            let start = Instant::now();
            match timeout(self.timeout, command.output()).await {
                Ok(Ok(output)) => {
                    let elapsed = start.elapsed();
                    if output.status.success() {
                        logs.push(format!(
                            "Ping succeeded for {} ({}ms)",
                            ip,
                            elapsed.as_millis()
                        ));
                        return Some(elapsed);
                    }
                    logs.push(format!(
                        "Ping failed for {} (exit={:?}, {}ms)",
                        ip,
                        output.status.code(),
                        elapsed.as_millis()
                    ));
                }
                Ok(Err(e)) => {
                    logs.push(format!("Ping command error for {}: {}", ip, e));
                }
                Err(_) => {
                    logs.push(format!(
                        "Ping timed out for {} after {}ms",
                        ip,
                        self.timeout.as_millis()
                    ));
                }
            }
        }

        None
    }
}

/// Reachability via an in-process ICMP echo (no subprocess).
pub struct IcmpProbe {
    timeout: Duration,
}

impl Default for IcmpProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
        }
    }
}

#[async_trait]
impl ReachabilityProbe for IcmpProbe {
    fn name(&self) -> &'static str {
        "icmp"
    }

    async fn probe(&self, ip: IpAddr, logs: &mut Vec<String>) -> Option<Duration> {
        logs.push(format!(
            "Fallback ICMP probe for {} ({}ms)...",
            ip,
            self.timeout.as_millis()
        ));

        let config = match ip {
            IpAddr::V4(_) => PingConfig::default(),
            IpAddr::V6(_) => PingConfig::builder().kind(ICMP::V6).build(),
        };

        let client = match PingClient::new(&config) {
            Ok(client) => client,
            Err(e) => {
                logs.push(format!("ICMP socket error for {}: {}", ip, e));
                return None;
            }
        };

        let payload = [0u8; 56];
        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(self.timeout);

        match pinger.ping(PingSequence(0), &payload).await {
            Ok((_, latency)) => {
                debug!("ICMP echo from {} in {:?}", ip, latency);
                logs.push(format!(
                    "ICMP probe succeeded for {} ({}ms)",
                    ip,
                    latency.as_millis()
                ));
                Some(latency)
            }
            Err(e) => {
                logs.push(format!("ICMP probe failed for {}: {}", ip, e));
                None
            }
        }
    }
}

/// The default probe chain: system ping first, ICMP fallback second.
pub fn default_probe_chain() -> Vec<Box<dyn ReachabilityProbe>> {
    vec![Box::new(SystemPing::default()), Box::new(IcmpProbe::default())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_chain_order() {
        let chain = default_probe_chain();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].name(), "ping");
        assert_eq!(chain[1].name(), "icmp");
    }

    #[tokio::test]
    async fn test_system_ping_logs_every_attempt() {
        // 192.0.2.0/24 is TEST-NET-1, never routable; both spellings must
        // fail and leave a narrative line each.
        let probe = SystemPing {
            timeout: Duration::from_millis(300),
        };
        let mut logs = Vec::new();

        let result = probe.probe("192.0.2.1".parse().unwrap(), &mut logs).await;

        assert!(result.is_none());
        assert!(logs.len() >= 2, "expected one log line per attempt: {:?}", logs);
        assert!(logs[0].contains("ping -c 1 -w 3"));
    }
}
