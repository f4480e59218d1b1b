// Monitoring orchestrator
//
// Runs the three probe kinds over the configured endpoint set. Checks run
// concurrently under a semaphore; the report preserves the configured order
// (URLs, then DNS hosts, then CRLs) because ordering is a presentation
// contract, not an execution contract. A retest replaces exactly one entry
// under the report mutex, so it neither blocks nor is blocked by a full run
// and the shared report resolves concurrent writes last-write-wins.

use crate::checks::{CrlVerifier, DnsResolver, UrlProber};
use crate::monitor::config::MonitorConfig;
use crate::monitor::types::{CheckResult, Endpoint, MonitoringReport};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

/// The monitoring engine: owns the endpoint lists, the current report and
/// the CRL warning threshold.
pub struct Monitor {
    config: MonitorConfig,
    warning_threshold_hours: Arc<AtomicU32>,
    url_prober: Arc<UrlProber>,
    crl_verifier: Arc<CrlVerifier>,
    dns_resolver: Arc<DnsResolver>,
    limiter: Arc<Semaphore>,
    report: Arc<Mutex<MonitoringReport>>,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        let threshold = Arc::new(AtomicU32::new(config.warning_threshold_hours));
        Self {
            limiter: Arc::new(Semaphore::new(config.max_concurrent_checks.max(1))),
            url_prober: Arc::new(UrlProber::new()),
            crl_verifier: Arc::new(CrlVerifier::new(Arc::clone(&threshold))),
            dns_resolver: Arc::new(DnsResolver::new()),
            warning_threshold_hours: threshold,
            report: Arc::new(Mutex::new(MonitoringReport::default())),
            config,
        }
    }

    /// Current CRL warning threshold in hours.
    pub fn warning_threshold_hours(&self) -> u32 {
        self.warning_threshold_hours.load(Ordering::Relaxed)
    }

    /// Set the CRL warning threshold; takes effect from the next CRL check.
    pub fn set_warning_threshold_hours(&self, hours: u32) {
        self.warning_threshold_hours.store(hours, Ordering::Relaxed);
        info!("CRL warning threshold updated to {} hours", hours);
    }

    /// The latest report (empty before the first run).
    pub async fn current_report(&self) -> MonitoringReport {
        self.report.lock().await.clone()
    }

    /// Run every configured check and build a fresh report.
    ///
    /// Never fails: every per-endpoint error is converted into an
    /// `is_up == false` entry so one failing endpoint cannot abort the run.
    pub async fn run_all(&self) -> MonitoringReport {
        let endpoints = self.configured_endpoints();
        info!("Starting monitoring run for {} endpoints", endpoints.len());

        let mut tasks = FuturesUnordered::new();
        for (index, endpoint) in endpoints.into_iter().enumerate() {
            let limiter = Arc::clone(&self.limiter);
            let url_prober = Arc::clone(&self.url_prober);
            let crl_verifier = Arc::clone(&self.crl_verifier);
            let dns_resolver = Arc::clone(&self.dns_resolver);
            let task_endpoint = endpoint.clone();

            let handle = tokio::spawn(async move {
                let _permit = limiter.acquire().await.ok();
                dispatch(&url_prober, &crl_verifier, &dns_resolver, &task_endpoint).await
            });

            tasks.push(async move {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => CheckResult::failure(format!("Check task failed: {}", e)),
                };
                (index, endpoint, result)
            });
        }

        let mut indexed = Vec::with_capacity(tasks.len());
        while let Some(item) = tasks.next().await {
            indexed.push(item);
        }
        indexed.sort_by_key(|(index, _, _)| *index);

        let report = MonitoringReport {
            entries: indexed
                .into_iter()
                .map(|(_, endpoint, result)| (endpoint, result))
                .collect(),
            generated_at: Some(Utc::now()),
        };

        let down = report.entries.iter().filter(|(_, r)| !r.is_up).count();
        info!(
            "Monitoring run complete: {} endpoints, {} down",
            report.entries.len(),
            down
        );

        *self.report.lock().await = report.clone();
        report
    }

    /// Re-run the probe for a single endpoint identity and replace its
    /// entry in the current report.
    ///
    /// An identity that cannot be classified or is not present in the
    /// current report is a no-op: logged, report returned unchanged.
    pub async fn retest(&self, identity: &str) -> MonitoringReport {
        let Some(endpoint) = self.classify(identity) else {
            warn!("Unknown item type for retest: {}", identity);
            return self.current_report().await;
        };

        {
            let report = self.report.lock().await;
            if report.get(identity).is_none() {
                warn!("Item not found for retest: {}", identity);
                return report.clone();
            }
        }

        info!("Retesting {}", endpoint);
        let result = dispatch(
            &self.url_prober,
            &self.crl_verifier,
            &self.dns_resolver,
            &endpoint,
        )
        .await;

        let mut report = self.report.lock().await;
        if report.replace(identity, result) {
            report.generated_at = Some(Utc::now());
        } else {
            warn!("Item disappeared from report during retest: {}", identity);
        }
        report.clone()
    }

    /// Classify a retest identity by shape.
    fn classify(&self, identity: &str) -> Option<Endpoint> {
        let lower = identity.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            if lower.ends_with(".crl") {
                Some(Endpoint::Crl(identity.to_string()))
            } else {
                Some(Endpoint::Url(identity.to_string()))
            }
        } else if self.config.dns_hosts.iter().any(|host| host == identity) {
            Some(Endpoint::Dns(identity.to_string()))
        } else {
            None
        }
    }

    /// The configured endpoints in report order: URLs, DNS hosts, CRLs.
    fn configured_endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints =
            Vec::with_capacity(self.config.endpoint_count());
        endpoints.extend(self.config.urls.iter().cloned().map(Endpoint::Url));
        endpoints.extend(self.config.dns_hosts.iter().cloned().map(Endpoint::Dns));
        endpoints.extend(self.config.crl_urls.iter().cloned().map(Endpoint::Crl));
        endpoints
    }
}

/// Run the probe matching an endpoint's kind.
async fn dispatch(
    url_prober: &UrlProber,
    crl_verifier: &CrlVerifier,
    dns_resolver: &DnsResolver,
    endpoint: &Endpoint,
) -> CheckResult {
    match endpoint {
        Endpoint::Url(url) => url_prober.check(url).await,
        Endpoint::Crl(url) => crl_verifier.verify(url).await.into_check_result(),
        Endpoint::Dns(host) => {
            // Summary path: ping detail is discarded for the report view.
            let (is_up, message) = dns_resolver.resolve(host).await;
            CheckResult {
                is_up,
                message,
                valid_from: None,
                valid_until: None,
                detail: None,
            }
        }
    }
}
