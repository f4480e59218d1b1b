// URL probing - HTTP(S) GET with certificate capture
//
// Success is strictly HTTP 200. For HTTPS targets the request runs with the
// trust capture applied, so the probe completes against any certificate and
// the captured leaf is analyzed afterwards: expiry, near-expiry (30 days)
// and not-yet-valid conditions become warning text on the result, never
// handshake failures.

use crate::Result;
use crate::monitor::types::{CheckDetail, CheckResult};
use crate::tls::{CaptureSlot, CapturedCertificate};
use crate::utils::retry::with_tls_retry;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

/// Days before certificate expiry at which a warning is attached.
const EXPIRY_WARNING_DAYS: i64 = 30;

/// One completed HTTP exchange
struct HttpProbe {
    status: u16,
    certificate: Option<CapturedCertificate>,
}

/// Prober for HTTP(S) URL endpoints
pub struct UrlProber {
    timeout: Duration,
}

impl Default for UrlProber {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlProber {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }

    /// Probe a URL and report status, certificate warnings and validity.
    pub async fn check(&self, url: &str) -> CheckResult {
        info!("Checking URL: {}", url);

        match with_tls_retry(|_| self.attempt(url)).await {
            Ok(probe) => self.assemble(url, probe),
            Err(e) => {
                warn!("URL check failed for {}: {:#}", url, e);
                CheckResult::failure(format!("{:#}", e))
            }
        }
    }

    /// One GET attempt with a fresh trust capture.
    async fn attempt(&self, url: &str) -> Result<HttpProbe> {
        let slot = CaptureSlot::new();

        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .timeout(self.timeout);
        if is_https(url) {
            builder = builder.use_preconfigured_tls(slot.client_config());
        }
        let client = builder.build()?;

        let response = client.get(url).send().await?;
        let status = response.status().as_u16();

        Ok(HttpProbe {
            status,
            certificate: slot.take(),
        })
    }

    fn assemble(&self, url: &str, probe: HttpProbe) -> CheckResult {
        let is_up = probe.status == 200;
        let mut messages = Vec::new();
        if !is_up {
            messages.push(format!("HTTP Error: {}", probe.status));
        }

        let mut valid_from = None;
        let mut valid_until = None;
        if let Some(certificate) = &probe.certificate {
            match certificate.validity() {
                Ok((not_before, not_after)) => {
                    valid_from = Some(not_before);
                    valid_until = Some(not_after);
                    if let Some(warning) = certificate_warning(not_before, not_after, Utc::now()) {
                        messages.push(warning);
                    }
                }
                Err(e) => warn!("Could not parse captured certificate for {}: {:#}", url, e),
            }
        }

        CheckResult {
            is_up,
            message: if messages.is_empty() {
                None
            } else {
                Some(messages.join(" | "))
            },
            valid_from,
            valid_until,
            detail: Some(CheckDetail::Http {
                status: probe.status,
            }),
        }
    }
}

fn is_https(url: &str) -> bool {
    url.trim_start().to_ascii_lowercase().starts_with("https://")
}

/// Compute the warning text for a certificate validity window, if any.
fn certificate_warning(
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<String> {
    if now > not_after {
        let days = (now - not_after).num_days();
        return Some(format!(
            "Certificate EXPIRED {} days ago (not valid after {})",
            days,
            format_timestamp(not_after)
        ));
    }

    let days_until_expiry = (not_after - now).num_days();
    if days_until_expiry <= EXPIRY_WARNING_DAYS {
        return Some(format!(
            "Certificate expires in {} days (not valid after {})",
            days_until_expiry,
            format_timestamp(not_after)
        ));
    }

    if now < not_before {
        return Some(format!(
            "Certificate not yet valid (not valid before {})",
            format_timestamp(not_before)
        ));
    }

    None
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
