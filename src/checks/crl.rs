// CRL verification - download, parse and time-window validation
//
// A CRL check distinguishes three layers of outcome: whether the resource
// could be downloaded, whether it parsed as a DER-encoded X.509 CRL, and
// where the current time falls in its thisUpdate/nextUpdate window. The
// warning threshold (hours before nextUpdate) is read at the start of every
// check so external threshold changes take effect immediately.

use crate::Result;
use crate::checks::url::format_timestamp;
use crate::error::ProbeError;
use crate::monitor::types::{CheckDetail, CheckResult};
use crate::tls::CaptureSlot;
use crate::utils::retry::with_tls_retry;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use x509_parser::prelude::*;

/// Result of verifying one CRL distribution point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlVerification {
    pub can_download: bool,
    pub is_valid: bool,
    pub message: Option<String>,
    pub this_update: Option<DateTime<Utc>>,
    pub next_update: Option<DateTime<Utc>>,
    pub revoked_count: Option<usize>,
}

impl CrlVerification {
    fn download_failed(message: String) -> Self {
        Self {
            can_download: false,
            is_valid: false,
            message: Some(message),
            this_update: None,
            next_update: None,
            revoked_count: None,
        }
    }

    /// Collapse the layered verification outcome into a report entry.
    ///
    /// The endpoint is up only when the CRL is both downloadable and
    /// currently valid; the validity window is appended to the message
    /// whenever it is known.
    pub fn into_check_result(self) -> CheckResult {
        let is_up = self.can_download && self.is_valid;

        let mut parts = Vec::new();
        if !self.can_download {
            parts.push(format!(
                "Failed to download CRL: {}",
                self.message.clone().unwrap_or_else(|| "unknown error".into())
            ));
        } else if !self.is_valid {
            parts.push(
                self.message
                    .clone()
                    .unwrap_or_else(|| "CRL validation failed".into()),
            );
        } else if let Some(warning) = &self.message {
            parts.push(format!("Warning: {}", warning));
        }

        if let (Some(this_update), Some(next_update)) = (self.this_update, self.next_update) {
            parts.push(format!(
                "Valid: {} - {}",
                format_timestamp(this_update),
                format_timestamp(next_update)
            ));
        } else if parts.is_empty() && self.can_download {
            parts.push("CRL downloaded".to_string());
        }

        CheckResult {
            is_up,
            message: if parts.is_empty() {
                None
            } else {
                Some(parts.join(" | "))
            },
            valid_from: self.this_update,
            valid_until: self.next_update,
            detail: self
                .revoked_count
                .map(|revoked_count| CheckDetail::Crl { revoked_count }),
        }
    }
}

/// Successfully parsed CRL metadata
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedCrl {
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
    revoked_count: usize,
}

struct Download {
    status: u16,
    body: Vec<u8>,
    tls_retried: bool,
}

/// Verifier for CRL distribution-point endpoints
pub struct CrlVerifier {
    warning_threshold_hours: Arc<AtomicU32>,
    timeout: Duration,
}

impl CrlVerifier {
    pub fn new(warning_threshold_hours: Arc<AtomicU32>) -> Self {
        Self {
            warning_threshold_hours,
            timeout: Duration::from_secs(10),
        }
    }

    /// Download and validate a CRL.
    pub async fn verify(&self, crl_url: &str) -> CrlVerification {
        info!("Verifying CRL: {}", crl_url);

        let download = match with_tls_retry(|attempt| self.download(crl_url, attempt)).await {
            Ok(download) => download,
            Err(e) => {
                warn!("CRL download failed for {}: {:#}", crl_url, e);
                return CrlVerification::download_failed(format!("{:#}", e));
            }
        };

        if download.status != 200 {
            warn!(
                "CRL download for {} returned HTTP {}",
                crl_url, download.status
            );
            return CrlVerification::download_failed(format!("HTTP Error: {}", download.status));
        }

        debug!(
            "Downloaded CRL from {} ({} bytes)",
            crl_url,
            download.body.len()
        );

        let parsed = match parse_crl(&download.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("CRL parse failed for {}: {:#}", crl_url, e);
                let parse_error = ProbeError::Parse {
                    details: format!("{:#}", e),
                };
                return CrlVerification {
                    can_download: true,
                    is_valid: false,
                    message: Some(parse_error.to_string()),
                    this_update: None,
                    next_update: None,
                    revoked_count: None,
                };
            }
        };

        let threshold = self.warning_threshold_hours.load(Ordering::Relaxed);
        let (is_valid, mut message) = validate_window(&parsed, Utc::now(), threshold);

        if download.tls_retried {
            message = Some(format!(
                "SSL warning - {}",
                message.as_deref().unwrap_or("downloaded after TLS retry")
            ));
        }

        info!(
            "CRL {} valid={} revoked={} thisUpdate={} nextUpdate={:?}",
            crl_url, is_valid, parsed.revoked_count, parsed.this_update, parsed.next_update
        );

        CrlVerification {
            can_download: true,
            is_valid,
            message,
            this_update: Some(parsed.this_update),
            next_update: parsed.next_update,
            revoked_count: Some(parsed.revoked_count),
        }
    }

    /// One GET attempt with a fresh trust capture.
    async fn download(&self, url: &str, attempt: usize) -> Result<Download> {
        let slot = CaptureSlot::new();

        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .timeout(self.timeout);
        if url.trim_start().to_ascii_lowercase().starts_with("https://") {
            builder = builder.use_preconfigured_tls(slot.client_config());
        }
        let client = builder.build()?;

        let response = client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(Download {
            status,
            body,
            tls_retried: attempt > 0,
        })
    }
}

/// Parse a DER-encoded X.509 CRL into the metadata the check needs.
fn parse_crl(bytes: &[u8]) -> Result<ParsedCrl> {
    let (_, crl) = CertificateRevocationList::from_der(bytes)
        .map_err(|e| anyhow::anyhow!("Failed to parse CRL: {:?}", e))?;

    let this_update = DateTime::<Utc>::from_timestamp(crl.last_update().timestamp(), 0)
        .ok_or_else(|| anyhow::anyhow!("CRL thisUpdate out of range"))?;
    let next_update = crl
        .next_update()
        .and_then(|t| DateTime::<Utc>::from_timestamp(t.timestamp(), 0));
    let revoked_count = crl.iter_revoked_certificates().count();

    Ok(ParsedCrl {
        this_update,
        next_update,
        revoked_count,
    })
}

/// Apply the validity state machine to a parsed CRL.
///
/// A CRL without a nextUpdate field is treated as current once thisUpdate
/// has passed; it can neither expire nor approach expiry.
fn validate_window(
    crl: &ParsedCrl,
    now: DateTime<Utc>,
    threshold_hours: u32,
) -> (bool, Option<String>) {
    if now < crl.this_update {
        return (
            false,
            Some(format!(
                "CRL not yet valid. thisUpdate: {}, now: {}",
                format_timestamp(crl.this_update),
                format_timestamp(now)
            )),
        );
    }

    let Some(next_update) = crl.next_update else {
        return (true, None);
    };

    if now >= next_update {
        return (
            false,
            Some(format!(
                "CRL has expired. nextUpdate: {}, now: {}",
                format_timestamp(next_update),
                format_timestamp(now)
            )),
        );
    }

    let hours_remaining = (next_update - now).num_hours();
    if hours_remaining < i64::from(threshold_hours) {
        return (
            true,
            Some(format!(
                "CRL nextUpdate is within {}h (threshold: {}h). Next update: {}",
                hours_remaining,
                threshold_hours,
                format_timestamp(next_update)
            )),
        );
    }

    (true, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, h, 0, 0).unwrap()
    }

    fn parsed(this_update: DateTime<Utc>, next_update: Option<DateTime<Utc>>) -> ParsedCrl {
        ParsedCrl {
            this_update,
            next_update,
            revoked_count: 12,
        }
    }

    #[test]
    fn test_current_crl_with_margin_is_valid() {
        let crl = parsed(at(0), Some(at(12)));
        let (is_valid, message) = validate_window(&crl, at(6), 3);
        assert!(is_valid);
        assert_eq!(message, None);
    }

    #[test]
    fn test_not_yet_valid() {
        let crl = parsed(at(10), Some(at(20)));
        let (is_valid, message) = validate_window(&crl, at(5), 3);
        assert!(!is_valid);
        assert!(message.unwrap().contains("not yet valid"));
    }

    #[test]
    fn test_expired() {
        let crl = parsed(at(0), Some(at(5)));
        let (is_valid, message) = validate_window(&crl, at(6), 3);
        assert!(!is_valid);
        assert!(message.unwrap().contains("expired"));
    }

    #[test]
    fn test_expiry_at_next_update_boundary() {
        let crl = parsed(at(0), Some(at(5)));
        let (is_valid, message) = validate_window(&crl, at(5), 3);
        assert!(!is_valid);
        assert!(message.unwrap().contains("expired"));
    }

    #[test]
    fn test_approaching_next_update_warns() {
        // nextUpdate one hour out, threshold three hours.
        let crl = parsed(at(0), Some(at(7)));
        let (is_valid, message) = validate_window(&crl, at(6), 3);
        assert!(is_valid);
        let message = message.unwrap();
        assert!(message.contains("within 1h"), "{}", message);
        assert!(message.contains("threshold: 3h"), "{}", message);
    }

    #[test]
    fn test_threshold_zero_never_warns() {
        let crl = parsed(at(0), Some(at(7)));
        let (is_valid, message) = validate_window(&crl, at(6), 0);
        assert!(is_valid);
        assert_eq!(message, None);
    }

    #[test]
    fn test_missing_next_update_is_current() {
        let crl = parsed(at(0), None);
        let (is_valid, message) = validate_window(&crl, at(23), 3);
        assert!(is_valid);
        assert_eq!(message, None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_crl(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse CRL"));
    }

    #[test]
    fn test_check_result_for_healthy_crl() {
        let verification = CrlVerification {
            can_download: true,
            is_valid: true,
            message: None,
            this_update: Some(at(0)),
            next_update: Some(at(12)),
            revoked_count: Some(12),
        };

        let result = verification.into_check_result();
        assert!(result.is_up);
        let message = result.message.unwrap();
        assert!(message.starts_with("Valid: "), "{}", message);
        assert_eq!(result.valid_from, Some(at(0)));
        assert_eq!(result.valid_until, Some(at(12)));
        assert_eq!(result.detail, Some(CheckDetail::Crl { revoked_count: 12 }));
    }

    #[test]
    fn test_check_result_for_download_failure() {
        let verification = CrlVerification::download_failed("HTTP Error: 404".to_string());
        let result = verification.into_check_result();
        assert!(!result.is_up);
        assert_eq!(
            result.message.as_deref(),
            Some("Failed to download CRL: HTTP Error: 404")
        );
        assert_eq!(result.detail, None);
    }

    #[test]
    fn test_check_result_for_invalid_crl_keeps_window() {
        let verification = CrlVerification {
            can_download: true,
            is_valid: false,
            message: Some("CRL has expired. nextUpdate: x, now: y".to_string()),
            this_update: Some(at(0)),
            next_update: Some(at(5)),
            revoked_count: Some(3),
        };

        let result = verification.into_check_result();
        assert!(!result.is_up);
        let message = result.message.unwrap();
        assert!(message.contains("expired"));
        assert!(message.contains(" | Valid: "));
        assert_eq!(result.valid_until, Some(at(5)));
    }

    #[test]
    fn test_check_result_warning_prefix() {
        let verification = CrlVerification {
            can_download: true,
            is_valid: true,
            message: Some("CRL nextUpdate is within 1h (threshold: 3h)".to_string()),
            this_update: Some(at(0)),
            next_update: Some(at(7)),
            revoked_count: Some(0),
        };

        let result = verification.into_check_result();
        assert!(result.is_up);
        assert!(result.message.unwrap().starts_with("Warning: "));
    }
}
