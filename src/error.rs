// Error types for pkiwatch
//
// Structured error types using thiserror for the failures the probes need to
// tell apart. Most probe code still flows through anyhow::Result; these
// variants exist where the distinction changes behavior (TLS retry policy,
// download-vs-parse CRL outcomes, DNS time-boxing).

use std::time::Duration;
use thiserror::Error;

/// Main error type for pkiwatch probe operations
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Operation exceeded its deadline
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// DNS resolution did not complete within the resolver's time box
    #[error("DNS resolution timeout")]
    DnsTimeout,

    /// DNS resolution completed with an error
    #[error("DNS resolution failed for {hostname}: {details}")]
    DnsFailed { hostname: String, details: String },

    /// TLS handshake failed before the trust override could take effect
    #[error("TLS handshake failed: {details}")]
    Handshake { details: String },

    /// Body could not be parsed as the expected binary structure
    #[error("Parse error: {details}")]
    Parse { details: String },
}

/// Classify an error as TLS-layer or not.
///
/// Drives the one-shot retry policy: only handshake-level failures are
/// retried with a freshly applied trust capture, everything else is
/// surfaced as-is. reqwest flattens TLS failures into its own error type,
/// so classification walks the source chain and falls back to message
/// patterns the TLS stack is known to emit.
pub fn is_tls_error(error: &anyhow::Error) -> bool {
    if let Some(probe_err) = error.downcast_ref::<ProbeError>()
        && matches!(probe_err, ProbeError::Handshake { .. })
    {
        return true;
    }

    for cause in error.chain() {
        if cause.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        let msg = cause.to_string().to_lowercase();
        if msg.contains("tls")
            || msg.contains("ssl")
            || msg.contains("handshake")
            || msg.contains("certificate")
        {
            return true;
        }
    }

    false
}
