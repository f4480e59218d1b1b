// Retry utilities - one-shot retry for TLS-layer failures
//
// URL and CRL downloads share the same policy: a failure classified as
// TLS-layer gets exactly one retry with the trust capture freshly applied,
// everything else is surfaced immediately. Max attempts is 2, never a loop.

use crate::Result;
use crate::error::is_tls_error;
use std::future::Future;

/// Run `operation`, retrying once if the first attempt fails with a
/// TLS-layer error.
///
/// The operation receives the attempt index (0 for the initial attempt,
/// 1 for the retry) so it can record that the trust override had to be
/// re-applied. Non-TLS errors are returned from the first attempt; if the
/// retry also fails, the retry's error is returned.
pub async fn with_tls_retry<F, Fut, T>(operation: F) -> Result<T>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match operation(0).await {
        Ok(value) => Ok(value),
        Err(e) if is_tls_error(&e) => {
            tracing::warn!("TLS-layer error, retrying with fresh trust capture: {}", e);
            operation(1).await
        }
        Err(e) => Err(e),
    }
}
