// TLS Trust Capture - accept every peer certificate, record the leaf
//
// The probes must reach endpoints whose certificates are expired, mismatched
// or otherwise untrusted, and still report on the certificate that was
// actually presented. The verifier here never fails the handshake on trust
// grounds; instead it stores the peer's leaf certificate in a slot owned by
// the calling check. One slot per connection attempt: the slot is consumed
// by `take()` and never shared across endpoints, so concurrent checks cannot
// read each other's capture.

use crate::Result;
use chrono::{DateTime, Utc};
use rustls_pki_types::CertificateDer;
use std::sync::{Arc, Mutex, Once};
use x509_parser::prelude::*;

static CRYPTO_PROVIDER: Once = Once::new();

/// Install the process-wide rustls crypto provider (required for rustls 0.23+).
fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Certificate presented by a peer during one connection attempt.
#[derive(Debug, Clone)]
pub struct CapturedCertificate {
    pub der_bytes: Vec<u8>,
}

impl CapturedCertificate {
    /// Parse the validity window out of the captured leaf.
    pub fn validity(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let (_, cert) = X509Certificate::from_der(&self.der_bytes)
            .map_err(|e| anyhow::anyhow!("Failed to parse captured certificate: {:?}", e))?;

        let not_before = DateTime::<Utc>::from_timestamp(cert.validity().not_before.timestamp(), 0)
            .ok_or_else(|| anyhow::anyhow!("Certificate notBefore out of range"))?;
        let not_after = DateTime::<Utc>::from_timestamp(cert.validity().not_after.timestamp(), 0)
            .ok_or_else(|| anyhow::anyhow!("Certificate notAfter out of range"))?;

        Ok((not_before, not_after))
    }
}

/// Per-attempt store for the peer's leaf certificate.
///
/// Create one immediately before each outbound connection, wire its
/// [`client_config`](CaptureSlot::client_config) into the HTTP client, and
/// read the capture back with [`take`](CaptureSlot::take) once the request
/// has completed.
#[derive(Debug, Clone, Default)]
pub struct CaptureSlot {
    captured: Arc<Mutex<Option<CertificateDer<'static>>>>,
}

impl CaptureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rustls client configuration that accepts any certificate and
    /// hostname while recording the presented leaf into this slot.
    pub fn client_config(&self) -> rustls::ClientConfig {
        ensure_crypto_provider();
        rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(CapturingVerifier {
                captured: Arc::clone(&self.captured),
            }))
            .with_no_client_auth()
    }

    /// Consume the captured leaf certificate, leaving the slot empty.
    pub fn take(&self) -> Option<CapturedCertificate> {
        self.captured
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .map(|der| CapturedCertificate {
                der_bytes: der.as_ref().to_vec(),
            })
    }
}

/// Certificate verifier that accepts everything and records the leaf
#[derive(Debug)]
struct CapturingVerifier {
    captured: Arc<Mutex<Option<CertificateDer<'static>>>>,
}

impl rustls::client::danger::ServerCertVerifier for CapturingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        if let Ok(mut slot) = self.captured.lock() {
            *slot = Some(end_entity.clone().into_owned());
        }
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}
