// pkiwatch - Health monitoring engine for PKI infrastructure endpoints
// Copyright (C) 2026 pkiwatch contributors
// Licensed under GPL-3.0

//! pkiwatch continuously verifies the health of a configured set of
//! endpoints: HTTP(S) URLs, DNS hostnames and CRL distribution points.
//! For every endpoint it produces an up/down status, a diagnostic message
//! and, for URL and CRL checks, a validity window taken from the X.509
//! certificate or CRL metadata.
//!
//! The crate is an embedded engine: it exposes no CLI and renders nothing.
//! A host shell drives it through [`Monitor::run_all`], [`Monitor::retest`]
//! and the CRL warning-threshold accessors, and consumes the resulting
//! [`MonitoringReport`].

pub mod checks;
pub mod error;
pub mod monitor;
pub mod tls;
pub mod utils;

// Re-export commonly used types
pub use crate::monitor::config::MonitorConfig;
pub use crate::monitor::engine::Monitor;
pub use crate::monitor::types::{CheckDetail, CheckResult, Endpoint, MonitoringReport, PingOutcome};

/// Result type for pkiwatch operations
pub type Result<T> = anyhow::Result<T>;

/// Error type for pkiwatch operations
pub use anyhow::Error;
