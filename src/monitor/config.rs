// Monitoring configuration

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default CRL warning threshold: 3 hours before nextUpdate
pub const DEFAULT_WARNING_THRESHOLD_HOURS: u32 = 3;

/// Endpoint lists and probe settings for one monitor instance.
///
/// The three lists are independently empty-safe: an empty list simply
/// contributes nothing to the report. Order is a presentation contract and
/// is preserved end to end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// URLs probed with an HTTP GET
    pub urls: Vec<String>,
    /// Hostnames resolved and probed for reachability
    pub dns_hosts: Vec<String>,
    /// CRL distribution points downloaded and validated
    pub crl_urls: Vec<String>,
    /// Hours before a CRL's nextUpdate at which a warning is raised
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold_hours: u32,
    /// Upper bound on concurrently running endpoint checks
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_checks: usize,
}

fn default_warning_threshold() -> u32 {
    DEFAULT_WARNING_THRESHOLD_HOURS
}

fn default_max_concurrent() -> usize {
    8
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            urls: vec![
                "https://pivi.xcloud.authentx.com/portal/index.html".to_string(),
                "https://piv.xcloud.authentx.com/portal/index.html".to_string(),
            ],
            dns_hosts: vec![
                "piv.xcloud.authentx.com".to_string(),
                "pivi.xcloud.authentx.com".to_string(),
                "ocsp.xca.xpki.com".to_string(),
                "crl.xca.xpki.com".to_string(),
                "aia.xca.xpki.com".to_string(),
            ],
            crl_urls: vec![
                "http://crl.xca.xpki.com/CRLs/XTec_PIVI_CA1.crl".to_string(),
                "http://66.165.167.225/CRLs/XTec_PIVI_CA1.crl".to_string(),
                "http://152.186.38.46/CRLs/XTec_PIVI_CA1.crl".to_string(),
            ],
            warning_threshold_hours: DEFAULT_WARNING_THRESHOLD_HOURS,
            max_concurrent_checks: default_max_concurrent(),
        }
    }
}

impl MonitorConfig {
    /// An empty configuration (no endpoints).
    pub fn empty() -> Self {
        Self {
            urls: Vec::new(),
            dns_hosts: Vec::new(),
            crl_urls: Vec::new(),
            warning_threshold_hours: DEFAULT_WARNING_THRESHOLD_HOURS,
            max_concurrent_checks: default_max_concurrent(),
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!("Failed to read config file {:?}: {}", path.as_ref(), e)
        })?;

        let config: MonitorConfig = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

        fs::write(path.as_ref(), toml_str).map_err(|e| {
            anyhow::anyhow!("Failed to write config file {:?}: {}", path.as_ref(), e)
        })?;

        Ok(())
    }

    /// Total number of configured endpoints across all three lists.
    pub fn endpoint_count(&self) -> usize {
        self.urls.len() + self.dns_hosts.len() + self.crl_urls.len()
    }
}
