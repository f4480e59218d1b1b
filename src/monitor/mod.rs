// Endpoint monitoring
//
// The orchestrator runs the three probe kinds over a configured endpoint
// set, aggregates per-endpoint results into a stable ordered report, and
// supports re-probing a single endpoint by identity.

pub mod config;
pub mod engine;
pub mod types;

// Re-export commonly used types
pub use config::MonitorConfig;
pub use engine::Monitor;
pub use types::{CheckDetail, CheckResult, Endpoint, MonitoringReport, PingOutcome};
