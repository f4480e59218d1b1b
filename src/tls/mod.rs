// TLS trust-override machinery

pub mod capture;

pub use capture::{CaptureSlot, CapturedCertificate};
