// Hostname normalization
//
// DNS checks accept either a bare hostname or a full URL. Normalization:
// extract the host component from scheme-bearing input, trim whitespace,
// strip a trailing dot, and convert internationalized labels to their
// ASCII (punycode) form.

use url::Url;

/// Normalize a hostname-or-URL into a resolvable ASCII hostname.
pub fn normalize_hostname(input: &str) -> String {
    let mut host = input.trim().to_string();

    if host.contains("://")
        && let Ok(url) = Url::parse(&host)
        && let Some(h) = url.host_str()
    {
        host = h.to_string();
    }

    if let Some(stripped) = host.strip_suffix('.') {
        host = stripped.to_string();
    }

    idna::domain_to_ascii(&host).unwrap_or(host)
}
