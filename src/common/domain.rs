/// Normalize a domain: lowercase + strip trailing dot.
pub fn normalize(domain: &str) -> String {
    let d = domain.to_ascii_lowercase();
    d.strip_suffix('.').unwrap_or(&d).to_string()
}

/// `_spf.<domain>`, normalized.
pub fn spf_subdomain(domain: &str) -> String {
    format!("_spf.{}", normalize(domain))
}
