use std::fmt;
use std::net::IpAddr;

use super::types::digit_value;

/// An IP literal from an `ip4:` or `ip6:` mechanism.
///
/// Address and prefix length are kept as written so the record prints back
/// unchanged; use [`to_ip_addr`](Ip::to_ip_addr) for a typed address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ip {
    address: String,
    cidr_length: Option<String>,
}

impl Ip {
    pub fn new(address: impl Into<String>, cidr_length: Option<u32>) -> Self {
        Self {
            address: address.into(),
            cidr_length: cidr_length.map(|len| len.to_string()),
        }
    }

    pub(crate) fn from_parts(address: &str, cidr_length: Option<&str>) -> Self {
        Self {
            address: address.to_string(),
            cidr_length: cidr_length.map(str::to_string),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Prefix length, saturating at `u32::MAX`. Range checks against the
    /// address family are left to the caller.
    pub fn cidr_length(&self) -> Option<u32> {
        self.cidr_length.as_deref().map(digit_value)
    }

    pub fn to_ip_addr(&self) -> Option<IpAddr> {
        self.address.parse().ok()
    }

    pub fn is_ipv6(&self) -> bool {
        self.address.contains(':')
    }
}

impl fmt::Display for Ip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)?;
        if let Some(len) = &self.cidr_length {
            write!(f, "/{len}")?;
        }
        Ok(())
    }
}
