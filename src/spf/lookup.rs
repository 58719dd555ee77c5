use thiserror::Error;
use tracing::{debug, warn};

use crate::common::dns::{DnsError, DnsResolver};
use crate::common::domain;

use super::record::Record;
use super::SpfError;

/// A host to probe for an SPF TXT record, relative to the queried domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Candidate {
    /// The domain itself.
    Domain,
    /// `_spf.<domain>`.
    SpfSubdomain,
}

impl Candidate {
    pub fn host(self, domain: &str) -> String {
        match self {
            Candidate::Domain => domain::normalize(domain),
            Candidate::SpfSubdomain => domain::spf_subdomain(domain),
        }
    }
}

/// Where and in which order to look for a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOptions {
    pub candidates: Vec<Candidate>,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            candidates: vec![Candidate::Domain, Candidate::SpfSubdomain],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error(transparent)]
    Dns(#[from] DnsError),
    #[error(transparent)]
    Parse(#[from] SpfError),
}

/// Fetch the raw SPF TXT string for `domain`.
///
/// Candidates are probed in order. A missing name or an empty answer moves
/// on to the next candidate; any other DNS failure is returned. `Ok(None)`
/// means no candidate published an SPF record.
pub async fn query<R: DnsResolver>(
    resolver: &R,
    domain: &str,
    options: &LookupOptions,
) -> Result<Option<String>, DnsError> {
    for candidate in &options.candidates {
        let host = candidate.host(domain);
        debug!(host = %host, "querying TXT for SPF record");

        let txt_records = match resolver.query_txt(&host).await {
            Ok(records) => records,
            Err(e) if e.is_empty_answer() => continue,
            Err(e) => return Err(e),
        };

        let mut spf_records = txt_records.into_iter().filter(|s| is_spf_record(s));
        if let Some(first) = spf_records.next() {
            let extra = spf_records.count();
            if extra > 0 {
                warn!(host = %host, count = extra + 1, "multiple SPF records, using the first");
            }
            return Ok(Some(first));
        }
    }
    Ok(None)
}

/// [`query`], then parse what was found.
pub async fn lookup_record<R: DnsResolver>(
    resolver: &R,
    domain: &str,
    options: &LookupOptions,
) -> Result<Option<Record>, LookupError> {
    match query(resolver, domain, options).await? {
        Some(txt) => Ok(Some(Record::parse(&txt)?)),
        None => Ok(None),
    }
}

/// `v=spf1`, one or more spaces, then something other than spaces. Anything
/// else is rejected by [`Record::parse`] on the version tag alone.
fn is_spf_record(txt: &str) -> bool {
    match txt.strip_prefix("v=spf1 ") {
        Some(rest) => !rest.trim_start_matches(' ').is_empty(),
        None => false,
    }
}
