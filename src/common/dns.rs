use std::collections::HashMap;
use std::future::Future;

#[cfg(feature = "resolver")]
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
#[cfg(feature = "resolver")]
use hickory_resolver::name_server::TokioConnectionProvider;
#[cfg(feature = "resolver")]
use hickory_resolver::TokioResolver;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsError {
    #[error("NXDOMAIN: domain does not exist")]
    NxDomain,
    #[error("no records of the requested type")]
    NoRecords,
    #[error("SERVFAIL: server failure")]
    ServFail,
    #[error("timeout")]
    Timeout,
    #[error("DNS error: {0}")]
    Other(String),
}

impl DnsError {
    /// The name has nothing to offer; try elsewhere.
    pub fn is_empty_answer(&self) -> bool {
        matches!(self, DnsError::NxDomain | DnsError::NoRecords)
    }
}

/// TXT lookups, abstracted so record retrieval can be tested without a network.
pub trait DnsResolver: Send + Sync {
    /// Each TXT record as one string, character-strings concatenated.
    fn query_txt(&self, domain: &str)
        -> impl Future<Output = Result<Vec<String>, DnsError>> + Send;
}

/// Hickory DNS resolver implementation
#[cfg(feature = "resolver")]
#[derive(Clone)]
pub struct HickoryResolver {
    resolver: TokioResolver,
}

#[cfg(feature = "resolver")]
impl HickoryResolver {
    /// Resolver using the default upstream configuration.
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default(), ResolverOpts::default())
    }

    pub fn with_config(config: ResolverConfig, opts: ResolverOpts) -> Self {
        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(opts)
                .build();
        Self { resolver }
    }

    fn classify_error(e: &hickory_resolver::ResolveError) -> DnsError {
        if e.is_nx_domain() {
            return DnsError::NxDomain;
        }
        if e.is_no_records_found() {
            return DnsError::NoRecords;
        }
        let msg = e.to_string().to_lowercase();
        if msg.contains("timeout") || msg.contains("timed out") {
            DnsError::Timeout
        } else if msg.contains("servfail") {
            DnsError::ServFail
        } else {
            DnsError::Other(e.to_string())
        }
    }
}

#[cfg(feature = "resolver")]
impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "resolver")]
impl DnsResolver for HickoryResolver {
    async fn query_txt(&self, domain: &str) -> Result<Vec<String>, DnsError> {
        match self.resolver.txt_lookup(domain).await {
            Ok(lookup) => {
                let records: Vec<String> = lookup
                    .iter()
                    .map(|txt| {
                        txt.txt_data()
                            .iter()
                            .map(|part| String::from_utf8_lossy(part))
                            .collect::<String>()
                    })
                    .collect();
                Ok(records)
            }
            Err(e) => Err(Self::classify_error(&e)),
        }
    }
}

/// In-memory resolver for tests. Names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct MockResolver {
    txt_records: HashMap<String, Vec<String>>,
    errors: HashMap<String, DnsError>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_txt(&mut self, domain: &str, records: Vec<String>) {
        self.txt_records.insert(domain.to_lowercase(), records);
    }

    /// Make every TXT query for `domain` fail with `err`.
    pub fn add_txt_err(&mut self, domain: &str, err: DnsError) {
        self.errors.insert(domain.to_lowercase(), err);
    }

    pub fn set_nxdomain(&mut self, domain: &str) {
        self.add_txt_err(domain, DnsError::NxDomain);
    }
}

impl DnsResolver for MockResolver {
    async fn query_txt(&self, domain: &str) -> Result<Vec<String>, DnsError> {
        let domain_lower = domain.to_lowercase();
        if let Some(err) = self.errors.get(&domain_lower) {
            return Err(err.clone());
        }
        self.txt_records
            .get(&domain_lower)
            .cloned()
            .ok_or(DnsError::NxDomain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_resolver_txt() {
        let mut resolver = MockResolver::new();
        resolver.add_txt("example.com", vec!["v=spf1 -all".to_string()]);

        let result = resolver.query_txt("example.com").await.unwrap();
        assert_eq!(result, vec!["v=spf1 -all"]);
    }

    #[tokio::test]
    async fn test_mock_resolver_case_insensitive() {
        let mut resolver = MockResolver::new();
        resolver.add_txt("Example.COM", vec!["hello".to_string()]);

        let result = resolver.query_txt("example.com").await.unwrap();
        assert_eq!(result, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_mock_resolver_nxdomain() {
        let mut resolver = MockResolver::new();
        resolver.set_nxdomain("nonexistent.com");

        let result = resolver.query_txt("nonexistent.com").await;
        assert_eq!(result, Err(DnsError::NxDomain));
    }

    #[tokio::test]
    async fn test_mock_resolver_unknown_name_is_nxdomain() {
        let resolver = MockResolver::new();
        let result = resolver.query_txt("unknown.example").await;
        assert_eq!(result, Err(DnsError::NxDomain));
    }

    #[tokio::test]
    async fn test_mock_resolver_injected_error() {
        let mut resolver = MockResolver::new();
        resolver.add_txt("example.com", vec!["v=spf1 -all".to_string()]);
        resolver.add_txt_err("example.com", DnsError::ServFail);

        let result = resolver.query_txt("example.com").await;
        assert_eq!(result, Err(DnsError::ServFail));
    }

    #[test]
    fn empty_answer_classification() {
        assert!(DnsError::NxDomain.is_empty_answer());
        assert!(DnsError::NoRecords.is_empty_answer());
        assert!(!DnsError::Timeout.is_empty_answer());
        assert!(!DnsError::Other("refused".into()).is_empty_answer());
    }
}
