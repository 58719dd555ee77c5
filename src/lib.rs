//! SPF record parsing and retrieval.
//!
//! ```
//! let record = spf_query::parse("v=spf1 ip4:192.0.2.0/24 include:_spf.example.com -all").unwrap();
//! assert_eq!(record.include().len(), 1);
//! assert_eq!(record.to_string(), "v=spf1 ip4:192.0.2.0/24 include:_spf.example.com -all");
//! ```
//!
//! DNS caching is the caller's responsibility. This library provides
//! a `DnsResolver` trait; implement it with caching at the resolver layer.

pub mod common;
pub mod spf;

pub use spf::lookup::{lookup_record, query, Candidate, LookupError, LookupOptions};
pub use spf::{parse, Mechanism, Modifier, ParseFailure, Qualifier, Record, Rule, SpfError, Value};
