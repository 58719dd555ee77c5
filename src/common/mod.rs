//! DNS access and domain-name helpers used by record retrieval.

pub mod dns;
pub mod domain;
