//! SPF (RFC 7208) record parsing.
//!
//! [`parse`] turns TXT record text into a [`Record`]: an ordered list of
//! mechanisms and modifiers that prints back to the text it came from.
//! [`lookup`] fetches the text from DNS.

mod ip;
pub mod lookup;
mod macros;
mod mechanism;
mod modifier;
mod parser;
mod record;
mod transform;
mod tree;
mod types;

pub use ip::Ip;
pub use macros::{Escape, Macro, MacroElement, MacroLetter, MacroString};
pub use mechanism::{DualCidrLength, Mechanism, MechanismName};
pub use modifier::{Modifier, ModifierName};
pub use parser::{Expected, ParseFailure};
pub use record::{Record, Rule, Version};
pub use types::{Qualifier, Value};

use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpfError {
    #[error("invalid SPF record {0}")]
    InvalidRecord(ParseFailure),
    /// An RFC 4406 `spf2.0/...` record. Never parsed as SPF.
    #[error("SenderID record found (scopes: {})", .scopes.join(","))]
    SenderIdFound { scopes: Vec<String> },
}

impl SpfError {
    pub fn is_sender_id(&self) -> bool {
        matches!(self, SpfError::SenderIdFound { .. })
    }

    /// The syntax failure, for an ordinary invalid record.
    pub fn failure(&self) -> Option<&ParseFailure> {
        match self {
            SpfError::InvalidRecord(failure) => Some(failure),
            SpfError::SenderIdFound { .. } => None,
        }
    }
}

/// Parse an SPF TXT record.
pub fn parse(text: &str) -> Result<Record, SpfError> {
    if let Some(scopes) = parser::sender_id_scopes(text) {
        debug!(?scopes, "SenderID record rejected");
        return Err(SpfError::SenderIdFound { scopes });
    }
    match parser::parse(text) {
        Ok(tree) => {
            let record = transform::record(tree);
            trace!(rules = record.rules().len(), "parsed SPF record");
            Ok(record)
        }
        Err(failure) => {
            debug!(
                position = failure.position(),
                expected = ?failure.expected(),
                "SPF record failed to parse"
            );
            Err(SpfError::InvalidRecord(failure))
        }
    }
}
