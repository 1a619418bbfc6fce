//! Query terms and resolution results

use crate::model::IdentifierRecord;
use serde::{Deserialize, Serialize};

/// Default species taxon when a request does not name one (human).
pub const DEFAULT_SPECIES: &str = "9606";

/// How many identifier-mapping rows to keep per query term.
pub const MATCHES_PER_TERM: usize = 1;

/// One term parsed out of a raw query string.
///
/// A term with an entity-type prefix (`complex:MTORC1`) bypasses the
/// identifier-mapping lookup entirely; everything else goes through the
/// database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTerm {
    /// Prefixed term, no lookup. The literal value after the colon becomes
    /// both accession and identifier value in the synthesized record.
    Direct {
        term: String,
        entity_type: String,
        value: String,
    },
    /// Plain term resolved through the identifier-mapping table.
    Lookup { term: String },
}

impl QueryTerm {
    /// The raw text of the term as it appeared in the query.
    pub fn raw(&self) -> &str {
        match self {
            QueryTerm::Direct { term, .. } => term,
            QueryTerm::Lookup { term } => term,
        }
    }
}

/// How database rows are grouped back onto the query terms they answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Identifier value equals the term, case-insensitively.
    Exact,
    /// Identifier value starts with the term, case-insensitively.
    Prefix,
    /// Either string contains the other, case-insensitively. This is the
    /// widest net and the default: a prefix lookup can return values
    /// shorter or longer than the term and both still belong to it.
    #[default]
    Bidirectional,
}

impl MatchMode {
    pub fn matches(&self, term: &str, identifier_value: &str) -> bool {
        let term = term.to_lowercase();
        let value = identifier_value.to_lowercase();
        match self {
            MatchMode::Exact => term == value,
            MatchMode::Prefix => value.starts_with(&term),
            MatchMode::Bidirectional => value.contains(&term) || term.contains(&value),
        }
    }
}

/// The mapping rows attributed to one query term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermResolution {
    pub query_term: String,
    pub matches: Vec<IdentifierRecord>,
}

/// A fully resolved query: per-term groupings plus the flattened union.
///
/// `resolved_identifiers` preserves term order and is deliberately not
/// deduplicated; a record matched by two terms appears twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedQuery {
    pub identifier_results: Vec<TermResolution>,
    pub resolved_identifiers: Vec<IdentifierRecord>,
}

impl ResolvedQuery {
    pub fn is_empty(&self) -> bool {
        self.resolved_identifiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_modes_compare_case_insensitively() {
        assert!(MatchMode::Exact.matches("tp53", "TP53"));
        assert!(!MatchMode::Exact.matches("tp53", "TP53BP1"));

        assert!(MatchMode::Prefix.matches("TP53", "tp53bp1"));
        assert!(!MatchMode::Prefix.matches("tp53bp1", "TP53"));

        assert!(MatchMode::Bidirectional.matches("TP53BP1", "tp53"));
        assert!(MatchMode::Bidirectional.matches("tp53", "TP53BP1"));
        assert!(!MatchMode::Bidirectional.matches("kras", "TP53"));
    }

    #[test]
    fn default_mode_is_bidirectional() {
        assert_eq!(MatchMode::default(), MatchMode::Bidirectional);
    }
}
