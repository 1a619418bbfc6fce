//! Identifier resolution: free-text query terms to UniProt accessions
//!
//! A raw query string is split into terms, entity-prefixed terms bypass
//! the lookup, and the remaining terms go to the identifier-mapping table
//! in one batched call. Returned rows are grouped back onto the terms
//! they answer.

use super::types::{
    MatchMode, QueryTerm, ResolvedQuery, TermResolution, MATCHES_PER_TERM,
};
use crate::model::IdentifierRecord;
use crate::storage::{IdentifierLookup, StorageResult};

/// Split a raw query string into terms.
///
/// Terms are separated by commas or semicolons; surrounding whitespace is
/// trimmed and empty fragments dropped. A colon after the first character
/// marks an entity-type prefix (`complex:MTORC1`); a leading colon does
/// not, so the term still goes through the lookup.
pub fn parse_queries(raw: &str) -> Vec<QueryTerm> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|term| match term.find(':') {
            Some(idx) if idx > 0 => QueryTerm::Direct {
                term: term.to_string(),
                entity_type: term[..idx].to_lowercase(),
                value: term[idx + 1..].to_string(),
            },
            _ => QueryTerm::Lookup {
                term: term.to_string(),
            },
        })
        .collect()
}

/// Resolve a raw query against the identifier-mapping table.
///
/// All lookup terms are sent in a single batched search; grouping of the
/// returned rows uses the given [`MatchMode`]. Direct terms synthesize a
/// single record without touching the database.
pub async fn resolve_identifiers(
    lookup: &dyn IdentifierLookup,
    query: &str,
    species: &str,
    mode: MatchMode,
) -> StorageResult<ResolvedQuery> {
    let terms = parse_queries(query);

    let lookup_terms: Vec<String> = terms
        .iter()
        .filter_map(|t| match t {
            QueryTerm::Lookup { term } => Some(term.clone()),
            QueryTerm::Direct { .. } => None,
        })
        .collect();

    let records = if lookup_terms.is_empty() {
        Vec::new()
    } else {
        lookup
            .search_identifiers(&lookup_terms, MATCHES_PER_TERM, species)
            .await?
    };

    let mut identifier_results = Vec::with_capacity(terms.len());
    for term in &terms {
        let matches = match term {
            QueryTerm::Direct {
                entity_type, value, ..
            } => vec![IdentifierRecord {
                uniprot_accession: value.clone(),
                identifier_value: value.clone(),
                identifier_type: entity_type.clone(),
                taxon_id: species.to_string(),
            }],
            QueryTerm::Lookup { term } => records
                .iter()
                .filter(|r| mode.matches(term, &r.identifier_value))
                .cloned()
                .collect(),
        };
        identifier_results.push(TermResolution {
            query_term: term.raw().to_string(),
            matches,
        });
    }

    let resolved_identifiers = identifier_results
        .iter()
        .flat_map(|r| r.matches.iter().cloned())
        .collect();

    Ok(ResolvedQuery {
        identifier_results,
        resolved_identifiers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the arguments of each `search_identifiers` call and replays
    /// a canned response.
    struct MockLookup {
        calls: Mutex<Vec<(Vec<String>, usize, String)>>,
        response: Vec<IdentifierRecord>,
    }

    impl MockLookup {
        fn new(response: Vec<IdentifierRecord>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                response,
            }
        }

        fn calls(&self) -> Vec<(Vec<String>, usize, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IdentifierLookup for MockLookup {
        async fn search_identifiers(
            &self,
            terms: &[String],
            limit_per_term: usize,
            species: &str,
        ) -> Result<Vec<IdentifierRecord>, StorageError> {
            self.calls.lock().unwrap().push((
                terms.to_vec(),
                limit_per_term,
                species.to_string(),
            ));
            Ok(self.response.clone())
        }
    }

    fn record(accession: &str, value: &str, id_type: &str) -> IdentifierRecord {
        IdentifierRecord {
            uniprot_accession: accession.to_string(),
            identifier_value: value.to_string(),
            identifier_type: id_type.to_string(),
            taxon_id: "9606".to_string(),
        }
    }

    #[test]
    fn parsing_splits_on_commas_and_semicolons() {
        let terms = parse_queries(" TP53, KRAS ;; EGFR ,");
        assert_eq!(
            terms,
            vec![
                QueryTerm::Lookup {
                    term: "TP53".into()
                },
                QueryTerm::Lookup {
                    term: "KRAS".into()
                },
                QueryTerm::Lookup {
                    term: "EGFR".into()
                },
            ]
        );
    }

    #[test]
    fn parsing_recognizes_entity_prefixes() {
        let terms = parse_queries("COMPLEX:MTORC1, :odd, TP53");
        assert_eq!(
            terms[0],
            QueryTerm::Direct {
                term: "COMPLEX:MTORC1".into(),
                entity_type: "complex".into(),
                value: "MTORC1".into(),
            }
        );
        // leading colon is not a prefix
        assert_eq!(
            terms[1],
            QueryTerm::Lookup {
                term: ":odd".into()
            }
        );
        assert_eq!(
            terms[2],
            QueryTerm::Lookup {
                term: "TP53".into()
            }
        );
    }

    #[tokio::test]
    async fn lookup_terms_go_out_in_one_batched_call() {
        let mock = MockLookup::new(vec![
            record("P04637", "TP53", "genesymbol"),
            record("P01116", "KRAS", "genesymbol"),
        ]);
        let resolved =
            resolve_identifiers(&mock, "TP53, KRAS", "9606", MatchMode::default())
                .await
                .unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec!["TP53".to_string(), "KRAS".to_string()]);
        assert_eq!(calls[0].1, MATCHES_PER_TERM);
        assert_eq!(calls[0].2, "9606");

        assert_eq!(resolved.identifier_results.len(), 2);
        assert_eq!(resolved.identifier_results[0].query_term, "TP53");
        assert_eq!(
            resolved.identifier_results[0].matches[0].uniprot_accession,
            "P04637"
        );
        assert_eq!(resolved.resolved_identifiers.len(), 2);
    }

    #[tokio::test]
    async fn direct_terms_bypass_the_lookup() {
        let mock = MockLookup::new(Vec::new());
        let resolved = resolve_identifiers(
            &mock,
            "COMPLEX:MTORC1",
            "10090",
            MatchMode::default(),
        )
        .await
        .unwrap();

        assert!(mock.calls().is_empty());
        assert_eq!(resolved.identifier_results.len(), 1);
        assert_eq!(resolved.identifier_results[0].query_term, "COMPLEX:MTORC1");
        let matched = &resolved.identifier_results[0].matches[0];
        assert_eq!(matched.uniprot_accession, "MTORC1");
        assert_eq!(matched.identifier_value, "MTORC1");
        assert_eq!(matched.identifier_type, "complex");
        assert_eq!(matched.taxon_id, "10090");
    }

    #[tokio::test]
    async fn grouping_is_bidirectional_and_case_insensitive() {
        // The prefix lookup for "TP53" can return TP53BP1; both directions
        // of containment attribute a row to its term.
        let mock = MockLookup::new(vec![
            record("Q12888", "TP53BP1", "genesymbol"),
            record("P01116", "kras", "genesymbol"),
        ]);
        let resolved =
            resolve_identifiers(&mock, "tp53, KRAS", "9606", MatchMode::default())
                .await
                .unwrap();

        assert_eq!(resolved.identifier_results[0].matches.len(), 1);
        assert_eq!(
            resolved.identifier_results[0].matches[0].identifier_value,
            "TP53BP1"
        );
        assert_eq!(resolved.identifier_results[1].matches.len(), 1);
        assert_eq!(
            resolved.identifier_results[1].matches[0].identifier_value,
            "kras"
        );
    }

    #[tokio::test]
    async fn unmatched_terms_keep_an_empty_group() {
        let mock = MockLookup::new(vec![record("P04637", "TP53", "genesymbol")]);
        let resolved = resolve_identifiers(
            &mock,
            "TP53, NOSUCHGENE",
            "9606",
            MatchMode::default(),
        )
        .await
        .unwrap();

        assert_eq!(resolved.identifier_results.len(), 2);
        assert_eq!(resolved.identifier_results[1].query_term, "NOSUCHGENE");
        assert!(resolved.identifier_results[1].matches.is_empty());
        assert_eq!(resolved.resolved_identifiers.len(), 1);
    }

    #[tokio::test]
    async fn union_preserves_term_order_and_duplicates() {
        // One row answers both terms under bidirectional matching; the
        // flattened union keeps both attributions.
        let mock = MockLookup::new(vec![record("P04637", "TP53", "genesymbol")]);
        let resolved =
            resolve_identifiers(&mock, "TP53, tp5", "9606", MatchMode::default())
                .await
                .unwrap();

        assert_eq!(resolved.resolved_identifiers.len(), 2);
        assert_eq!(
            resolved.resolved_identifiers[0],
            resolved.resolved_identifiers[1]
        );
    }

    #[tokio::test]
    async fn empty_query_resolves_without_a_lookup() {
        let mock = MockLookup::new(vec![record("P04637", "TP53", "genesymbol")]);
        let resolved =
            resolve_identifiers(&mock, "  , ; ", "9606", MatchMode::default())
                .await
                .unwrap();
        assert!(mock.calls().is_empty());
        assert!(resolved.is_empty());
        assert!(resolved.identifier_results.is_empty());
    }

    #[tokio::test]
    async fn exact_mode_drops_prefix_overmatches() {
        let mock = MockLookup::new(vec![record("Q12888", "TP53BP1", "genesymbol")]);
        let resolved =
            resolve_identifiers(&mock, "TP53", "9606", MatchMode::Exact)
                .await
                .unwrap();
        assert!(resolved.identifier_results[0].matches.is_empty());
    }
}
