//! Read-only SQL gateway over the network database
//!
//! Validation is a deliberate allowlist of exactly one statement shape:
//! the trimmed query must start with SELECT, case-insensitively. Anything
//! else is rejected before touching the connection. The schema
//! description is published so callers (and the MCP tool) can compose
//! queries without guessing column names.

use crate::query::DEFAULT_SPECIES;
use crate::storage::NetworkStore;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Error message returned for every rejected statement.
pub const SQL_VALIDATION_ERROR: &str =
    "Invalid query. Only SELECT statements are allowed.";

/// Human-readable schema reference published to SQL clients.
pub const SCHEMA_DESCRIPTION: &str = r#"Available tables:

uniprot_identifiers(id, uniprot_accession, identifier_value, identifier_type, taxon_id)
  Identifier-mapping table. identifier_type is e.g. 'genesymbol',
  'uniprot_entry', 'ensembl'. taxon_id is an NCBI taxon string
  ('9606' human, '10090' mouse, '10116' rat).

interactions(id, source, target, source_genesymbol, target_genesymbol,
  is_directed, is_stimulation, is_inhibition, consensus_direction,
  consensus_stimulation, consensus_inhibition, sources, "references",
  type, curation_effort, ncbi_tax_id_source, entity_type_source,
  ncbi_tax_id_target, entity_type_target)
  Interaction network edges. sources is a JSON array of database names.

annotations(id, uniprot, genesymbol, entity_type, source, label, value, record_id)
  Functional annotations, one label/value pair per row.

intercell(id, category, parent, database, scope, aspect, source, uniprot,
  genesymbol, entity_type, consensus_score, transmitter, receiver,
  secreted, plasma_membrane_transmembrane, plasma_membrane_peripheral)
  Intercellular-communication role assignments.

complexes(id, name, components, components_genesymbols, stoichiometry,
  sources, "references", identifiers)
  Protein complexes. components and components_genesymbols are JSON arrays.

enzsub(id, enzyme, enzyme_genesymbol, substrate, substrate_genesymbol,
  isoforms, residue_type, residue_offset, modification, sources,
  "references", curation_effort, ncbi_tax_id)
  Enzyme-substrate relationships (e.g. phosphorylation sites).

Example queries:

SELECT * FROM interactions
WHERE source_genesymbol = 'TP53' AND is_stimulation = 1 LIMIT 20;

SELECT genesymbol, label, value FROM annotations
WHERE uniprot = 'P04637' AND source = 'HPA';

SELECT enzyme_genesymbol, residue_type, residue_offset FROM enzsub
WHERE substrate_genesymbol = 'TP53' AND modification = 'phosphorylation';
"#;

/// Accept the statement only if it starts with SELECT after trimming.
pub fn validate_sql_query(sql: &str) -> bool {
    sql.trim().to_uppercase().starts_with("SELECT")
}

/// Outcome of a gateway execution, shaped for direct JSON serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SqlToolResponse {
    #[serde(rename_all = "camelCase")]
    Success {
        results: Vec<Map<String, Value>>,
        total_count: usize,
        limited: bool,
    },
    Failure { error: String },
}

/// Validates and executes read-only SQL against the network store.
#[derive(Clone)]
pub struct SqlGateway {
    store: Arc<NetworkStore>,
}

impl SqlGateway {
    pub fn new(store: Arc<NetworkStore>) -> Self {
        Self { store }
    }

    /// Run one statement. Validation failures and execution errors both
    /// come back as a `Failure` payload rather than an `Err`; only the
    /// caller's transport decides how to surface them.
    pub fn run(&self, sql: &str) -> SqlToolResponse {
        if !validate_sql_query(sql) {
            return SqlToolResponse::Failure {
                error: SQL_VALIDATION_ERROR.to_string(),
            };
        }
        match self.store.execute_read_only(sql) {
            Ok(results) => SqlToolResponse::Success {
                total_count: results.len(),
                results,
                limited: false,
            },
            Err(err) => SqlToolResponse::Failure {
                error: err.to_string(),
            },
        }
    }

    /// The schema reference, with the default species noted.
    pub fn schema_description(&self) -> String {
        format!(
            "{SCHEMA_DESCRIPTION}\nDefault species taxon: {DEFAULT_SPECIES} (human).\n"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> SqlGateway {
        let store = NetworkStore::open_in_memory().unwrap();
        store
            .raw_batch(
                r#"
                INSERT INTO annotations (uniprot, genesymbol, source, label, value)
                VALUES ('P04637', 'TP53', 'HPA', 'tissue', 'ubiquitous');
                "#,
            )
            .unwrap();
        SqlGateway::new(Arc::new(store))
    }

    #[test]
    fn validation_is_a_select_prefix_check() {
        assert!(validate_sql_query("SELECT 1"));
        assert!(validate_sql_query("  select * from annotations"));
        assert!(validate_sql_query("\n\tSeLeCt genesymbol FROM annotations"));
        assert!(!validate_sql_query("DELETE FROM annotations"));
        assert!(!validate_sql_query("UPDATE annotations SET value = 'x'"));
        assert!(!validate_sql_query("PRAGMA table_info(annotations)"));
        assert!(!validate_sql_query(""));
        // WITH-prefixed CTEs are rejected by the allowlist
        assert!(!validate_sql_query("WITH t AS (SELECT 1) SELECT * FROM t"));
    }

    #[test]
    fn rejected_statements_return_the_canonical_error() {
        let gw = gateway();
        match gw.run("DROP TABLE annotations") {
            SqlToolResponse::Failure { error } => {
                assert_eq!(error, SQL_VALIDATION_ERROR)
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn select_returns_rows_with_count() {
        let gw = gateway();
        match gw.run("SELECT genesymbol, value FROM annotations") {
            SqlToolResponse::Success {
                results,
                total_count,
                limited,
            } => {
                assert_eq!(total_count, 1);
                assert!(!limited);
                assert_eq!(results[0]["genesymbol"], "TP53");
                assert_eq!(results[0]["value"], "ubiquitous");
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn execution_errors_become_failure_payloads() {
        let gw = gateway();
        match gw.run("SELECT * FROM no_such_table") {
            SqlToolResponse::Failure { error } => {
                assert!(error.contains("no_such_table"))
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn success_serializes_in_camel_case() {
        let gw = gateway();
        let response = gw.run("SELECT genesymbol FROM annotations");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["totalCount"], 1);
        assert_eq!(json["limited"], false);
        assert!(json["results"].is_array());
    }

    #[test]
    fn schema_description_names_every_table() {
        let gw = gateway();
        let schema = gw.schema_description();
        for table in [
            "uniprot_identifiers",
            "interactions",
            "annotations",
            "intercell",
            "complexes",
            "enzsub",
        ] {
            assert!(schema.contains(table), "missing table {table}");
        }
    }
}
