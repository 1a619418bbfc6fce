//! SQLite backend for the network database
//!
//! Holds the interaction/annotation tables plus the `uniprot_identifiers`
//! mapping table. All operations are reads; the database file is produced
//! by an external build pipeline.

use super::traits::{IdentifierLookup, StorageError, StorageResult};
use crate::model::{
    Annotation, ComplexEntry, EnzSub, IdentifierRecord, Interaction, IntercellEntry,
};
use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed network store.
///
/// Thread-safe via an internal mutex on the connection.
pub struct NetworkStore {
    conn: Mutex<Connection>,
}

impl NetworkStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS uniprot_identifiers (
                id INTEGER PRIMARY KEY,
                uniprot_accession TEXT NOT NULL,
                identifier_type TEXT NOT NULL,
                identifier_value TEXT NOT NULL,
                taxon_id TEXT NOT NULL DEFAULT '9606'
            );
            CREATE INDEX IF NOT EXISTS idx_uniprot_identifiers_value
                ON uniprot_identifiers(identifier_value);
            CREATE INDEX IF NOT EXISTS idx_uniprot_identifiers_accession
                ON uniprot_identifiers(uniprot_accession);

            CREATE TABLE IF NOT EXISTS annotations (
                id INTEGER PRIMARY KEY,
                uniprot TEXT,
                genesymbol TEXT,
                entity_type TEXT,
                source TEXT,
                label TEXT,
                value TEXT,
                record_id INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_annotations_uniprot
                ON annotations(uniprot);
            CREATE INDEX IF NOT EXISTS idx_annotations_genesymbol
                ON annotations(genesymbol);

            -- Array-valued columns (sources, components, ...) hold JSON text.
            CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY,
                source TEXT,
                target TEXT,
                source_genesymbol TEXT,
                target_genesymbol TEXT,
                is_directed INTEGER,
                is_stimulation INTEGER,
                is_inhibition INTEGER,
                consensus_direction INTEGER,
                consensus_stimulation INTEGER,
                consensus_inhibition INTEGER,
                sources TEXT,
                "references" TEXT,
                type TEXT,
                curation_effort INTEGER,
                ncbi_tax_id_source INTEGER,
                entity_type_source TEXT,
                ncbi_tax_id_target INTEGER,
                entity_type_target TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_interactions_source
                ON interactions(source);
            CREATE INDEX IF NOT EXISTS idx_interactions_target
                ON interactions(target);
            CREATE INDEX IF NOT EXISTS idx_interactions_source_genesymbol
                ON interactions(source_genesymbol);
            CREATE INDEX IF NOT EXISTS idx_interactions_target_genesymbol
                ON interactions(target_genesymbol);

            CREATE TABLE IF NOT EXISTS intercell (
                id INTEGER PRIMARY KEY,
                category TEXT,
                parent TEXT,
                database TEXT,
                scope TEXT,
                aspect TEXT,
                source TEXT,
                uniprot TEXT,
                genesymbol TEXT,
                entity_type TEXT,
                consensus_score INTEGER,
                transmitter INTEGER,
                receiver INTEGER,
                secreted INTEGER,
                plasma_membrane_transmembrane INTEGER,
                plasma_membrane_peripheral INTEGER
            );

            CREATE TABLE IF NOT EXISTS complexes (
                id INTEGER PRIMARY KEY,
                name TEXT,
                components TEXT,
                components_genesymbols TEXT,
                stoichiometry TEXT,
                sources TEXT,
                "references" TEXT,
                identifiers TEXT
            );

            CREATE TABLE IF NOT EXISTS enzsub (
                id INTEGER PRIMARY KEY,
                enzyme TEXT,
                enzyme_genesymbol TEXT,
                substrate TEXT,
                substrate_genesymbol TEXT,
                isoforms TEXT,
                residue_type TEXT,
                residue_offset INTEGER,
                modification TEXT,
                sources TEXT,
                "references" TEXT,
                curation_effort INTEGER,
                ncbi_tax_id INTEGER
            );
            "#,
        )?;
        Ok(())
    }

    /// Batched identifier search: case-insensitive prefix match per term,
    /// at most `limit_per_term` rows per term, scoped by taxon.
    pub fn search_identifiers_multi(
        &self,
        terms: &[String],
        limit_per_term: usize,
        species: &str,
    ) -> StorageResult<Vec<IdentifierRecord>> {
        let conn = self.conn.lock().expect("network store mutex poisoned");
        let mut stmt = conn.prepare_cached(
            "SELECT uniprot_accession, identifier_value, identifier_type, taxon_id
             FROM uniprot_identifiers
             WHERE identifier_value LIKE ?1 ESCAPE '\\' AND taxon_id = ?2
             ORDER BY id
             LIMIT ?3",
        )?;

        let mut records = Vec::new();
        for term in terms {
            let pattern = format!("{}%", escape_like(term));
            let rows = stmt.query_map(
                params![pattern, species, limit_per_term as i64],
                |row| {
                    Ok(IdentifierRecord {
                        uniprot_accession: row.get(0)?,
                        identifier_value: row.get(1)?,
                        identifier_type: row.get(2)?,
                        taxon_id: row.get(3)?,
                    })
                },
            )?;
            for record in rows {
                records.push(record?);
            }
        }
        Ok(records)
    }

    /// Interactions where any resolved identifier matches either endpoint,
    /// by accession or gene symbol, case-insensitively.
    pub fn protein_neighbors(
        &self,
        identifiers: &[IdentifierRecord],
    ) -> StorageResult<Vec<Interaction>> {
        let keys = match_keys(identifiers);
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let vars = repeat_vars(keys.len());
        let sql = format!(
            "SELECT id, source, target, source_genesymbol, target_genesymbol,
                    is_directed, is_stimulation, is_inhibition,
                    consensus_direction, consensus_stimulation, consensus_inhibition,
                    sources, \"references\", type, curation_effort,
                    ncbi_tax_id_source, entity_type_source,
                    ncbi_tax_id_target, entity_type_target
             FROM interactions
             WHERE lower(source) IN ({vars})
                OR lower(target) IN ({vars})
                OR lower(source_genesymbol) IN ({vars})
                OR lower(target_genesymbol) IN ({vars})
             ORDER BY id",
        );
        let conn = self.conn.lock().expect("network store mutex poisoned");
        let mut stmt = conn.prepare(&sql)?;
        let bound: Vec<&str> = keys
            .iter()
            .cycle()
            .take(keys.len() * 4)
            .map(String::as_str)
            .collect();
        let rows = stmt.query_map(rusqlite::params_from_iter(bound), row_to_interaction)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Annotations for any resolved identifier (uniprot or gene symbol).
    pub fn protein_annotations(
        &self,
        identifiers: &[IdentifierRecord],
    ) -> StorageResult<Vec<Annotation>> {
        let keys = match_keys(identifiers);
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let vars = repeat_vars(keys.len());
        let sql = format!(
            "SELECT id, uniprot, genesymbol, entity_type, source, label, value, record_id
             FROM annotations
             WHERE lower(uniprot) IN ({vars}) OR lower(genesymbol) IN ({vars})
             ORDER BY id",
        );
        let conn = self.conn.lock().expect("network store mutex poisoned");
        let mut stmt = conn.prepare(&sql)?;
        let bound: Vec<&str> = keys
            .iter()
            .cycle()
            .take(keys.len() * 2)
            .map(String::as_str)
            .collect();
        let rows = stmt.query_map(rusqlite::params_from_iter(bound), |row| {
            Ok(Annotation {
                id: row.get(0)?,
                uniprot: row.get(1)?,
                genesymbol: row.get(2)?,
                entity_type: row.get(3)?,
                source: row.get(4)?,
                label: row.get(5)?,
                value: row.get(6)?,
                record_id: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Intercell role entries for any resolved identifier.
    pub fn intercell_roles(
        &self,
        identifiers: &[IdentifierRecord],
    ) -> StorageResult<Vec<IntercellEntry>> {
        let keys = match_keys(identifiers);
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let vars = repeat_vars(keys.len());
        let sql = format!(
            "SELECT id, category, parent, database, scope, aspect, source,
                    uniprot, genesymbol, entity_type, consensus_score,
                    transmitter, receiver, secreted,
                    plasma_membrane_transmembrane, plasma_membrane_peripheral
             FROM intercell
             WHERE lower(uniprot) IN ({vars}) OR lower(genesymbol) IN ({vars})
             ORDER BY id",
        );
        let conn = self.conn.lock().expect("network store mutex poisoned");
        let mut stmt = conn.prepare(&sql)?;
        let bound: Vec<&str> = keys
            .iter()
            .cycle()
            .take(keys.len() * 2)
            .map(String::as_str)
            .collect();
        let rows = stmt.query_map(rusqlite::params_from_iter(bound), |row| {
            Ok(IntercellEntry {
                id: row.get(0)?,
                category: row.get(1)?,
                parent: row.get(2)?,
                database: row.get(3)?,
                scope: row.get(4)?,
                aspect: row.get(5)?,
                source: row.get(6)?,
                uniprot: row.get(7)?,
                genesymbol: row.get(8)?,
                entity_type: row.get(9)?,
                consensus_score: row.get(10)?,
                transmitter: row.get(11)?,
                receiver: row.get(12)?,
                secreted: row.get(13)?,
                plasma_membrane_transmembrane: row.get(14)?,
                plasma_membrane_peripheral: row.get(15)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Complexes containing any resolved identifier among their components.
    ///
    /// Accessions match components exactly; gene-type identifier values
    /// match component gene symbols case-insensitively. Membership is
    /// checked in Rust because the component lists are JSON arrays.
    pub fn complexes_containing(
        &self,
        identifiers: &[IdentifierRecord],
    ) -> StorageResult<Vec<ComplexEntry>> {
        if identifiers.is_empty() {
            return Ok(Vec::new());
        }
        let accessions: Vec<&str> = identifiers
            .iter()
            .map(|r| r.uniprot_accession.as_str())
            .collect();
        let gene_symbols: Vec<String> = identifiers
            .iter()
            .filter(|r| r.identifier_type.contains("gene"))
            .map(|r| r.identifier_value.to_uppercase())
            .collect();

        let conn = self.conn.lock().expect("network store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, components, components_genesymbols, stoichiometry,
                    sources, \"references\", identifiers
             FROM complexes
             ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_complex)?;

        let mut matching = Vec::new();
        for row in rows {
            let entry = row?;
            let has_accession = entry
                .components
                .iter()
                .any(|c| accessions.contains(&c.as_str()));
            let has_gene = entry
                .components_genesymbols
                .iter()
                .any(|g| gene_symbols.contains(&g.trim().to_uppercase()));
            if has_accession || has_gene {
                matching.push(entry);
            }
        }
        Ok(matching)
    }

    /// Enzyme-substrate relationships touching any resolved identifier.
    pub fn enzyme_substrate(
        &self,
        identifiers: &[IdentifierRecord],
    ) -> StorageResult<Vec<EnzSub>> {
        let keys = match_keys(identifiers);
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let vars = repeat_vars(keys.len());
        let sql = format!(
            "SELECT id, enzyme, enzyme_genesymbol, substrate, substrate_genesymbol,
                    isoforms, residue_type, residue_offset, modification,
                    sources, \"references\", curation_effort, ncbi_tax_id
             FROM enzsub
             WHERE lower(enzyme) IN ({vars})
                OR lower(substrate) IN ({vars})
                OR lower(enzyme_genesymbol) IN ({vars})
                OR lower(substrate_genesymbol) IN ({vars})
             ORDER BY id",
        );
        let conn = self.conn.lock().expect("network store mutex poisoned");
        let mut stmt = conn.prepare(&sql)?;
        let bound: Vec<&str> = keys
            .iter()
            .cycle()
            .take(keys.len() * 4)
            .map(String::as_str)
            .collect();
        let rows = stmt.query_map(rusqlite::params_from_iter(bound), |row| {
            Ok(EnzSub {
                id: row.get(0)?,
                enzyme: row.get(1)?,
                enzyme_genesymbol: row.get(2)?,
                substrate: row.get(3)?,
                substrate_genesymbol: row.get(4)?,
                isoforms: row.get(5)?,
                residue_type: row.get(6)?,
                residue_offset: row.get(7)?,
                modification: row.get(8)?,
                sources: json_list(row.get(9)?),
                references: row.get(10)?,
                curation_effort: row.get(11)?,
                ncbi_tax_id: row.get(12)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Execute an arbitrary read-only SQL statement and return rows as JSON
    /// objects keyed by column name.
    ///
    /// The gate is a prefix check only: it does not parse the SQL and
    /// cannot reject semantically destructive reads.
    pub fn execute_read_only(&self, sql: &str) -> StorageResult<Vec<Map<String, Value>>> {
        if !sql.trim().to_uppercase().starts_with("SELECT") {
            return Err(StorageError::NotReadOnly);
        }
        let conn = self.conn.lock().expect("network store mutex poisoned");
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut object = Map::new();
            for (i, name) in columns.iter().enumerate() {
                object.insert(name.clone(), value_ref_to_json(row.get_ref(i)?));
            }
            out.push(object);
        }
        Ok(out)
    }

    #[cfg(test)]
    pub(crate) fn raw_batch(&self, sql: &str) -> StorageResult<()> {
        let conn = self.conn.lock().expect("network store mutex poisoned");
        conn.execute_batch(sql)?;
        Ok(())
    }
}

#[async_trait]
impl IdentifierLookup for NetworkStore {
    async fn search_identifiers(
        &self,
        terms: &[String],
        limit_per_term: usize,
        species: &str,
    ) -> StorageResult<Vec<IdentifierRecord>> {
        self.search_identifiers_multi(terms, limit_per_term, species)
    }
}

/// Lower-cased match keys for a resolved identifier set: accessions and
/// identifier values, deduplicated while preserving order.
fn match_keys(identifiers: &[IdentifierRecord]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for record in identifiers {
        for key in [&record.uniprot_accession, &record.identifier_value] {
            let lowered = key.to_lowercase();
            if !lowered.is_empty() && !keys.contains(&lowered) {
                keys.push(lowered);
            }
        }
    }
    keys
}

fn repeat_vars(count: usize) -> String {
    let mut vars = "?,".repeat(count);
    vars.pop();
    vars
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Parse a JSON-array column into a string list; NULL becomes empty.
fn json_list(raw: Option<String>) -> Vec<String> {
    raw.and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

fn row_to_interaction(row: &Row<'_>) -> rusqlite::Result<Interaction> {
    Ok(Interaction {
        id: row.get(0)?,
        source: row.get(1)?,
        target: row.get(2)?,
        source_genesymbol: row.get(3)?,
        target_genesymbol: row.get(4)?,
        is_directed: row.get(5)?,
        is_stimulation: row.get(6)?,
        is_inhibition: row.get(7)?,
        consensus_direction: row.get(8)?,
        consensus_stimulation: row.get(9)?,
        consensus_inhibition: row.get(10)?,
        sources: json_list(row.get(11)?),
        references: row.get(12)?,
        interaction_type: row.get(13)?,
        curation_effort: row.get(14)?,
        ncbi_tax_id_source: row.get(15)?,
        entity_type_source: row.get(16)?,
        ncbi_tax_id_target: row.get(17)?,
        entity_type_target: row.get(18)?,
    })
}

fn row_to_complex(row: &Row<'_>) -> rusqlite::Result<ComplexEntry> {
    Ok(ComplexEntry {
        id: row.get(0)?,
        name: row.get(1)?,
        components: json_list(row.get(2)?),
        components_genesymbols: json_list(row.get(3)?),
        stoichiometry: row.get(4)?,
        sources: json_list(row.get(5)?),
        references: row.get(6)?,
        identifiers: row.get(7)?,
    })
}

fn value_ref_to_json(value: rusqlite::types::ValueRef<'_>) -> Value {
    use rusqlite::types::ValueRef;
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}
