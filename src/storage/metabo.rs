//! SQLite backend for the metabolomics compound database
//!
//! Text search resolves through the compound identifier index; structure
//! searches (substructure, similarity) operate on the canonical SMILES.
//! Substructure is SMILES containment and similarity is Tanimoto over
//! hashed-trigram fingerprints, both approximations of a cheminformatics
//! toolkit. An implausible SMILES degrades to a text search.

use super::traits::StorageResult;
use crate::model::{
    CompoundDetail, CompoundIdentifier, CompoundSimilarityHit, CompoundSuggestion,
    CompoundSummary,
};
use rusqlite::{params, Connection, Row};
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::path::Path;
use std::sync::Mutex;

/// Number of 64-bit words in a SMILES fingerprint (512 bits).
const FINGERPRINT_WORDS: usize = 8;

/// Molecular-property filters applied to every search mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaboFilters {
    pub molecular_weight_min: Option<f64>,
    pub molecular_weight_max: Option<f64>,
    pub logp_min: Option<f64>,
    pub logp_max: Option<f64>,
    pub is_drug: Option<bool>,
    pub is_lipid: Option<bool>,
    pub is_metabolite: Option<bool>,
    /// Lipinski rule of five: MW <= 500, logP <= 5, HBD <= 5, HBA <= 10.
    pub lipinski_compliant: bool,
}

impl MetaboFilters {
    fn accepts(&self, summary: &CompoundSummary) -> bool {
        let in_range = |value: Option<f64>, min: Option<f64>, max: Option<f64>| {
            if min.is_none() && max.is_none() {
                return true;
            }
            match value {
                Some(v) => min.is_none_or(|m| v >= m) && max.is_none_or(|m| v <= m),
                None => false,
            }
        };
        if !in_range(
            summary.molecular_weight,
            self.molecular_weight_min,
            self.molecular_weight_max,
        ) {
            return false;
        }
        if !in_range(summary.logp, self.logp_min, self.logp_max) {
            return false;
        }
        let flag_ok = |want: Option<bool>, have: Option<bool>| match want {
            Some(w) => have == Some(w),
            None => true,
        };
        if !flag_ok(self.is_drug, summary.is_drug)
            || !flag_ok(self.is_lipid, summary.is_lipid)
            || !flag_ok(self.is_metabolite, summary.is_metabolite)
        {
            return false;
        }
        if self.lipinski_compliant {
            let lipinski = summary.molecular_weight.is_some_and(|v| v <= 500.0)
                && summary.logp.is_some_and(|v| v <= 5.0)
                && summary.hbd.is_some_and(|v| v <= 5)
                && summary.hba.is_some_and(|v| v <= 10);
            if !lipinski {
                return false;
            }
        }
        true
    }
}

/// SQLite-backed metabolomics store.
pub struct MetaboStore {
    conn: Mutex<Connection>,
}

impl MetaboStore {
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
            CREATE TABLE IF NOT EXISTS canonical_structures (
                canonical_id INTEGER PRIMARY KEY,
                canonical_smiles TEXT NOT NULL,
                inchikey TEXT,
                formula TEXT,
                molecular_weight REAL,
                exact_mass REAL,
                logp REAL,
                hbd INTEGER,
                hba INTEGER,
                tpsa REAL
            );

            CREATE TABLE IF NOT EXISTS compounds (
                compound_id INTEGER PRIMARY KEY,
                canonical_id INTEGER,
                is_drug INTEGER,
                is_lipid INTEGER,
                is_metabolite INTEGER,
                FOREIGN KEY (canonical_id) REFERENCES canonical_structures(canonical_id)
            );

            CREATE TABLE IF NOT EXISTS compound_identifiers (
                id INTEGER PRIMARY KEY,
                compound_id INTEGER NOT NULL,
                identifier_type TEXT NOT NULL,
                identifier_value TEXT NOT NULL,
                FOREIGN KEY (compound_id) REFERENCES compounds(compound_id)
            );
            CREATE INDEX IF NOT EXISTS idx_compound_identifiers_value
                ON compound_identifiers(identifier_value);

            CREATE TABLE IF NOT EXISTS compound_publications (
                id INTEGER PRIMARY KEY,
                canonical_id INTEGER NOT NULL,
                pmid TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_compound_publications_canonical
                ON compound_publications(canonical_id);
            "#,
        )?;
        Ok(())
    }

    /// Identifier-prefix autocomplete over the compound identifier index.
    pub fn autocomplete(
        &self,
        query: &str,
        limit: usize,
    ) -> StorageResult<Vec<CompoundSuggestion>> {
        let conn = self.conn.lock().expect("metabo store mutex poisoned");
        let mut stmt = conn.prepare_cached(
            "SELECT ci.identifier_value, ci.identifier_type, ci.compound_id, c.canonical_id
             FROM compound_identifiers ci
             LEFT JOIN compounds c ON ci.compound_id = c.compound_id
             WHERE ci.identifier_value LIKE ?1 ESCAPE '\\'
             ORDER BY ci.identifier_value
             LIMIT ?2",
        )?;
        let pattern = format!("{}%", escape_like(query));
        let rows = stmt.query_map(params![pattern, limit as i64], |row| {
            let value: String = row.get(0)?;
            let canonical: Option<i64> = row.get(3)?;
            Ok(CompoundSuggestion {
                label: value.clone(),
                value,
                identifier_type: row.get(1)?,
                compound_id: row.get::<_, i64>(2)?.to_string(),
                canonical_id: canonical.map(|id| id.to_string()).unwrap_or_default(),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Text search: resolve identifier prefix matches, then load the detail
    /// for each distinct canonical structure.
    pub fn search_text(
        &self,
        query: &str,
        limit: usize,
        filters: &MetaboFilters,
    ) -> StorageResult<Vec<CompoundDetail>> {
        let suggestions = self.autocomplete(query, limit)?;
        let mut seen: Vec<String> = Vec::new();
        let mut results = Vec::new();
        for suggestion in suggestions {
            if suggestion.canonical_id.is_empty() || seen.contains(&suggestion.canonical_id) {
                continue;
            }
            seen.push(suggestion.canonical_id.clone());
            if let Some(detail) = self.compound_detail(&suggestion.canonical_id)? {
                if filters.accepts(&detail.summary) {
                    results.push(detail);
                }
            }
        }
        Ok(results)
    }

    /// Substructure search: SMILES containment over the canonical SMILES.
    ///
    /// Falls back to text search when the pattern is not a plausible SMILES.
    pub fn search_substructure(
        &self,
        smiles: &str,
        limit: usize,
        offset: usize,
        filters: &MetaboFilters,
    ) -> StorageResult<Vec<CompoundDetail>> {
        if !smiles_is_plausible(smiles) {
            return self.search_text(smiles, limit, filters);
        }
        let summaries = self.all_summaries()?;
        let mut matches: Vec<CompoundDetail> = Vec::new();
        for summary in summaries {
            if !summary.canonical_smiles.contains(smiles) || !filters.accepts(&summary) {
                continue;
            }
            if let Some(detail) = self.compound_detail(&summary.canonical_id)? {
                matches.push(detail);
            }
        }
        matches.sort_by(|a, b| {
            compare_weight(a.summary.molecular_weight, b.summary.molecular_weight)
        });
        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }

    /// Similarity search: Tanimoto over hashed-trigram SMILES fingerprints,
    /// strictly above `threshold`, ordered by descending similarity.
    ///
    /// Falls back to text search (similarity 0) when the query is not a
    /// plausible SMILES.
    pub fn search_similarity(
        &self,
        smiles: &str,
        threshold: f64,
        limit: usize,
        offset: usize,
        filters: &MetaboFilters,
    ) -> StorageResult<Vec<CompoundSimilarityHit>> {
        if !smiles_is_plausible(smiles) {
            let fallback = self.search_text(smiles, limit, filters)?;
            return Ok(fallback
                .into_iter()
                .map(|detail| CompoundSimilarityHit {
                    summary: detail.summary,
                    similarity: 0.0,
                })
                .collect());
        }
        let query_fp = smiles_fingerprint(smiles);
        let summaries = self.all_summaries()?;
        let mut hits: Vec<CompoundSimilarityHit> = Vec::new();
        for summary in summaries {
            if !filters.accepts(&summary) {
                continue;
            }
            let similarity = tanimoto(&query_fp, &smiles_fingerprint(&summary.canonical_smiles));
            if similarity > threshold {
                hits.push(CompoundSimilarityHit {
                    summary,
                    similarity,
                });
            }
        }
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(hits.into_iter().skip(offset).take(limit).collect())
    }

    /// Full detail for a canonical structure: summary plus identifiers.
    pub fn compound_detail(&self, canonical_id: &str) -> StorageResult<Option<CompoundDetail>> {
        let id: i64 = match canonical_id.parse() {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };
        let conn = self.conn.lock().expect("metabo store mutex poisoned");
        let mut stmt = conn.prepare_cached(
            "SELECT cs.canonical_id, cs.canonical_smiles, cs.inchikey, cs.formula,
                    cs.molecular_weight, cs.exact_mass, cs.logp, cs.hbd, cs.hba, cs.tpsa,
                    c.is_drug, c.is_lipid, c.is_metabolite
             FROM canonical_structures cs
             LEFT JOIN compounds c ON cs.canonical_id = c.canonical_id
             WHERE cs.canonical_id = ?1
             LIMIT 1",
        )?;
        let summary = stmt
            .query_map(params![id], row_to_summary)?
            .next()
            .transpose()?;
        let Some(summary) = summary else {
            return Ok(None);
        };

        let mut ident_stmt = conn.prepare_cached(
            "SELECT ci.identifier_type, ci.identifier_value
             FROM compound_identifiers ci
             JOIN compounds c ON ci.compound_id = c.compound_id
             WHERE c.canonical_id = ?1
             ORDER BY ci.id",
        )?;
        let identifiers = ident_stmt
            .query_map(params![id], |row| {
                Ok(CompoundIdentifier {
                    identifier_type: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(CompoundDetail {
            summary,
            identifiers,
        }))
    }

    /// PMIDs linked to a canonical structure.
    pub fn compound_publications(&self, canonical_id: &str) -> StorageResult<Vec<String>> {
        let id: i64 = match canonical_id.parse() {
            Ok(id) => id,
            Err(_) => return Ok(Vec::new()),
        };
        let conn = self.conn.lock().expect("metabo store mutex poisoned");
        let mut stmt = conn.prepare_cached(
            "SELECT pmid FROM compound_publications WHERE canonical_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![id], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn all_summaries(&self) -> StorageResult<Vec<CompoundSummary>> {
        let conn = self.conn.lock().expect("metabo store mutex poisoned");
        let mut stmt = conn.prepare_cached(
            "SELECT cs.canonical_id, cs.canonical_smiles, cs.inchikey, cs.formula,
                    cs.molecular_weight, cs.exact_mass, cs.logp, cs.hbd, cs.hba, cs.tpsa,
                    c.is_drug, c.is_lipid, c.is_metabolite
             FROM canonical_structures cs
             LEFT JOIN compounds c ON cs.canonical_id = c.canonical_id
             ORDER BY cs.canonical_id",
        )?;
        let rows = stmt.query_map([], row_to_summary)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    #[cfg(test)]
    pub(crate) fn raw_batch(&self, sql: &str) -> StorageResult<()> {
        let conn = self.conn.lock().expect("metabo store mutex poisoned");
        conn.execute_batch(sql)?;
        Ok(())
    }
}

fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<CompoundSummary> {
    Ok(CompoundSummary {
        canonical_id: row.get::<_, i64>(0)?.to_string(),
        canonical_smiles: row.get(1)?,
        inchikey: row.get(2)?,
        formula: row.get(3)?,
        molecular_weight: row.get(4)?,
        exact_mass: row.get(5)?,
        logp: row.get(6)?,
        hbd: row.get(7)?,
        hba: row.get(8)?,
        tpsa: row.get(9)?,
        is_drug: row.get(10)?,
        is_lipid: row.get(11)?,
        is_metabolite: row.get(12)?,
    })
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn compare_weight(a: Option<f64>, b: Option<f64>) -> std::cmp::Ordering {
    // NULL weights sort last
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

/// Cheap plausibility check for a SMILES string: non-empty, balanced
/// brackets, and only characters from the SMILES alphabet.
pub fn smiles_is_plausible(smiles: &str) -> bool {
    if smiles.trim().is_empty() {
        return false;
    }
    let mut parens = 0i32;
    let mut brackets = 0i32;
    for c in smiles.chars() {
        match c {
            '(' => parens += 1,
            ')' => {
                parens -= 1;
                if parens < 0 {
                    return false;
                }
            }
            '[' => brackets += 1,
            ']' => {
                brackets -= 1;
                if brackets < 0 {
                    return false;
                }
            }
            c if c.is_ascii_alphanumeric() => {}
            '=' | '#' | '@' | '+' | '-' | '/' | '\\' | '%' | '.' | ':' | '*' => {}
            _ => return false,
        }
    }
    parens == 0 && brackets == 0
}

/// 512-bit fingerprint of a SMILES string from hashed byte trigrams.
pub fn smiles_fingerprint(smiles: &str) -> [u64; FINGERPRINT_WORDS] {
    let mut fp = [0u64; FINGERPRINT_WORDS];
    let bytes = smiles.as_bytes();
    if bytes.is_empty() {
        return fp;
    }
    let window = bytes.len().min(3);
    for gram in bytes.windows(window) {
        let mut hasher = DefaultHasher::new();
        hasher.write(gram);
        let bit = (hasher.finish() % (FINGERPRINT_WORDS as u64 * 64)) as usize;
        fp[bit / 64] |= 1u64 << (bit % 64);
    }
    fp
}

/// Tanimoto coefficient between two bit fingerprints.
pub fn tanimoto(a: &[u64; FINGERPRINT_WORDS], b: &[u64; FINGERPRINT_WORDS]) -> f64 {
    let mut intersection = 0u32;
    let mut union = 0u32;
    for i in 0..FINGERPRINT_WORDS {
        intersection += (a[i] & b[i]).count_ones();
        union += (a[i] | b[i]).count_ones();
    }
    if union == 0 {
        0.0
    } else {
        f64::from(intersection) / f64::from(union)
    }
}
