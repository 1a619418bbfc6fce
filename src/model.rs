//! Wire-shaped domain records shared by the storage backends, the query
//! layer, and the HTTP/MCP surfaces.
//!
//! Field names serialize in camelCase to match the JSON payloads the
//! browsing front end consumes.

use serde::{Deserialize, Serialize};

/// One row of the identifier-mapping table: an external identifier string
/// mapped to a canonical UniProt accession, scoped to a species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierRecord {
    pub uniprot_accession: String,
    pub identifier_value: String,
    pub identifier_type: String,
    pub taxon_id: String,
}

/// A protein-protein (or regulatory) interaction edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: i64,
    pub source: Option<String>,
    pub target: Option<String>,
    pub source_genesymbol: Option<String>,
    pub target_genesymbol: Option<String>,
    pub is_directed: Option<bool>,
    pub is_stimulation: Option<bool>,
    pub is_inhibition: Option<bool>,
    pub consensus_direction: Option<bool>,
    pub consensus_stimulation: Option<bool>,
    pub consensus_inhibition: Option<bool>,
    pub sources: Vec<String>,
    pub references: Option<String>,
    #[serde(rename = "type")]
    pub interaction_type: Option<String>,
    pub curation_effort: Option<i64>,
    pub ncbi_tax_id_source: Option<i64>,
    pub entity_type_source: Option<String>,
    pub ncbi_tax_id_target: Option<i64>,
    pub entity_type_target: Option<String>,
}

/// A functional annotation attached to a protein or other entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: i64,
    pub uniprot: Option<String>,
    pub genesymbol: Option<String>,
    pub entity_type: Option<String>,
    pub source: Option<String>,
    pub label: Option<String>,
    pub value: Option<String>,
    pub record_id: Option<i64>,
}

/// An intercellular-communication role assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntercellEntry {
    pub id: i64,
    pub category: Option<String>,
    pub parent: Option<String>,
    pub database: Option<String>,
    pub scope: Option<String>,
    pub aspect: Option<String>,
    pub source: Option<String>,
    pub uniprot: Option<String>,
    pub genesymbol: Option<String>,
    pub entity_type: Option<String>,
    pub consensus_score: Option<i64>,
    pub transmitter: Option<bool>,
    pub receiver: Option<bool>,
    pub secreted: Option<bool>,
    pub plasma_membrane_transmembrane: Option<bool>,
    pub plasma_membrane_peripheral: Option<bool>,
}

/// A protein complex with its member components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexEntry {
    pub id: i64,
    pub name: Option<String>,
    pub components: Vec<String>,
    pub components_genesymbols: Vec<String>,
    pub stoichiometry: Option<String>,
    pub sources: Vec<String>,
    pub references: Option<String>,
    pub identifiers: Option<String>,
}

/// An enzyme-substrate relationship (e.g. a phosphorylation site).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnzSub {
    pub id: i64,
    pub enzyme: Option<String>,
    pub enzyme_genesymbol: Option<String>,
    pub substrate: Option<String>,
    pub substrate_genesymbol: Option<String>,
    pub isoforms: Option<String>,
    pub residue_type: Option<String>,
    pub residue_offset: Option<i64>,
    pub modification: Option<String>,
    pub sources: Vec<String>,
    pub references: Option<String>,
    pub curation_effort: Option<i64>,
    pub ncbi_tax_id: Option<i64>,
}

// ── Metabolomics ────────────────────────────────────────────────────────

/// A canonical compound structure with its molecular properties and flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundSummary {
    pub canonical_id: String,
    pub canonical_smiles: String,
    pub inchikey: Option<String>,
    pub formula: Option<String>,
    pub molecular_weight: Option<f64>,
    pub exact_mass: Option<f64>,
    pub logp: Option<f64>,
    pub hbd: Option<i64>,
    pub hba: Option<i64>,
    pub tpsa: Option<f64>,
    pub is_drug: Option<bool>,
    pub is_lipid: Option<bool>,
    pub is_metabolite: Option<bool>,
}

/// One external identifier attached to a compound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundIdentifier {
    #[serde(rename = "type")]
    pub identifier_type: String,
    pub value: String,
}

/// Full compound detail: summary plus all known identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundDetail {
    #[serde(flatten)]
    pub summary: CompoundSummary,
    pub identifiers: Vec<CompoundIdentifier>,
}

/// A similarity-search hit: summary plus the Tanimoto score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundSimilarityHit {
    #[serde(flatten)]
    pub summary: CompoundSummary,
    pub similarity: f64,
}

/// An autocomplete suggestion from the compound identifier index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundSuggestion {
    pub label: String,
    pub value: String,
    #[serde(rename = "type")]
    pub identifier_type: String,
    pub compound_id: String,
    pub canonical_id: String,
}

/// A PubMed publication summary as returned by NCBI ESummary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubMedPublication {
    pub pmid: String,
    pub title: Option<String>,
    pub journal: Option<String>,
    pub publication_date: Option<String>,
    pub authors: Vec<String>,
    pub doi: Option<String>,
    pub url: String,
}

/// Literature payload for a compound: raw PMIDs plus resolved summaries.
///
/// `publications` may be empty when the ESummary call fails; the PMID list
/// is still returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundLiterature {
    pub pubmed_ids: Vec<String>,
    pub publications: Vec<PubMedPublication>,
}
