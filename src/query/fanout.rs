//! Multi-dataset fan-out
//!
//! One resolved identifier set is dispatched to each requested dataset
//! independently. A failure in one dataset never suppresses the results
//! of another; each dataset carries its own `Result`.

use super::types::ResolvedQuery;
use crate::model::{Annotation, ComplexEntry, EnzSub, Interaction, IntercellEntry};
use crate::storage::{NetworkStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five datasets a query can fan out across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Interactions,
    Annotations,
    Intercell,
    Complexes,
    EnzSub,
}

impl Dataset {
    pub const ALL: [Dataset; 5] = [
        Dataset::Interactions,
        Dataset::Annotations,
        Dataset::Intercell,
        Dataset::Complexes,
        Dataset::EnzSub,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Interactions => "interactions",
            Dataset::Annotations => "annotations",
            Dataset::Intercell => "intercell",
            Dataset::Complexes => "complexes",
            Dataset::EnzSub => "enzsub",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "interactions" => Ok(Dataset::Interactions),
            "annotations" => Ok(Dataset::Annotations),
            "intercell" => Ok(Dataset::Intercell),
            "complexes" => Ok(Dataset::Complexes),
            "enzsub" | "enz_sub" => Ok(Dataset::EnzSub),
            other => Err(format!("unknown dataset: {other}")),
        }
    }
}

/// Rows from one dataset, tagged with the dataset's wrapper key.
///
/// Serializing a variant produces the wrapper object the front end
/// expects, e.g. `{"interactions": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DatasetRows {
    #[serde(rename = "interactions")]
    Interactions(Vec<Interaction>),
    #[serde(rename = "annotations")]
    Annotations(Vec<Annotation>),
    #[serde(rename = "intercellEntries")]
    Intercell(Vec<IntercellEntry>),
    #[serde(rename = "complexEntries")]
    Complexes(Vec<ComplexEntry>),
    #[serde(rename = "enzSubData")]
    EnzSub(Vec<EnzSub>),
}

impl DatasetRows {
    pub fn len(&self) -> usize {
        match self {
            DatasetRows::Interactions(rows) => rows.len(),
            DatasetRows::Annotations(rows) => rows.len(),
            DatasetRows::Intercell(rows) => rows.len(),
            DatasetRows::Complexes(rows) => rows.len(),
            DatasetRows::EnzSub(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run one dataset query against the resolved identifier set.
pub fn query_dataset(
    store: &NetworkStore,
    dataset: Dataset,
    resolved: &ResolvedQuery,
) -> StorageResult<DatasetRows> {
    let identifiers = &resolved.resolved_identifiers;
    match dataset {
        Dataset::Interactions => store
            .protein_neighbors(identifiers)
            .map(DatasetRows::Interactions),
        Dataset::Annotations => store
            .protein_annotations(identifiers)
            .map(DatasetRows::Annotations),
        Dataset::Intercell => store
            .intercell_roles(identifiers)
            .map(DatasetRows::Intercell),
        Dataset::Complexes => store
            .complexes_containing(identifiers)
            .map(DatasetRows::Complexes),
        Dataset::EnzSub => store
            .enzyme_substrate(identifiers)
            .map(DatasetRows::EnzSub),
    }
}

/// Fan one resolved query out across several datasets.
///
/// Datasets are queried in the order given; each result is isolated so a
/// failing dataset reports its own error alongside the others' rows.
pub fn fan_out(
    store: &NetworkStore,
    datasets: &[Dataset],
    resolved: &ResolvedQuery,
) -> Vec<(Dataset, StorageResult<DatasetRows>)> {
    datasets
        .iter()
        .map(|&dataset| (dataset, query_dataset(store, dataset, resolved)))
        .collect()
}
