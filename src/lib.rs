//! omnidex: Molecular Network Exploration Service
//!
//! A read-only query service over a molecular interaction network and a
//! metabolomics compound database, exposed over HTTP and the Model
//! Context Protocol.
//!
//! # Core Concepts
//!
//! - **Identifier resolution**: free-text terms (gene symbols, UniProt
//!   accessions, external IDs) resolve to canonical accessions through
//!   the identifier-mapping table
//! - **Datasets**: interactions, annotations, intercell roles, complexes
//!   and enzyme-substrate relationships, queried independently from one
//!   resolved identifier set
//! - **Compound search**: text, substructure and similarity modes over
//!   canonical SMILES with molecular-property filters
//! - **SQL gateway**: validated read-only SELECT access for LLM clients
//!
//! # Example
//!
//! ```
//! use omnidex::storage::NetworkStore;
//!
//! let store = NetworkStore::open_in_memory().unwrap();
//! // Store is ready for use
//! ```

mod model;

pub mod export;
pub mod mcp;
pub mod pubmed;
pub mod query;
pub mod server;
pub mod sqltool;
pub mod storage;

pub use model::{
    Annotation, ComplexEntry, CompoundDetail, CompoundIdentifier, CompoundLiterature,
    CompoundSimilarityHit, CompoundSuggestion, CompoundSummary, EnzSub, IdentifierRecord,
    Interaction, IntercellEntry, PubMedPublication,
};
pub use query::{Dataset, DatasetRows, MatchMode, ResolvedQuery, TermResolution};
pub use storage::{
    IdentifierLookup, MetaboFilters, MetaboStore, NetworkStore, StorageError, StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
