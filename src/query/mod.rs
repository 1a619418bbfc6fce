//! Query layer: identifier resolution and multi-dataset fan-out
//!
//! Free-text queries are parsed into terms, resolved to UniProt
//! accessions through the identifier-mapping table, and the resolved set
//! is dispatched to the requested datasets.

mod fanout;
mod resolve;
mod types;

pub use fanout::{fan_out, query_dataset, Dataset, DatasetRows};
pub use resolve::{parse_queries, resolve_identifiers};
pub use types::{
    MatchMode, QueryTerm, ResolvedQuery, TermResolution, DEFAULT_SPECIES, MATCHES_PER_TERM,
};
