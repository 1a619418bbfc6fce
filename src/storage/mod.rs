//! Storage backends for omnidex
//!
//! Two independent SQLite-backed read stores: `NetworkStore` for the
//! interaction/annotation network database and `MetaboStore` for the
//! metabolomics compound database.

mod metabo;
mod network;
mod traits;

pub use metabo::{MetaboFilters, MetaboStore};
pub use network::NetworkStore;
pub use traits::{IdentifierLookup, StorageError, StorageResult};
