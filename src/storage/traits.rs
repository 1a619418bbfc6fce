//! Storage error types and the identifier-lookup seam

use crate::model::IdentifierRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Only read-only queries (starting with SELECT) are allowed.")]
    NotReadOnly,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The batched identifier search the resolver depends on.
///
/// Kept as a trait so resolution logic can be exercised against a mock
/// without a database. Implementations must be thread-safe.
#[async_trait]
pub trait IdentifierLookup: Send + Sync {
    /// Search the identifier-mapping table for several terms in one call.
    ///
    /// Each term is matched as a case-insensitive prefix against
    /// `identifier_value`, scoped to `species`, returning at most
    /// `limit_per_term` records per term. Result order follows term order,
    /// then database return order within a term.
    async fn search_identifiers(
        &self,
        terms: &[String],
        limit_per_term: usize,
        species: &str,
    ) -> StorageResult<Vec<IdentifierRecord>>;
}
