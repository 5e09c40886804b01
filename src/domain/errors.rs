//! Domain errors for the meta-analysis engine.

use thiserror::Error;

/// Domain-level errors that can occur while normalizing, aggregating,
/// ranking or composing.
///
/// Data-integrity variants (`MissingUnit`, `UnknownMercenary`, `MissingHold`)
/// are fatal for the single call that raised them and are always surfaced to
/// the caller.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Unit not found in catalog: {0}")]
    MissingUnit(String),

    #[error("Board has no entry to anchor on")]
    NoAnchor,

    #[error("Mercenary not found in catalog: {0}")]
    UnknownMercenary(String),

    #[error("Hold {id} referenced by a send is missing from table {table}")]
    MissingHold { table: String, id: i64 },

    #[error("Wave {0} has no bounty and cannot be ranked")]
    UnsupportedWave(u8),

    #[error("Invalid build entry: {0}")]
    InvalidBuildEntry(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Ingestion failed: {0}")]
    IngestionFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Returns true for referential failures between catalog, holds and sends.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Self::MissingUnit(_) | Self::UnknownMercenary(_) | Self::MissingHold { .. }
        )
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
