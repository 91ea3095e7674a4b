//! Error types for tubelens-core.

use thiserror::Error;

/// Result alias used across the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the core crate.
///
/// Access resolution and word selection never fail; only configuration
/// loading and local storage can.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A plan catalog could not be parsed.
    #[error("Catalog parse error: {0}")]
    CatalogParse(#[from] serde_json::Error),

    /// A plan catalog parsed but is not usable.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// The local store failed to open, read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored value could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(#[from] postcard::Error),
}
