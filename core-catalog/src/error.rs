//! Catalog error types

use core_extract::ExtractError;
use core_fetch::FetchError;
use thiserror::Error;

/// Errors from the catalog services.
///
/// Extraction finding nothing is not represented here; empty results are
/// normal outcomes of the service calls.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Rejected before any I/O.
    #[error("Search query cannot be empty")]
    EmptyQuery,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl CatalogError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch(err) => err.is_transient(),
            Self::EmptyQuery | Self::Extract(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
