//! Extraction error types

use scraper::error::SelectorErrorKind;
use thiserror::Error;

/// Failures while compiling the selectors or patterns an extractor runs.
///
/// An extraction that simply finds nothing in the markup is not an error;
/// those surface as `None` or empty collections.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Selector(#[from] SelectorErrorKind<'static>),

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
