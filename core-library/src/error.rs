use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: i64 },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("A playlist named '{0}' already exists")]
    DuplicateName(String),

    #[error("Track is already in the playlist")]
    DuplicateTrack,

    #[error("The favorites playlist cannot be renamed or deleted")]
    FavoritesImmutable,

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
