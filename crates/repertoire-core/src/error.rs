use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A recording with the same (title, catalog number, label) or the same
    /// Discogs ID is already catalogued.
    #[error("duplicate recording: {title:?} (catalog number {catalog_number:?})")]
    DuplicateRecording {
        title: String,
        catalog_number: Option<String>,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Returns `true` for the rejected-duplicate condition of `add_recording`.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateRecording { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
