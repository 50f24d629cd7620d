use thiserror::Error;

/// Errors surfaced by an extraction run.
///
/// Only [`ExtractError::InvalidArchive`] aborts a run.
/// [`ExtractError::Decode`] is recovered per entry inside the pipeline and
/// [`ExtractError::NoCodeFilesFound`] is an informational outcome.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("No code files found in the archive ({total_entries} entries scanned)")]
    NoCodeFilesFound { total_entries: usize },

    #[error("Failed to read {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl ExtractError {
    pub fn decode(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ExtractError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error ends the whole run rather than a single entry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractError::InvalidArchive(_))
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;
