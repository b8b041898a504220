use thiserror::Error;

use crate::segment::SegmentId;

/// Main error type for field data operations
#[derive(Error, Debug)]
pub enum FieldDataError {
    #[error("Failed to load field data for [{field}] in {segment}: {source}")]
    LoadFailure {
        field: String,
        segment: SegmentId,
        #[source]
        source: std::io::Error,
    },

    #[error("Sort mode [{mode}] is not supported for field [{field}]")]
    UnsupportedSortMode { field: String, mode: String },

    #[error("Invalid field data settings: {0}")]
    InvalidSettings(String),

    #[error("Settings parse error: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Result type alias for field data operations
pub type Result<T> = std::result::Result<T, FieldDataError>;

impl FieldDataError {
    pub(crate) fn load_failure(field: &str, segment: SegmentId, source: std::io::Error) -> Self {
        FieldDataError::LoadFailure {
            field: field.to_string(),
            segment,
            source,
        }
    }

    /// Check if a fresh attempt could succeed once the underlying segment recovers.
    pub fn is_retriable(&self) -> bool {
        matches!(self, FieldDataError::LoadFailure { .. })
    }
}
