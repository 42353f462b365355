//! Error types for ousync-sync.

use std::path::PathBuf;

use thiserror::Error;

use ousync_directory::DirectoryError;

/// Errors that end a sync run or its export.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The directory could not be enumerated at all.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// CSV serialization failed while exporting records.
    #[error("failed to export records to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Export`].
pub(crate) fn export_err(path: impl Into<PathBuf>, source: csv::Error) -> SyncError {
    SyncError::Export {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
