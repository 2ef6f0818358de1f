//! Error types for settings and registry persistence.

use std::path::PathBuf;

/// Result type alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while loading or persisting settings.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Reading or writing a settings file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The parent directory of the per-user settings file could not be created.
    #[error("failed to create settings directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary file could not be renamed over the settings file.
    #[error("failed to replace settings file '{path}': {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing requires an application key to name the per-user file.
    #[error("no application key set")]
    NoApplicationKey,

    /// No per-user directory is configured.
    #[error("no user settings directory configured")]
    NoUserDirectory,

    /// The native registry backend reported a failure.
    #[error("native registry error: {0}")]
    Native(String),

    /// Binary stream encoding or decoding failed.
    #[error("settings stream error: {0}")]
    Encoding(#[from] bincode::Error),
}

impl RegistryError {
    /// Create an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error indicates a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
