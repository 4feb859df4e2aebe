use std::path::{Path, PathBuf};

/// Result alias that carries the custom [`LightingError`] type.
pub type Result<T> = std::result::Result<T, LightingError>;

/// Common error type for the core crate.
///
/// The first five variants are per-item conditions: the batch driver records
/// them in the report and moves on to the next file or song.
#[derive(Debug, thiserror::Error)]
pub enum LightingError {
    /// No time points were available to drive generation.
    #[error("no time points available in {}", path.display())]
    EmptySource { path: PathBuf },
    /// The audio asset could not be opened or decoded.
    #[error("failed to decode audio {}: {reason}", path.display())]
    AudioDecode { path: PathBuf, reason: String },
    /// The difficulty file is not valid JSON or lacks the expected shape.
    #[error("malformed map document: {0}")]
    MalformedDocument(String),
    /// An expected difficulty file or audio asset is absent.
    #[error("missing asset {}", path.display())]
    MissingAsset { path: PathBuf },
    /// Reading or writing one difficulty file failed at the OS level.
    #[error("i/o error on {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Configuration values that would make generation impossible.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl LightingError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Attaches the file path to an I/O error raised while handling it.
    pub fn file_io(path: &Path, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Creates a [`LightingError::MalformedDocument`] from any message.
    pub fn malformed<T: Into<String>>(msg: T) -> Self {
        Self::MalformedDocument(msg.into())
    }
}
