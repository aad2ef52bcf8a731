use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the storage layer. Decoders stay total where a
/// sentinel suffices; anything that would read past a buffer or
/// misidentify the file shows up here instead of panicking.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file is not a database: '{}'", path.display())]
    NotADatabase { path: PathBuf },

    #[error("unsupported text encoding code {code}")]
    UnsupportedEncoding { code: u32 },

    #[error("database disk image is malformed: {detail}")]
    Corrupt { detail: String },
}

impl StorageError {
    pub fn corrupt(detail: impl Into<String>) -> StorageError {
        StorageError::Corrupt {
            detail: detail.into(),
        }
    }
}
