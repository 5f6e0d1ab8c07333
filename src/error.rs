use std::path::PathBuf;
use thiserror::Error;

/// Errors raised during a bulk load run.
///
/// Nothing here is caught or retried internally; every variant aborts the
/// whole run. Documents inserted before the failure stay in the collection.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Connection string missing or rejected by the driver
    #[error("configuration error: {0}")]
    Config(String),

    /// Source file could not be read
    #[error("failed to read source file {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file is not valid JSON
    #[error("source file {path} is not valid JSON: {source}")]
    SourceParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Source file has no top-level `chatlog` array
    #[error("source file {path} has no top-level `chatlog` array")]
    MissingChatlogKey { path: PathBuf },

    /// A chat record is missing its required `messages` array
    #[error("chat record {index} is missing the required `messages` array")]
    MissingMessages { index: usize },

    /// A message element could not be decoded
    #[error("chat record {index} has a malformed message: {source}")]
    MalformedMessage {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Chunk size contract violation
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    /// A projected record could not be encoded as a BSON document
    #[error("failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    /// The destination rejected or failed a single insert
    #[error("store write failed: {0}")]
    StoreWrite(String),

    /// The progress line could not be written
    #[error("failed to write progress output: {0}")]
    Io(#[from] std::io::Error),
}
