use std::env;
use std::path::PathBuf;

use crate::error::LoaderError;

/// Environment variable holding the Cosmos DB (Mongo API) connection string.
pub const CONNECTION_URI_VAR: &str = "COSMOS_DB_URI";

pub const DEFAULT_DATABASE_NAME: &str = "chatlog_db";
pub const DEFAULT_COLLECTION_NAME: &str = "chatlog_collection";
pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_SOURCE_PATH: &str = "DATA/chatlog.json";

/// Everything a load run needs, resolved up front. Only the connection URI
/// comes from the environment; the rest defaults to the values the original
/// migration used and can be overridden from the command line.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub connection_uri: String,
    pub database_name: String,
    pub collection_name: String,
    pub chunk_size: usize,
    pub source_path: PathBuf,
}

impl LoaderConfig {
    /// Build a config with all defaults around the given connection URI.
    pub fn with_uri(connection_uri: impl Into<String>) -> Self {
        LoaderConfig {
            connection_uri: connection_uri.into(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
        }
    }

    /// Read the connection URI from `COSMOS_DB_URI` and default the rest.
    pub fn from_env() -> Result<Self, LoaderError> {
        let connection_uri = env::var(CONNECTION_URI_VAR)
            .map_err(|_| LoaderError::Config(format!("{} is not set", CONNECTION_URI_VAR)))?;
        Ok(Self::with_uri(connection_uri))
    }
}
