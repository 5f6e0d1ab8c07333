use log::info;
use mongodb::bson::Document;
use mongodb::sync::{Client, Collection};

use crate::config::LoaderConfig;
use crate::error::LoaderError;

/// Destination for chat documents. The loader issues one `insert_one` call
/// per chat record; there is no batch or upsert path.
pub trait ChatlogStore {
    fn insert_one(&mut self, document: Document) -> Result<(), LoaderError>;
}

/// Cosmos DB (Mongo API) backed store. The client is dropped with the store,
/// which releases its connections whether the run succeeded or failed.
pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connect to the configured endpoint and resolve the target collection.
    pub fn connect(config: &LoaderConfig) -> Result<Self, LoaderError> {
        let client = Client::with_uri_str(&config.connection_uri)
            .map_err(|err| LoaderError::Config(format!("invalid connection URI: {}", err)))?;
        let collection = client
            .database(&config.database_name)
            .collection::<Document>(&config.collection_name);
        info!(
            "Connected to {}/{}",
            config.database_name, config.collection_name
        );
        Ok(MongoStore { collection })
    }
}

impl ChatlogStore for MongoStore {
    fn insert_one(&mut self, document: Document) -> Result<(), LoaderError> {
        self.collection
            .insert_one(document)
            .run()
            .map_err(|err| LoaderError::StoreWrite(err.to_string()))?;
        Ok(())
    }
}
