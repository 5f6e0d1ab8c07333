use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;

use chatlog_loader::config::{self, LoaderConfig};
use chatlog_loader::loader;
use chatlog_loader::store::MongoStore;

#[derive(Parser)]
#[command(name = "chatlog-loader")]
#[command(about = "Bulk chatlog migration - loads a chatlog JSON export into Cosmos DB (Mongo API)")]
struct Cli {
    /// Path to the chatlog JSON export
    #[arg(default_value = config::DEFAULT_SOURCE_PATH)]
    source: PathBuf,

    /// Records per chunk
    #[arg(long, default_value_t = config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Target database name
    #[arg(long, default_value = config::DEFAULT_DATABASE_NAME)]
    database: String,

    /// Target collection name
    #[arg(long, default_value = config::DEFAULT_COLLECTION_NAME)]
    collection: String,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let mut config = LoaderConfig::from_env().context("Failed to load configuration")?;
    config.source_path = cli.source;
    config.chunk_size = cli.chunk_size;
    config.database_name = cli.database;
    config.collection_name = cli.collection;

    let mut store = MongoStore::connect(&config).with_context(|| {
        format!(
            "Failed to connect to {}/{}",
            config.database_name, config.collection_name
        )
    })?;

    let mut stdout = io::stdout();
    let stats = loader::load_chatlog(&config, &mut store, &mut stdout).with_context(|| {
        format!(
            "Failed to load chatlog from {}",
            config.source_path.display()
        )
    })?;

    eprintln!(
        "Inserted {} chat records in {} chunks",
        stats.records_inserted, stats.chunks_completed
    );

    Ok(())
}
