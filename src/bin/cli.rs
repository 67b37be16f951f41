//! fsdb CLI
//!
//! Command-line interface for inspecting and editing an fsdb directory.

use clap::{Parser, Subcommand};
use fsdb::{Config, Store, WriteMode};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// fsdb CLI
#[derive(Parser, Debug)]
#[command(name = "fsdb-cli")]
#[command(about = "CLI for the fsdb filesystem key-value store")]
#[command(version)]
struct Args {
    /// Store root directory
    #[arg(short, long, default_value = "./fsdb_data")]
    root: String,

    /// Rewrite key files in place instead of write-then-rename
    #[arg(long)]
    in_place: bool,

    /// fsync key files after each write
    #[arg(long)]
    sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a key's value as JSON
    Get {
        /// Collection name
        collection: String,

        /// Key name
        key: String,
    },

    /// Store a value (parsed as JSON, otherwise stored as a string)
    Put {
        /// Collection name
        collection: String,

        /// Key name
        key: String,

        /// The value to store
        value: String,
    },

    /// Delete a key
    Del {
        /// Collection name
        collection: String,

        /// Key name
        key: String,
    },

    /// List collections, or the keys of one collection
    Ls {
        /// Collection to list keys of
        collection: Option<String>,
    },

    /// Dump the loaded store tree for debugging
    Dump,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,fsdb=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> fsdb::Result<()> {
    let write_mode = if args.in_place {
        WriteMode::InPlace
    } else {
        WriteMode::Atomic
    };

    let config = Config::builder()
        .root(&args.root)
        .write_mode(write_mode)
        .sync_writes(args.sync)
        .build();

    let store = Store::open(config)?;
    tracing::debug!("Opened store at {}", store.root().display());

    match args.command {
        Commands::Get { collection, key } => {
            let value = store.read_value(&collection, &key)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Put { collection, key, value } => {
            let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            store.write(&collection, &key, &value)?;
        }
        Commands::Del { collection, key } => {
            store.delete(&collection, &key)?;
        }
        Commands::Ls { collection } => {
            let mut names = match collection {
                Some(collection) => store.list(&collection),
                None => store.collections(),
            };
            names.sort();
            for name in names {
                println!("{}", name);
            }
        }
        Commands::Dump => {
            println!("{}", store);
        }
    }

    Ok(())
}
