//! lexikv CLI
//!
//! Command-line interface over a snapshot-backed store.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lexikv::{Config, IterOptions, SnapshotBackend, Store, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// lexikv CLI
#[derive(Parser, Debug)]
#[command(name = "lexikv-cli")]
#[command(about = "Ordered key-value store over a snapshot file")]
#[command(version)]
struct Args {
    /// Data directory holding the snapshot file
    #[arg(short, long, default_value = "./lexikv_data")]
    data_dir: PathBuf,

    /// Store namespace
    #[arg(short, long, default_value = "lexikv")]
    namespace: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List key-value pairs in key order
    Scan {
        /// Exclusive lower bound
        #[arg(long)]
        gt: Option<String>,

        /// Inclusive lower bound
        #[arg(long)]
        gte: Option<String>,

        /// Exclusive upper bound
        #[arg(long)]
        lt: Option<String>,

        /// Inclusive upper bound
        #[arg(long)]
        lte: Option<String>,

        /// Walk keys in descending order
        #[arg(short, long)]
        reverse: bool,

        /// Maximum number of pairs to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print the number of keys
    Count,

    /// Remove every record in the namespace
    Destroy,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lexikv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> lexikv::Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .namespace(&args.namespace)
        .sync_strategy(SyncStrategy::EveryWrite)
        .build();
    config.validate()?;

    let backend = Arc::new(SnapshotBackend::open_config(&config)?);

    if let Commands::Destroy = args.command {
        let removed = Store::destroy(backend.as_ref(), &config.namespace)?;
        println!("removed {} records", removed);
        return Ok(());
    }

    let store = Store::open_with(backend.clone(), config)?;

    match args.command {
        Commands::Get { key } => {
            println!("{}", store.get(key, false)?);
        }
        Commands::Put { key, value } => {
            store.put(key, value)?;
        }
        Commands::Del { key } => {
            store.delete(key)?;
        }
        Commands::Scan {
            gt,
            gte,
            lt,
            lte,
            reverse,
            limit,
        } => {
            let options = IterOptions {
                reverse,
                gt: gt.map(Into::into),
                gte: gte.map(Into::into),
                lt: lt.map(Into::into),
                lte: lte.map(Into::into),
                limit,
                key_as_binary: false,
                value_as_binary: false,
            };
            for entry in store.iterator(options) {
                let entry = entry?;
                println!("{}\t{}", entry.key, entry.value);
            }
        }
        Commands::Count => {
            println!("{}", store.len()?);
        }
        Commands::Destroy => {}
    }

    store.close()?;
    backend.flush()
}
