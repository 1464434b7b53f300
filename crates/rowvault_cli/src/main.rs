//! RowVault CLI
//!
//! Command-line tools for RowVault record stores.
//!
//! # Commands
//!
//! - `create-db` / `delete-db` / `list` - database lifecycle
//! - `insert` / `search` / `update` / `delete` - row operations
//!
//! Row operations connect to the database, wait their turn in the
//! admission queue, perform the operation, and disconnect.

mod commands;

use clap::{Parser, Subcommand};
use rowvault_core::DatabaseEngine;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// RowVault command-line record store tools.
#[derive(Parser)]
#[command(name = "rowvault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory of the store
    #[arg(global = true, short, long, default_value = "rowvault_store")]
    root: PathBuf,

    /// Engine passphrase protecting the per-database key files
    #[arg(global = true, short, long)]
    passphrase: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a database
    CreateDb {
        /// Database name
        name: String,
    },

    /// Delete a database
    DeleteDb {
        /// Database name
        name: String,
    },

    /// List databases
    List,

    /// Insert a row into a table
    Insert {
        /// Database name
        #[arg(short, long)]
        database: String,

        /// Table name
        #[arg(short, long)]
        table: String,

        /// Row as a JSON object
        row: String,
    },

    /// Print rows matching a filter
    Search {
        /// Database name
        #[arg(short, long)]
        database: String,

        /// Table name
        #[arg(short, long)]
        table: String,

        /// Conditions as a JSON object (all rows when omitted)
        #[arg(short, long, default_value = "{}")]
        filter: String,
    },

    /// Update rows matching a filter
    Update {
        /// Database name
        #[arg(short, long)]
        database: String,

        /// Table name
        #[arg(short, long)]
        table: String,

        /// Conditions as a JSON object (all rows when omitted)
        #[arg(short, long, default_value = "{}")]
        filter: String,

        /// Changes as a JSON object
        set: String,
    },

    /// Delete rows matching a filter
    Delete {
        /// Database name
        #[arg(short, long)]
        database: String,

        /// Table name
        #[arg(short, long)]
        table: String,

        /// Conditions as a JSON object (all rows when omitted)
        #[arg(short, long, default_value = "{}")]
        filter: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(root = %cli.root.display(), "using store root");
    let engine = |passphrase: &Option<String>| -> Result<DatabaseEngine, Box<dyn std::error::Error>> {
        let passphrase = passphrase
            .as_deref()
            .ok_or("Passphrase required (--passphrase)")?;
        commands::open_engine(&cli.root, passphrase)
    };

    match &cli.command {
        Commands::CreateDb { name } => {
            commands::lifecycle::create(&engine(&cli.passphrase)?, name)?;
        }
        Commands::DeleteDb { name } => {
            commands::lifecycle::delete(&engine(&cli.passphrase)?, name)?;
        }
        Commands::List => {
            commands::lifecycle::list(&engine(&cli.passphrase)?)?;
        }
        Commands::Insert {
            database,
            table,
            row,
        } => {
            commands::rows::insert(&engine(&cli.passphrase)?, database, table, row)?;
        }
        Commands::Search {
            database,
            table,
            filter,
        } => {
            commands::rows::search(&engine(&cli.passphrase)?, database, table, filter)?;
        }
        Commands::Update {
            database,
            table,
            filter,
            set,
        } => {
            commands::rows::update(&engine(&cli.passphrase)?, database, table, filter, set)?;
        }
        Commands::Delete {
            database,
            table,
            filter,
        } => {
            commands::rows::delete(&engine(&cli.passphrase)?, database, table, filter)?;
        }
        Commands::Version => {
            println!("RowVault CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("RowVault Core v{}", rowvault_core::VERSION);
        }
    }

    Ok(())
}
