//! Command-line interface of the ingest binary.
//!
//! Every option can also come from the environment (or a `.env` file).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Incrementally harvests tagesschau.de articles into a libSQL/SQLite table.
///
/// # Examples
///
/// ```sh
/// # Ingest new articles (the default subcommand)
/// tagesschau-ingest --database-url news.db --auth-token local
///
/// # Re-derive region metadata after editing the lookup tables
/// tagesschau-ingest --config-dir ./config recompute
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the JSON lookup tables and API settings
    #[arg(long, env = "TAGESSCHAU_CONFIG_DIR", default_value = "config")]
    pub config_dir: PathBuf,

    /// libsql://, https:// or a local SQLite path
    #[arg(long, env = "TURSO_DB_URL")]
    pub database_url: Option<String>,

    /// Auth token for the remote database
    #[arg(long, env = "TURSO_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Fetch the index and store new articles
    Ingest,
    /// Re-derive source and region fields of all stored articles
    Recompute,
    /// Check the database connection and print the article count
    Healthcheck,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Ingest)
    }
}
