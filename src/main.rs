use anyhow::Context;
use clap::Parser;

mod cli;
mod config;
mod db;
mod error;
mod feed;
mod metadata;
mod models;
mod pipeline;

use cli::{Cli, Command};
use config::{Config, Credentials};
use feed::FeedFetcher;
use metadata::MetadataResolver;
use pipeline::{IngestPipeline, RecomputePass};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let credentials = Credentials::new(cli.database_url.clone(), cli.auth_token.clone())
        .context("Database credentials are required")?;

    match cli.command() {
        Command::Ingest => {
            let config = load_config(&cli, credentials)?;
            let feed = FeedFetcher::new(&config.api).context("Failed to build HTTP client")?;
            let store = db::open_store(&config.credentials)
                .await
                .context("Failed to open article store")?;

            let stats = IngestPipeline::new(
                Box::new(feed),
                store,
                MetadataResolver::from_tables(&config.tables),
                config.tables.filters.clone(),
                config.api.published_after.clone(),
            )
            .run()
            .await
            .context("Ingest run failed")?;

            println!("{}", stats);
        }
        Command::Recompute => {
            let config = load_config(&cli, credentials)?;
            let store = db::open_store(&config.credentials)
                .await
                .context("Failed to open article store")?;

            let stats = RecomputePass::new(store, MetadataResolver::from_tables(&config.tables))
                .run()
                .await
                .context("Metadata recompute failed")?;

            println!("{}", stats);
        }
        Command::Healthcheck => {
            let store = db::open_store(&credentials)
                .await
                .context("Failed to open article store")?;
            let count = pipeline::healthcheck(store)
                .await
                .context("Healthcheck failed")?;

            println!("OK: {} articles stored", count);
        }
    }

    Ok(())
}

fn load_config(cli: &Cli, credentials: Credentials) -> anyhow::Result<Config> {
    Config::load(&cli.config_dir, credentials)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config_dir))
}
