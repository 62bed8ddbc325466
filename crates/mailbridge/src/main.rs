//! `mailbridge` - email tools for agents over stdio
//!
//! Serves the profile, send and read tools as a Model Context Protocol
//! server. Stdout carries protocol messages only; logs go to stderr.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod server;
mod tools;

use anyhow::Context;
use mailbridge_core::{Dispatcher, ImapInbound, ProfileStore, SmtpOutbound};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailbridge=info,mailbridge_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    config
        .ensure_data_dir()
        .with_context(|| format!("creating directory for {}", config.database_path.display()))?;

    let database = config.database_path.to_string_lossy();
    let store = ProfileStore::new(&database)
        .await
        .with_context(|| format!("opening profile store at {database}"))?;

    info!(database = %database, "starting mailbridge");

    let server = Server::new(Dispatcher::new(
        store,
        SmtpOutbound::new(),
        ImapInbound::new(),
    ));
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("stdio transport failed")?;

    info!("shutting down");
    Ok(())
}
