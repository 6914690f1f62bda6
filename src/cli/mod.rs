//! CLI module for Model Dashboard
//!
//! - `serve`: HTTP API server
//! - `users`, `tokens`: credential store administration
//! - `models`: model descriptor maintenance

pub mod models;
pub mod serve;
pub mod tokens;
pub mod users;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::api::state::AppState;
use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Model Dashboard - model metadata service and administration tool
#[derive(Parser)]
#[command(name = "model-dashboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Manage local user accounts
    #[command(subcommand)]
    Users(users::UsersCommand),

    /// Issue, list and revoke API tokens
    #[command(subcommand)]
    Tokens(tokens::TokensCommand),

    /// Inspect and edit model descriptors in the bucket
    #[command(subcommand)]
    Models(models::ModelsCommand),
}

/// Load `.env` and configuration, start logging, and connect every backend
pub async fn bootstrap() -> anyhow::Result<(AppConfig, AppState)> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    let state = crate::create_app_state(&config)
        .await
        .context("Failed to initialize backends")?;

    Ok((config, state))
}

/// Print a value as pretty JSON on stdout
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
