//! # Main Entry Point
//!
//! Loads configuration from the environment, sets up logging, and starts the
//! Discord gateway client. Everything else happens per interaction.

mod bot;
mod chat;
mod commands;
mod config;
mod services;

use anyhow::{Context, Result};
use serenity::all::GatewayIntents;
use serenity::Client;

use crate::bot::Bot;
use crate::config::Config;

/// Log filter when `RUST_LOG` is unset: our code at info, SDK noise quieted.
const DEFAULT_LOG_FILTER: &str = "info,serenity=warn,hyper=warn,tracing::span=warn";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env()?;
    tracing::info!("n8n base URL: {}", config.n8n_base_url);

    // Slash commands arrive as interactions; no gateway intents needed.
    let mut client = Client::builder(&config.discord_token, GatewayIntents::empty())
        .event_handler(Bot::new(&config))
        .await
        .context("Failed to build Discord client")?;

    tracing::info!("Starting relaybot...");
    client.start().await.context("Discord client stopped")?;
    Ok(())
}
