//! # Configuration
//!
//! Environment-sourced settings, read once at startup.

use anyhow::{Context, Result};
use std::env;

/// Default n8n endpoint when `N8N_BASE_URL` is unset.
pub const DEFAULT_N8N_BASE_URL: &str = "https://n8n.marcellolab.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub n8n_base_url: String,
    /// Shared secret attached to every webhook call when set.
    pub n8n_webhook_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let discord_token = env::var("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?;
        let n8n_base_url =
            env::var("N8N_BASE_URL").unwrap_or_else(|_| DEFAULT_N8N_BASE_URL.to_string());
        let n8n_webhook_secret = env::var("N8N_WEBHOOK_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty());
        Ok(Self {
            discord_token,
            n8n_base_url,
            n8n_webhook_secret,
        })
    }
}
