//! # VetTix Scraper
//!
//! `/vettix` kicks off the vettix-scraper workflow for a state. The workflow
//! posts its results straight into the vettix channel, so the handler only
//! resolves that channel, passes its id along, and reports the event count.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::model::application::CommandOptionType;

use crate::chat::{self, ChannelHandle, Messenger};
use crate::commands::{CommandInput, Reply, SlashCommand, LOGS_CHANNEL};
use crate::services::n8n::{WebhookRequest, WebhookResponse};

/// Channel the workflow posts scraped events into.
pub const VETTIX_CHANNEL: &str = "vettix-scraper";

pub struct ScrapeVettix;

#[async_trait]
impl SlashCommand for ScrapeVettix {
    fn name(&self) -> &'static str {
        "vettix"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Scrape VetTix events for a state")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "state",
                    "Two-letter state code (e.g., tx, tn, ca, nv)",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "status", "Event status filter")
                    .add_string_choice("Open tickets only", "open")
                    .add_string_choice("All events", "all"),
            )
    }

    fn validate(&self, input: &CommandInput) -> Result<(), String> {
        if normalize_state(input.option("state").unwrap_or_default()).len() != 2 {
            return Err("Please provide a two-letter state code (e.g., tx, tn, ca)".to_string());
        }
        Ok(())
    }

    async fn request(
        &self,
        chat: &dyn Messenger,
        input: &CommandInput,
    ) -> Result<WebhookRequest> {
        let state = normalize_state(input.option("state").unwrap_or_default());
        chat::post(
            chat,
            LOGS_CHANNEL,
            &format!(
                "`[VetTix]` Scraping {} events requested by {}",
                state.to_uppercase(),
                input.user_mention
            ),
        )
        .await?;

        let results_channel = chat.channel(VETTIX_CHANNEL).await?;

        let mut payload = Map::new();
        payload.insert("state".to_string(), json!(state));
        payload.insert(
            "status".to_string(),
            json!(input.option("status").unwrap_or("open")),
        );
        payload.insert(
            "guild_id".to_string(),
            json!(input.guild_id.map(|id| id.to_string()).unwrap_or_default()),
        );
        payload.insert(
            "channel_id".to_string(),
            json!(results_channel.id.to_string()),
        );
        Ok(WebhookRequest::post("vettix-scraper", payload))
    }

    async fn respond(
        &self,
        chat: &dyn Messenger,
        input: &CommandInput,
        request: &WebhookRequest,
        response: &WebhookResponse,
    ) -> Result<Reply> {
        let state = normalize_state(input.option("state").unwrap_or_default()).to_uppercase();
        let count = response.get("count").and_then(Value::as_u64).unwrap_or(0);

        chat::post(
            chat,
            LOGS_CHANNEL,
            &format!("`[VetTix]` Scraped {count} events for {state}"),
        )
        .await?;

        // The channel was already resolved while building the payload; read
        // its id back instead of hitting the channel list again.
        let results_channel = match request
            .body
            .get("channel_id")
            .and_then(Value::as_str)
            .and_then(|id| id.parse::<u64>().ok())
        {
            Some(id) => ChannelHandle {
                id,
                name: VETTIX_CHANNEL.to_string(),
            },
            None => chat.channel(VETTIX_CHANNEL).await?,
        };
        Ok(Reply::text(format!(
            "Scraped {count} events for {state}. Results posted to {}",
            results_channel.mention()
        )))
    }

    async fn on_error(&self, chat: &dyn Messenger, _input: &CommandInput, message: &str) {
        let _ = chat::post(chat, LOGS_CHANNEL, &format!("`[VetTix]` Error: {message}")).await;
    }
}

fn normalize_state(raw: &str) -> String {
    raw.trim().to_lowercase()
}
