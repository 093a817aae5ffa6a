//! # Stock Commands
//!
//! `/utr` asks the backend for UTR stock status; `/check-stock` probes a
//! product page and posts an availability alert to the stock-alerts channel
//! when the product is in stock.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::model::application::CommandOptionType;

use crate::chat::Messenger;
use crate::commands::{fallback_message, CommandInput, Reply, SlashCommand};
use crate::services::n8n::{truthy, WebhookRequest, WebhookResponse};

/// Channel that receives availability alerts.
pub const ALERTS_CHANNEL: &str = "stock-alerts";

pub struct UtrStock;

#[async_trait]
impl SlashCommand for UtrStock {
    fn name(&self) -> &'static str {
        "utr"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Check UTR stock status")
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "product",
                "Product name or SKU to check",
            ))
    }

    async fn request(
        &self,
        _chat: &dyn Messenger,
        input: &CommandInput,
    ) -> Result<WebhookRequest> {
        let mut payload = Map::new();
        if let Some(product) = input.option("product") {
            payload.insert("product".to_string(), json!(product));
        }
        Ok(WebhookRequest::post("utr-stock-check", payload))
    }

    async fn respond(
        &self,
        _chat: &dyn Messenger,
        _input: &CommandInput,
        _request: &WebhookRequest,
        response: &WebhookResponse,
    ) -> Result<Reply> {
        Ok(Reply::text(fallback_message(response)))
    }
}

pub struct CheckStock;

#[async_trait]
impl SlashCommand for CheckStock {
    fn name(&self) -> &'static str {
        "check-stock"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Check whether a product page shows stock")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "url", "Product page URL")
                    .required(true),
            )
    }

    async fn request(
        &self,
        _chat: &dyn Messenger,
        input: &CommandInput,
    ) -> Result<WebhookRequest> {
        let mut payload = Map::new();
        payload.insert(
            "url".to_string(),
            json!(input.option("url").unwrap_or_default()),
        );
        payload.insert("requested_by".to_string(), json!(input.user));
        Ok(WebhookRequest::post("stock-check", payload))
    }

    async fn respond(
        &self,
        chat: &dyn Messenger,
        input: &CommandInput,
        _request: &WebhookRequest,
        response: &WebhookResponse,
    ) -> Result<Reply> {
        if let Some(alert) = stock_alert(response, input.option("url").unwrap_or_default()) {
            crate::chat::post(chat, ALERTS_CHANNEL, &alert).await?;
        }
        Ok(Reply::text(
            response
                .message
                .clone()
                .unwrap_or_else(|| "Stock check complete".to_string()),
        ))
    }
}

/// Alert line for an in-stock product, None when out of stock.
fn stock_alert(response: &WebhookResponse, url: &str) -> Option<String> {
    if !response.get("inStock").is_some_and(truthy) {
        return None;
    }
    let name = field(response, "productName", "Unknown product");
    let price = field(response, "price", "an unknown price");
    Some(format!("🟢 **{name}** is in stock at {price}: <{url}>"))
}

/// String field, stringified when the workflow returns a number.
fn field(response: &WebhookResponse, key: &str, default: &str) -> String {
    match response.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}
