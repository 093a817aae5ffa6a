//! # Service Status
//!
//! `/status` asks the server-status workflow for service health and renders
//! a per-service embed when the workflow returns one.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use serenity::builder::{CreateCommand, CreateCommandOption, CreateEmbed};
use serenity::model::application::CommandOptionType;
use serenity::model::Colour;

use crate::chat::Messenger;
use crate::commands::{fallback_message, CommandInput, Reply, SlashCommand};
use crate::services::n8n::{truthy, WebhookRequest, WebhookResponse};

pub struct ServerStatus;

#[async_trait]
impl SlashCommand for ServerStatus {
    fn name(&self) -> &'static str {
        "status"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Check homelab service status")
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "service",
                "Specific service to check",
            ))
    }

    async fn request(
        &self,
        _chat: &dyn Messenger,
        input: &CommandInput,
    ) -> Result<WebhookRequest> {
        let mut payload = Map::new();
        if let Some(service) = input.option("service") {
            payload.insert("service".to_string(), json!(service));
        }
        Ok(WebhookRequest::post("server-status", payload))
    }

    async fn respond(
        &self,
        _chat: &dyn Messenger,
        _input: &CommandInput,
        _request: &WebhookRequest,
        response: &WebhookResponse,
    ) -> Result<Reply> {
        let Some(fields) = service_fields(response.get("services")) else {
            return Ok(Reply::text(fallback_message(response)));
        };

        let mut embed = CreateEmbed::new()
            .title("Homelab Status")
            .colour(Colour::DARK_GREEN);
        for (name, value) in fields {
            embed = embed.field(name, value, true);
        }
        Ok(Reply::embed(embed))
    }
}

/// One `(✅/❌ name, message)` pair per service, None when the workflow did
/// not return a `services` object.
fn service_fields(services: Option<&Value>) -> Option<Vec<(String, String)>> {
    let services = services?.as_object()?;
    let fields = services
        .iter()
        .map(|(name, status)| {
            let healthy = status.get("healthy").is_some_and(truthy);
            let emoji = if healthy { "✅" } else { "❌" };
            let message = status
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown");
            (format!("{emoji} {name}"), message.to_string())
        })
        .collect();
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn healthy_and_unhealthy_services_get_marked() {
        let services = json!({
            "plex": {"healthy": true, "message": "up 4d"},
            "sonarr": {"healthy": false, "message": "connection refused"},
        });
        let fields = service_fields(Some(&services)).unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().any(|(n, v)| n == "✅ plex" && v == "up 4d"));
        assert!(fields
            .iter()
            .any(|(n, v)| n == "❌ sonarr" && v == "connection refused"));
    }

    #[test]
    fn missing_services_object_falls_back_to_text() {
        assert_eq!(service_fields(None), None);
        assert_eq!(service_fields(Some(&json!("all good"))), None);
    }
}
