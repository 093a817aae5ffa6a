//! # Home Automation
//!
//! `/home` forwards a device action to the home-control workflow.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::model::application::CommandOptionType;

use crate::chat::Messenger;
use crate::commands::{CommandInput, Reply, SlashCommand};
use crate::services::n8n::{WebhookRequest, WebhookResponse};

pub struct HomeControl;

#[async_trait]
impl SlashCommand for HomeControl {
    fn name(&self) -> &'static str {
        "home"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Control home automation")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "action", "Action to perform")
                    .required(true)
                    .add_string_choice("lights on", "lights_on")
                    .add_string_choice("lights off", "lights_off")
                    .add_string_choice("status", "status"),
            )
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "target",
                "Target device or area",
            ))
    }

    async fn request(
        &self,
        _chat: &dyn Messenger,
        input: &CommandInput,
    ) -> Result<WebhookRequest> {
        let mut payload = Map::new();
        payload.insert(
            "action".to_string(),
            json!(input.option("action").unwrap_or_default()),
        );
        payload.insert(
            "target".to_string(),
            input.option("target").map_or(Value::Null, |t| json!(t)),
        );
        payload.insert("user".to_string(), json!(input.user));
        Ok(WebhookRequest::post("home-control", payload))
    }

    async fn respond(
        &self,
        _chat: &dyn Messenger,
        _input: &CommandInput,
        _request: &WebhookRequest,
        response: &WebhookResponse,
    ) -> Result<Reply> {
        let message = response
            .message
            .clone()
            .or_else(|| response.text().map(str::to_string))
            .unwrap_or_else(|| "Done!".to_string());
        Ok(Reply::text(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{input_with, response_with, RecordingMessenger};
    use serde_json::json;

    #[tokio::test]
    async fn payload_carries_action_target_and_user() {
        let chat = RecordingMessenger::default();
        let input = input_with(&[
            ("action", json!("lights_on")),
            ("target", json!("kitchen")),
        ]);
        let request = HomeControl.request(&chat, &input).await.unwrap();
        assert_eq!(request.path, "home-control");
        assert_eq!(request.body["action"], json!("lights_on"));
        assert_eq!(request.body["target"], json!("kitchen"));
        assert_eq!(request.body["user"], json!("tester#0"));
    }

    #[tokio::test]
    async fn missing_target_is_sent_as_null() {
        let chat = RecordingMessenger::default();
        let input = input_with(&[("action", json!("status"))]);
        let request = HomeControl.request(&chat, &input).await.unwrap();
        assert_eq!(request.body["target"], Value::Null);
    }

    #[tokio::test]
    async fn quiet_success_reads_done() {
        let chat = RecordingMessenger::default();
        let input = input_with(&[("action", json!("lights_off"))]);
        let request = WebhookRequest::post("home-control", Map::new());
        let response = response_with(json!({}));
        let reply = HomeControl
            .respond(&chat, &input, &request, &response)
            .await
            .unwrap();
        match reply {
            Reply::Text(text) => assert_eq!(text, "Done!"),
            Reply::Embed(_) => panic!("expected text reply"),
        }
    }
}
