//! # Generic Workflow Trigger
//!
//! `/trigger` fires any n8n webhook by name, with optional JSON data merged
//! into the payload.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::model::application::CommandOptionType;

use crate::chat::Messenger;
use crate::commands::{CommandInput, Reply, SlashCommand};
use crate::services::n8n::{WebhookRequest, WebhookResponse};

/// Discord caps message content at 2000 characters; leave room for the fence.
const DUMP_LIMIT: usize = 1800;

pub struct Trigger;

#[async_trait]
impl SlashCommand for Trigger {
    fn name(&self) -> &'static str {
        "trigger"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Trigger a custom n8n workflow")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "workflow",
                    "Webhook name/path to trigger",
                )
                .required(true),
            )
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "data",
                "Optional JSON data to send",
            ))
    }

    async fn request(
        &self,
        _chat: &dyn Messenger,
        input: &CommandInput,
    ) -> Result<WebhookRequest> {
        let workflow = input.option("workflow").unwrap_or_default();
        let payload = trigger_payload(&input.user, input.option("data"));
        Ok(WebhookRequest::post(workflow, payload))
    }

    async fn respond(
        &self,
        _chat: &dyn Messenger,
        _input: &CommandInput,
        request: &WebhookRequest,
        response: &WebhookResponse,
    ) -> Result<Reply> {
        let workflow = &request.path;
        let message = response
            .message
            .clone()
            .or_else(|| response.text().map(str::to_string));

        Ok(match message {
            Some(message) => Reply::text(format!("**{workflow}**: {message}")),
            None => {
                let dump = serde_json::to_string_pretty(&Value::Object(response.raw.clone()))
                    .unwrap_or_default();
                Reply::text(format!(
                    "**{workflow}** triggered successfully!\n```json\n{}\n```",
                    clamp(&dump, DUMP_LIMIT)
                ))
            }
        })
    }
}

/// Base payload plus the user-supplied data: a JSON object merges key by key,
/// anything else is passed through under `data`.
fn trigger_payload(user: &str, data: Option<&str>) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("triggered_by".to_string(), json!(user));

    if let Some(data) = data {
        match serde_json::from_str::<Value>(data) {
            Ok(Value::Object(extra)) => payload.extend(extra),
            _ => {
                payload.insert("data".to_string(), json!(data));
            }
        }
    }
    payload
}

fn clamp(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_object_data_merges_into_payload() {
        let payload = trigger_payload("tester#0", Some("{\"a\": 1, \"b\": \"two\"}"));
        assert_eq!(payload["triggered_by"], json!("tester#0"));
        assert_eq!(payload["a"], json!(1));
        assert_eq!(payload["b"], json!("two"));
    }

    #[test]
    fn invalid_json_is_sent_as_raw_data() {
        let payload = trigger_payload("tester#0", Some("not json"));
        assert_eq!(payload["data"], json!("not json"));
    }

    #[test]
    fn non_object_json_is_sent_as_raw_data() {
        let payload = trigger_payload("tester#0", Some("[1, 2]"));
        assert_eq!(payload["data"], json!("[1, 2]"));
    }

    #[test]
    fn no_data_leaves_only_the_invoker() {
        let payload = trigger_payload("tester#0", None);
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn clamp_respects_char_boundaries() {
        let s = "aé".repeat(10);
        let clamped = clamp(&s, 4);
        assert!(clamped.len() <= 4);
        assert!(s.starts_with(clamped));
    }
}
