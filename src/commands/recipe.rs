//! # Recipe Book
//!
//! `/recipe` hands a URL to the recipe-parser workflow, which extracts the
//! recipe and commits it to the recipe book. Progress and failures are
//! mirrored to the logs channel.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use serenity::builder::{CreateCommand, CreateCommandOption, CreateEmbed};
use serenity::model::application::CommandOptionType;
use serenity::model::Colour;

use crate::chat::{self, Messenger};
use crate::commands::{CommandInput, Reply, SlashCommand, LOGS_CHANNEL};
use crate::services::n8n::{truthy, WebhookRequest, WebhookResponse};

const DESCRIPTION_LIMIT: usize = 200;

pub struct ParseRecipe;

#[async_trait]
impl SlashCommand for ParseRecipe {
    fn name(&self) -> &'static str {
        "recipe"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Parse a recipe from a URL and save to the recipe book")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "url",
                    "URL of the recipe page to parse",
                )
                .required(true),
            )
    }

    async fn request(
        &self,
        chat: &dyn Messenger,
        input: &CommandInput,
    ) -> Result<WebhookRequest> {
        let url = input.option("url").unwrap_or_default();
        chat::post(
            chat,
            LOGS_CHANNEL,
            &format!(
                "`[Recipe]` Parsing <{url}> requested by {}",
                input.user_mention
            ),
        )
        .await?;

        let mut payload = Map::new();
        payload.insert("url".to_string(), json!(url));
        payload.insert(
            "guild_id".to_string(),
            json!(input.guild_id.map(|id| id.to_string()).unwrap_or_default()),
        );
        payload.insert("requested_by".to_string(), json!(input.user));
        Ok(WebhookRequest::post("recipe-parser", payload))
    }

    async fn respond(
        &self,
        chat: &dyn Messenger,
        _input: &CommandInput,
        _request: &WebhookRequest,
        response: &WebhookResponse,
    ) -> Result<Reply> {
        let title = response
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Recipe")
            .to_string();

        if response.get("duplicate").is_some_and(truthy) {
            chat::post(
                chat,
                LOGS_CHANNEL,
                &format!("`[Recipe]` Duplicate detected: {title}"),
            )
            .await?;
            let existing = response
                .get("existingUrl")
                .and_then(Value::as_str)
                .unwrap_or("N/A");
            return Ok(Reply::text(format!(
                "This recipe already exists in the recipe book: **{title}**\nView it here: {existing}"
            )));
        }

        chat::post(
            chat,
            LOGS_CHANNEL,
            &format!("`[Recipe]` Successfully saved: {title}"),
        )
        .await?;
        Ok(Reply::embed(saved_embed(&title, response)))
    }

    async fn on_error(&self, chat: &dyn Messenger, _input: &CommandInput, message: &str) {
        let _ = chat::post(chat, LOGS_CHANNEL, &format!("`[Recipe]` Error: {message}")).await;
    }
}

fn saved_embed(title: &str, response: &WebhookResponse) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(format!("Recipe Saved: {title}"))
        .colour(Colour::DARK_GREEN);

    if let Some(description) = response.get("description").and_then(Value::as_str) {
        embed = embed.description(short_description(description));
    }
    if let Some(image) = response.get("imageUrl").and_then(Value::as_str) {
        embed = embed.thumbnail(image);
    }
    embed = embed
        .field("Ingredients", format!("{} items", count(response, "ingredientCount")), true)
        .field("Steps", format!("{} steps", count(response, "stepCount")), true);
    if let Some(commit) = response.get("commitUrl").and_then(Value::as_str) {
        if !commit.is_empty() {
            embed = embed.field("GitHub", format!("[View Commit]({commit})"), false);
        }
    }
    embed
}

fn count(response: &WebhookResponse, key: &str) -> u64 {
    response.get(key).and_then(Value::as_u64).unwrap_or(0)
}

/// Trim long descriptions to an embed-friendly length.
fn short_description(description: &str) -> String {
    if description.chars().count() <= DESCRIPTION_LIMIT {
        return description.to_string();
    }
    let cut: String = description.chars().take(DESCRIPTION_LIMIT).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{input_with, response_with, RecordingMessenger};
    use serde_json::json;

    #[test]
    fn long_descriptions_are_trimmed() {
        let long = "x".repeat(300);
        let short = short_description(&long);
        assert_eq!(short.chars().count(), DESCRIPTION_LIMIT + 3);
        assert!(short.ends_with("..."));
        assert_eq!(short_description("soup"), "soup");
    }

    #[tokio::test]
    async fn duplicate_recipe_points_at_the_existing_entry() {
        let chat = RecordingMessenger::default();
        let input = input_with(&[("url", json!("https://example.com/soup"))]);
        let response = response_with(json!({
            "duplicate": true,
            "title": "Tomato Soup",
            "existingUrl": "https://github.com/r/soup.md",
        }));

        let request = WebhookRequest::post("recipe-parser", Map::new());
        let reply = ParseRecipe
            .respond(&chat, &input, &request, &response)
            .await
            .unwrap();
        match reply {
            Reply::Text(text) => {
                assert!(text.contains("Tomato Soup"));
                assert!(text.contains("https://github.com/r/soup.md"));
            }
            Reply::Embed(_) => panic!("expected text reply"),
        }

        let sent = chat.sent.lock().await;
        assert!(sent[0].1.contains("Duplicate detected"));
    }

    #[tokio::test]
    async fn saved_recipe_mirrors_to_logs() {
        let chat = RecordingMessenger::default();
        let input = input_with(&[("url", json!("https://example.com/soup"))]);
        let response = response_with(json!({
            "title": "Tomato Soup",
            "ingredientCount": 5,
            "stepCount": 3,
        }));

        let request = WebhookRequest::post("recipe-parser", Map::new());
        let reply = ParseRecipe
            .respond(&chat, &input, &request, &response)
            .await
            .unwrap();
        assert!(matches!(reply, Reply::Embed(_)));

        let sent = chat.sent.lock().await;
        assert_eq!(sent[0].0, LOGS_CHANNEL);
        assert!(sent[0].1.contains("Successfully saved: Tomato Soup"));
    }
}
