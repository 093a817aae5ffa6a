//! # Command Handlers
//!
//! One module per slash command family, plus the shared pipeline that every
//! webhook-backed command runs through: validate the input, build a
//! `WebhookRequest`, invoke the client, branch on the error envelope, format
//! a reply. Handlers only supply the payload and the formatting; the
//! dispatching and error plumbing live here once.

pub mod help;
pub mod home;
pub mod recipe;
pub mod status;
pub mod stock;
pub mod vettix;
pub mod webhook;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use serenity::builder::{CreateCommand, CreateEmbed};

use crate::chat::Messenger;
use crate::services::n8n::{N8nClient, WebhookRequest, WebhookResponse};

/// Channel that mirrors command activity.
pub const LOGS_CHANNEL: &str = "logs";

/// A resolved slash-command invocation, detached from serenity types so the
/// pipeline can be exercised in tests.
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
    /// Invoking user's tag (e.g. `marcello#0`).
    pub user: String,
    /// Mention form (`<@id>`), for log mirrors.
    pub user_mention: String,
    pub guild_id: Option<u64>,
    pub options: Map<String, Value>,
}

impl CommandInput {
    /// String option by name, None when absent.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(Value::as_str)
    }
}

/// Final message delivered to the invoking user.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Embed(Box<CreateEmbed>),
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Reply::Text(content.into())
    }

    pub fn embed(embed: CreateEmbed) -> Self {
        Reply::Embed(Box::new(embed))
    }
}

/// A webhook-backed slash command. `/help` answers inline without a webhook
/// call and is dispatched separately in `bot`.
#[async_trait]
pub trait SlashCommand: Send + Sync {
    /// Registered command name.
    fn name(&self) -> &'static str;

    /// Command definition pushed to Discord on startup.
    fn register(&self) -> CreateCommand;

    /// Cheap input validation. An Err is shown to the user verbatim and the
    /// webhook is never called.
    fn validate(&self, _input: &CommandInput) -> Result<(), String> {
        Ok(())
    }

    /// Build the outbound webhook request. Handlers that mirror a log line
    /// or resolve a side channel do it here.
    async fn request(
        &self,
        chat: &dyn Messenger,
        input: &CommandInput,
    ) -> Result<WebhookRequest>;

    /// Format the success-path response. `request` is the call that was just
    /// made, so handlers can reuse what they resolved while building it.
    async fn respond(
        &self,
        chat: &dyn Messenger,
        input: &CommandInput,
        request: &WebhookRequest,
        response: &WebhookResponse,
    ) -> Result<Reply>;

    /// Hook fired on the failure path, before the user sees the message.
    async fn on_error(&self, _chat: &dyn Messenger, _input: &CommandInput, _message: &str) {}
}

/// Every webhook-backed command, in registration order.
pub fn registry() -> Vec<Box<dyn SlashCommand>> {
    vec![
        Box::new(stock::UtrStock),
        Box::new(stock::CheckStock),
        Box::new(home::HomeControl),
        Box::new(status::ServerStatus),
        Box::new(webhook::Trigger),
        Box::new(recipe::ParseRecipe),
        Box::new(vettix::ScrapeVettix),
    ]
}

/// Shared pipeline. Any failure, transport or workflow, ends in a short text
/// reply; an invocation never drops silently.
pub async fn run(
    command: &dyn SlashCommand,
    n8n: &N8nClient,
    chat: &dyn Messenger,
    input: &CommandInput,
) -> Reply {
    if let Err(message) = command.validate(input) {
        return Reply::text(message);
    }

    let request = match command.request(chat, input).await {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!("/{}: failed to build request: {err:#}", command.name());
            return Reply::text(format!("Error: {err}"));
        }
    };

    match n8n.invoke(&request).await {
        Ok(response) if response.is_error => {
            let message = format!(
                "Failed: {}",
                response.message.as_deref().unwrap_or("Unknown error")
            );
            command.on_error(chat, input, &message).await;
            Reply::text(message)
        }
        Ok(response) => match command.respond(chat, input, &request, &response).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!("/{}: failed to format response: {err:#}", command.name());
                Reply::text(format!("Error: {err}"))
            }
        },
        Err(err) => {
            tracing::warn!("/{}: webhook call failed: {err}", command.name());
            let message = format!("Failed: {err}");
            command.on_error(chat, input, &message).await;
            Reply::text(message)
        }
    }
}

/// Default success formatting: `message`, then the plain-text `response`,
/// then a dump of whatever the workflow returned.
pub(crate) fn fallback_message(response: &WebhookResponse) -> String {
    if let Some(message) = &response.message {
        return message.clone();
    }
    if let Some(text) = response.text() {
        return text.to_string();
    }
    Value::Object(response.raw.clone()).to_string()
}
