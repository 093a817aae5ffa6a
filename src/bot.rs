//! # Discord Gateway Glue
//!
//! serenity event handler: registers the slash commands on startup,
//! dispatches interactions through the command registry, and implements the
//! `Messenger` channel plumbing against the Discord HTTP API.

use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use serenity::all::{
    ChannelId, ChannelType, Command, CommandDataOptionValue, CommandInteraction, Context,
    CreateChannel, CreateCommand, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, EventHandler, GuildId, Http, Interaction,
    Ready,
};
use serenity::gateway::ActivityData;

use crate::chat::{ChannelHandle, Messenger};
use crate::commands::{self, help, CommandInput, Reply, SlashCommand};
use crate::config::Config;
use crate::services::n8n::N8nClient;

pub struct Bot {
    n8n: N8nClient,
    commands: Vec<Box<dyn SlashCommand>>,
}

impl Bot {
    pub fn new(config: &Config) -> Self {
        Self {
            n8n: N8nClient::new(&config.n8n_base_url, config.n8n_webhook_secret.clone()),
            commands: commands::registry(),
        }
    }

    fn command(&self, name: &str) -> Option<&dyn SlashCommand> {
        self.commands
            .iter()
            .find(|command| command.name() == name)
            .map(|command| command.as_ref())
    }

    async fn dispatch(&self, ctx: &Context, interaction: &CommandInteraction) -> Result<()> {
        let name = interaction.data.name.as_str();

        // /help answers inline, within the immediate-response window.
        if name == "help" {
            let response = CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new().embed(help::embed()),
            );
            return interaction
                .create_response(&ctx.http, response)
                .await
                .context("failed to send help");
        }

        let command = self
            .command(name)
            .ok_or_else(|| anyhow!("unknown command /{name}"))?;

        // Acknowledge now; the webhook call may outlive Discord's window.
        interaction
            .defer(&ctx.http)
            .await
            .context("failed to defer interaction")?;

        let input = command_input(interaction);
        let chat = DiscordMessenger {
            http: ctx.http.clone(),
            guild: interaction.guild_id,
        };

        let reply = commands::run(command, &self.n8n, &chat, &input).await;

        let followup = match reply {
            Reply::Text(content) => CreateInteractionResponseFollowup::new().content(content),
            Reply::Embed(embed) => CreateInteractionResponseFollowup::new().embed(*embed),
        };
        interaction
            .create_followup(&ctx.http, followup)
            .await
            .context("failed to send follow-up")?;
        Ok(())
    }
}

#[async_trait]
impl EventHandler for Bot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!("Logged in as {} (ID: {})", ready.user.name, ready.user.id);
        tracing::info!("Connected to {} guild(s)", ready.guilds.len());

        let mut definitions: Vec<CreateCommand> =
            self.commands.iter().map(|command| command.register()).collect();
        definitions.push(help::register());

        match Command::set_global_commands(&ctx.http, definitions).await {
            Ok(registered) => tracing::info!("Synced {} slash commands", registered.len()),
            Err(err) => tracing::error!("Failed to sync slash commands: {err}"),
        }

        ctx.set_activity(Some(ActivityData::watching("the homelab")));
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(interaction) = interaction else {
            return;
        };
        tracing::info!(
            "/{} invoked by {}",
            interaction.data.name,
            interaction.user.name
        );

        if let Err(err) = self.dispatch(&ctx, &interaction).await {
            tracing::error!("/{} failed: {err:#}", interaction.data.name);
            let followup = CreateInteractionResponseFollowup::new()
                .content("Something went wrong handling that command.");
            let _ = interaction.create_followup(&ctx.http, followup).await;
        }
    }
}

/// Flatten the interaction into the serenity-free input the pipeline uses.
fn command_input(interaction: &CommandInteraction) -> CommandInput {
    let mut options = Map::new();
    for option in &interaction.data.options {
        let value = match &option.value {
            CommandDataOptionValue::String(s) => Value::String(s.clone()),
            CommandDataOptionValue::Integer(i) => Value::from(*i),
            CommandDataOptionValue::Boolean(b) => Value::Bool(*b),
            CommandDataOptionValue::Number(n) => Value::from(*n),
            _ => continue,
        };
        options.insert(option.name.clone(), value);
    }
    CommandInput {
        user: interaction.user.tag(),
        user_mention: format!("<@{}>", interaction.user.id.get()),
        guild_id: interaction.guild_id.map(GuildId::get),
        options,
    }
}

/// `Messenger` backed by the Discord HTTP API, scoped to the guild the
/// interaction came from.
struct DiscordMessenger {
    http: Arc<Http>,
    guild: Option<GuildId>,
}

#[async_trait]
impl Messenger for DiscordMessenger {
    async fn channel(&self, name: &str) -> Result<ChannelHandle> {
        let guild = self
            .guild
            .ok_or_else(|| anyhow!("this command only works inside a server"))?;

        let channels = guild
            .channels(&self.http)
            .await
            .context("failed to list guild channels")?;
        if let Some(existing) = channels
            .values()
            .find(|channel| channel.kind == ChannelType::Text && channel.name == name)
        {
            return Ok(ChannelHandle {
                id: existing.id.get(),
                name: existing.name.clone(),
            });
        }

        let created = guild
            .create_channel(&self.http, CreateChannel::new(name).kind(ChannelType::Text))
            .await
            .with_context(|| format!("failed to create #{name}"))?;
        Ok(ChannelHandle {
            id: created.id.get(),
            name: created.name.clone(),
        })
    }

    async fn send(&self, channel: &ChannelHandle, content: &str) -> Result<()> {
        ChannelId::new(channel.id)
            .send_message(&self.http, CreateMessage::new().content(content))
            .await
            .with_context(|| format!("failed to post to #{}", channel.name))?;
        Ok(())
    }
}
