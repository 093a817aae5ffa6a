//! # Help
//!
//! `/help` lists every command inline; no webhook involved, so it skips the
//! deferred pipeline entirely.

use serenity::builder::{CreateCommand, CreateEmbed, CreateEmbedFooter};
use serenity::model::Colour;

pub fn register() -> CreateCommand {
    CreateCommand::new("help").description("Show all available commands")
}

pub fn embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("Relaybot Commands")
        .description("Homelab automation commands, relayed to n8n workflows")
        .colour(Colour::BLUE)
        .field(
            "Stock",
            "`/utr [product]` - Check UTR stock status\n\
             `/check-stock <url>` - Check a product page; alerts go to #stock-alerts",
            false,
        )
        .field(
            "Home Automation",
            "`/home <action> [target]` - Control home devices\n\
             \u{2007} Actions: `lights on`, `lights off`, `status`",
            false,
        )
        .field(
            "Status",
            "`/status [service]` - Check homelab service status",
            false,
        )
        .field(
            "Recipe Book",
            "`/recipe <url>` - Parse a recipe from a URL and save it to the recipe book",
            false,
        )
        .field(
            "VetTix",
            "`/vettix <state> [status]` - Scrape VetTix events for a state",
            false,
        )
        .field(
            "Workflows",
            "`/trigger <workflow> [data]` - Trigger a custom n8n workflow",
            false,
        )
        .footer(CreateEmbedFooter::new("<required> [optional]"))
}
