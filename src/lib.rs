//! ScrumMasterBot: a Discord bot that answers Agile/Scrum questions through the
//! OpenAI chat completions API.

use std::sync::Arc;

use poise::serenity_prelude as serenity;

pub mod commands;
pub mod config;
pub mod events;
pub mod relay;
pub mod responder;
pub mod utils;

use commands::general::{hello::*, question::*};
use responder::Responder;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// State shared by every command and event handler.
pub struct Data {
    pub responder: Arc<Responder>,
    /// Maximum characters per outbound message.
    pub fragment_limit: usize,
}

/// Show help for the bot's commands
#[poise::command(slash_command, category = "General")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            extra_text_at_bottom: "You can also type `$hello` or `$question <text>` in any channel I can read.",
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, owners_only, hide_in_help)]
pub async fn register(ctx: Context<'_>) -> CommandResult {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

/// Gateway intents the bot needs; reading `$` commands requires message content.
pub fn intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT
}

/// Builds the poise framework around an already constructed [`Data`].
pub fn framework(data: Data) -> poise::Framework<Data, Error> {
    poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![register(), help(), hello(), question()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build()
}
