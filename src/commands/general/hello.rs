use crate::relay::HELLO_MESSAGE;
use crate::{CommandResult, Context};

/// Say hello and show how to ask a question
#[poise::command(slash_command, category = "General")]
pub async fn hello(ctx: Context<'_>) -> CommandResult {
    ctx.say(HELLO_MESSAGE).await?;

    Ok(())
}
