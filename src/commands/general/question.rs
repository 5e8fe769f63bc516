use tracing::{debug, info};

use crate::relay::{ContextSink, relay_question};
use crate::{CommandResult, Context};

/// Ask ScrumMaster an Agile/Scrum question
#[poise::command(slash_command, category = "General")]
pub async fn question(
    ctx: Context<'_>,
    #[description = "Your question"] question: String,
) -> CommandResult {
    ctx.defer().await?;

    info!("Question from {}", ctx.author().name);

    let data = ctx.data();
    let sent = relay_question(
        &data.responder,
        &ContextSink(ctx),
        &question,
        data.fragment_limit,
    )
    .await?;

    debug!("Answered {} in {} message(s)", ctx.author().name, sent);

    Ok(())
}
