use poise::serenity_prelude as serenity;
use tracing::{debug, error};

use crate::relay::{self, ChannelSink};
use crate::{Data, Error};

/// Handles gateway events that are not application commands.
///
/// serenity runs each event on its own task, so a slow completion call only
/// holds up the message that triggered it.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        if new_message.author.id == framework.bot_id {
            return Ok(());
        }

        debug!(
            "Message from {} in channel {}",
            new_message.author.name, new_message.channel_id
        );

        let sink = ChannelSink {
            http: ctx.http.clone(),
            channel_id: new_message.channel_id,
        };

        if let Err(e) = relay::dispatch(
            &data.responder,
            &sink,
            &new_message.content,
            data.fragment_limit,
        )
        .await
        {
            error!("Error handling message {}: {}", new_message.id, e);
        }
    }

    Ok(())
}
