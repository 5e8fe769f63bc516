//! Routes `$`-prefixed chat commands to the [`Responder`] and delivers answers
//! as a sequence of Discord-sized messages.

use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::{debug, error, info};

use crate::responder::Responder;
use crate::utils::chunker;
use crate::{Context, Error};

pub const HELLO_MESSAGE: &str =
    "Hello! 👋 I'm ScrumMasterBot. Try: `$question How do we reduce sprint spillover?`";

const HELLO_PREFIX: &str = "$hello";
const QUESTION_PREFIX: &str = "$question";

/// A command recognised in the text of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand<'a> {
    Hello,
    /// The trimmed text following `$question`, possibly empty.
    Question(&'a str),
}

impl<'a> BotCommand<'a> {
    /// Matches `content` against the known command prefixes.
    pub fn parse(content: &'a str) -> Option<Self> {
        if content.starts_with(HELLO_PREFIX) {
            Some(BotCommand::Hello)
        } else {
            content
                .strip_prefix(QUESTION_PREFIX)
                .map(|rest| BotCommand::Question(rest.trim()))
        }
    }
}

/// Somewhere outbound messages can be sent, one at a time.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, content: String) -> Result<(), Error>;
}

/// Sends plain messages to a Discord channel.
pub struct ChannelSink {
    pub http: Arc<serenity::Http>,
    pub channel_id: serenity::ChannelId,
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn send(&self, content: String) -> Result<(), Error> {
        self.channel_id.say(&*self.http, content).await?;
        Ok(())
    }
}

/// Replies through a slash command invocation.
pub struct ContextSink<'a>(pub Context<'a>);

#[async_trait]
impl MessageSink for ContextSink<'_> {
    async fn send(&self, content: String) -> Result<(), Error> {
        self.0.say(content).await?;
        Ok(())
    }
}

/// Splits `answer` into fragments of at most `limit` characters and sends them in order.
///
/// Stops at the first failed send. Returns the number of fragments sent.
pub async fn deliver<S>(sink: &S, answer: &str, limit: usize) -> Result<usize, Error>
where
    S: MessageSink + ?Sized,
{
    let fragments = chunker::split(answer, limit);
    debug!("Delivering answer in {} fragment(s)", fragments.len());

    let mut sent = 0;
    for fragment in fragments {
        sink.send(fragment).await?;
        sent += 1;
    }

    Ok(sent)
}

/// Answers `question` and delivers the result through `sink`.
pub async fn relay_question<S>(
    responder: &Responder,
    sink: &S,
    question: &str,
    limit: usize,
) -> Result<usize, Error>
where
    S: MessageSink + ?Sized,
{
    let answer = responder.answer(question).await;
    deliver(sink, &answer, limit).await
}

/// Handles one inbound message. Messages that are not commands are ignored.
pub async fn dispatch<S>(
    responder: &Responder,
    sink: &S,
    content: &str,
    limit: usize,
) -> Result<(), Error>
where
    S: MessageSink + ?Sized,
{
    match BotCommand::parse(content) {
        Some(BotCommand::Hello) => {
            sink.send(HELLO_MESSAGE.to_string()).await?;
        }
        Some(BotCommand::Question(question)) => {
            info!("Relaying $question command");
            match relay_question(responder, sink, question, limit).await {
                Ok(sent) => debug!("Sent {} fragment(s)", sent),
                Err(e) => {
                    error!("Failed to deliver answer: {}", e);
                    return Err(e);
                }
            }
        }
        None => {}
    }

    Ok(())
}
