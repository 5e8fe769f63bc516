use std::sync::Arc;

use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use scrumbot::config::Config;
use scrumbot::responder::Responder;
use scrumbot::utils::chunker::DEFAULT_FRAGMENT_LIMIT;
use scrumbot::utils::openai_client::OpenAiClient;
use scrumbot::{Data, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scrumbot=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    // Missing credentials end the process here, before connecting to Discord.
    let config = Config::from_env().inspect_err(|e| error!("{}", e))?;
    info!(
        "Using model '{}' at {}",
        config.completion.model, config.base_url
    );

    let client = OpenAiClient::new(
        config.openai_api_key.clone(),
        config.base_url.as_str(),
        config.timeout,
    )?;
    let responder = Responder::new(
        Arc::new(client),
        config.persona.clone(),
        config.completion.clone(),
    );

    let data = Data {
        responder: Arc::new(responder),
        fragment_limit: DEFAULT_FRAGMENT_LIMIT,
    };

    let mut client = ClientBuilder::new(config.discord_token, scrumbot::intents())
        .framework(scrumbot::framework(data))
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            shard_manager.shutdown_all().await;
        }
    });

    client.start().await.map_err(Into::into)
}
