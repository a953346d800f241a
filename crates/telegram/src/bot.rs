use std::time::Duration;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio::{sync::mpsc, task::JoinHandle},
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use chanrelay_forward::{RelayEvent, StatusView};

use crate::{config::TelegramBotConfig, error::Error, handlers, state::BotState};

/// Pause before retrying a failed `getUpdates` call.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Connect the bot and spawn the long-polling loop.
///
/// Channel posts are sent to `inbound` in the order Telegram delivers them.
/// Polling and reply failures are sent there too, so they show up in the
/// error counter.
///
/// The loop exits when `cancel` fires, when the pipeline stops accepting
/// messages, or when another instance takes over the token; in the last case
/// `cancel` is triggered so the rest of the relay shuts down too.
pub async fn start_polling(
    config: TelegramBotConfig,
    inbound: mpsc::Sender<RelayEvent>,
    status: StatusView,
    cancel: CancellationToken,
) -> anyhow::Result<JoinHandle<()>> {
    // Client timeout must outlast the long-polling timeout.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(config.poll_timeout_secs) + 15))
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    bot.delete_webhook().send().await?;

    if config.admin_commands {
        let commands = vec![
            BotCommand::new("start", "Show the welcome message"),
            BotCommand::new("status", "Show relay status"),
            BotCommand::new("stats", "Show message counters"),
            BotCommand::new("help", "Show the setup guide"),
        ];
        if let Err(e) = bot.set_my_commands(commands).await {
            warn!(error = %e, "failed to register bot commands");
        }
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");

    let state = BotState {
        bot: bot.clone(),
        bot_username,
        inbound,
        status,
        admin_commands: config.admin_commands,
    };
    let poll_timeout = config.poll_timeout_secs;

    Ok(tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            let request = bot
                .get_updates()
                .offset(offset)
                .timeout(poll_timeout)
                .allowed_updates(vec![AllowedUpdate::ChannelPost, AllowedUpdate::Message]);

            let result = tokio::select! {
                () = cancel.cancelled() => break,
                result = request.send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::ChannelPost(msg) => {
                                debug!(
                                    chat_id = msg.chat.id.0,
                                    message_id = msg.id.0,
                                    "received channel post"
                                );
                                match handlers::handle_channel_post(msg, &state).await {
                                    Ok(()) => {},
                                    Err(Error::PipelineClosed) => {
                                        warn!("relay pipeline closed, stopping telegram polling");
                                        return;
                                    },
                                    Err(e) => {
                                        error!(error = %e, "error handling channel post");
                                        if report(&state, &e).await.is_err() {
                                            return;
                                        }
                                    },
                                }
                            },
                            UpdateKind::Message(msg) => {
                                if let Err(e) = handlers::handle_private_message(msg, &state).await
                                {
                                    error!(error = %e, "error answering telegram message");
                                    if report(&state, &e).await.is_err() {
                                        return;
                                    }
                                }
                            },
                            other => {
                                debug!("ignoring update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        error!("another instance is already polling with this bot token");
                        cancel.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    if report(&state, &e).await.is_err() {
                        return;
                    }
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(RETRY_DELAY) => {},
                    }
                },
            }
        }
        info!("telegram polling stopped");
    }))
}

/// Forward a transport failure to the pipeline. Fails once the pipeline is
/// gone, which ends the polling loop.
async fn report(state: &BotState, error: &impl std::fmt::Display) -> Result<(), Error> {
    let result = handlers::report_source_error(state, error.to_string()).await;
    if result.is_err() {
        warn!("relay pipeline closed, stopping telegram polling");
    }
    result
}
