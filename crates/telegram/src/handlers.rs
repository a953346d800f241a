use {
    teloxide::prelude::*,
    tracing::{debug, info},
};

use {chanrelay_common::IncomingMessage, chanrelay_forward::RelayEvent};

use crate::{
    commands::AdminCommand,
    error::{Error, Result},
    state::BotState,
};

/// Convert a channel post into the relay's inbound event.
///
/// Returns `None` for non-channel chats and for posts without text or
/// caption (stickers, bare media).
pub fn channel_post_to_message(msg: &Message) -> Option<IncomingMessage> {
    if !msg.chat.is_channel() {
        return None;
    }
    let text = msg.text().or_else(|| msg.caption())?;
    Some(IncomingMessage::new(
        msg.chat.id.0.to_string(),
        msg.chat.title(),
        i64::from(msg.id.0),
        text,
    ))
}

/// Hand a channel post to the relay pipeline.
///
/// Waits for queue space, so posts reach the pipeline in receipt order.
pub async fn handle_channel_post(msg: Message, state: &BotState) -> Result<()> {
    let Some(incoming) = channel_post_to_message(&msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring channel post without text");
        return Ok(());
    };
    debug!(
        channel_id = %incoming.channel_id,
        message_id = incoming.message_id,
        "queueing channel post"
    );
    state
        .inbound
        .send(RelayEvent::Message(incoming))
        .await
        .map_err(|_| Error::PipelineClosed)
}

/// Tell the pipeline about a transport failure so it is counted as an error.
pub async fn report_source_error(state: &BotState, reason: impl Into<String>) -> Result<()> {
    state
        .inbound
        .send(RelayEvent::SourceError {
            reason: reason.into(),
        })
        .await
        .map_err(|_| Error::PipelineClosed)
}

/// Answer an admin command in a private chat. Other chats are ignored.
pub async fn handle_private_message(msg: Message, state: &BotState) -> Result<()> {
    if !msg.chat.is_private() || !state.admin_commands {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let command = AdminCommand::parse(text, state.bot_username.as_deref());
    info!(
        chat_id = msg.chat.id.0,
        sender = ?msg.from.as_ref().map(|u| u.id.0),
        ?command,
        "admin command"
    );
    state
        .bot
        .send_message(msg.chat.id, command.reply(&state.status))
        .await?;
    Ok(())
}
