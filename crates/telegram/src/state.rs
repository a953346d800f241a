use {
    chanrelay_forward::{RelayEvent, StatusView},
    tokio::sync::mpsc,
};

/// Everything the update handlers need, shared by the polling loop.
#[derive(Clone)]
pub struct BotState {
    pub bot: teloxide::Bot,
    /// Our own username; commands addressed to other bots are not answered.
    pub bot_username: Option<String>,
    /// Feeds channel posts and transport errors to the relay pipeline, in
    /// receipt order.
    pub inbound: mpsc::Sender<RelayEvent>,
    /// Read-only relay state for admin commands.
    pub status: StatusView,
    pub admin_commands: bool,
}
