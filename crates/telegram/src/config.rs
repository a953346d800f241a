use secrecy::{ExposeSecret, Secret};

/// Long-polling timeout sent to `getUpdates`, in seconds.
pub const DEFAULT_POLL_TIMEOUT_SECS: u32 = 30;

/// Connection settings for the relay's Telegram bot.
#[derive(Clone)]
pub struct TelegramBotConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,

    /// Long-polling timeout for `getUpdates` (seconds).
    pub poll_timeout_secs: u32,

    /// Answer `/status`, `/stats` and `/help` in private chats.
    pub admin_commands: bool,
}

impl TelegramBotConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Secret::new(token.into()),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            admin_commands: true,
        }
    }

    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for TelegramBotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBotConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("admin_commands", &self.admin_commands)
            .finish()
    }
}
