//! Administrator commands answered in private chats.

use chanrelay_forward::{StatusView, report};

/// A command sent to the bot in a private chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Start,
    Status,
    Stats,
    Help,
    Unknown,
}

impl AdminCommand {
    /// Parse the first word of `text`.
    ///
    /// `/cmd@botname` is accepted only when `botname` is `bot_username`
    /// (case-insensitive); commands addressed to other bots are `Unknown`.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Self {
        let Some(word) = text.split_whitespace().next() else {
            return Self::Unknown;
        };
        let Some(word) = word.strip_prefix('/') else {
            return Self::Unknown;
        };
        let (name, addressee) = match word.split_once('@') {
            Some((name, addressee)) => (name, Some(addressee)),
            None => (word, None),
        };
        if let (Some(addressee), Some(ours)) = (addressee, bot_username)
            && !addressee.eq_ignore_ascii_case(ours)
        {
            return Self::Unknown;
        }
        match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "status" => Self::Status,
            "stats" => Self::Stats,
            "help" => Self::Help,
            _ => Self::Unknown,
        }
    }

    /// Render the reply from the current relay state.
    pub fn reply(&self, status: &StatusView) -> String {
        match self {
            Self::Start => report::render_welcome(status.config()),
            Self::Status => report::render_status(status.config(), &status.stats()),
            Self::Stats => report::render_stats(&status.stats()),
            Self::Help => report::render_help(),
            Self::Unknown => report::UNKNOWN_COMMAND.to_string(),
        }
    }
}
