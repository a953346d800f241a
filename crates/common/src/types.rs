use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// A new post observed in a source channel, as handed to the relay pipeline.
///
/// Produced by the inbound transport; the pipeline never sees platform types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub channel_id: String,
    pub channel_name: String,
    pub message_id: i64,
    /// Message text, or the caption for media posts.
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    /// Build a message stamped with the current time.
    ///
    /// A missing or blank channel title falls back to `Channel <id>`.
    pub fn new(
        channel_id: impl Into<String>,
        channel_name: Option<&str>,
        message_id: i64,
        text: impl Into<String>,
    ) -> Self {
        let channel_id = channel_id.into();
        let channel_name = match channel_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Channel {channel_id}"),
        };
        Self {
            channel_id,
            channel_name,
            message_id,
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    /// True when there is nothing to relay.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
