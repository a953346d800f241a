//! Relay config schema: the `telegram` section of the shared config document.
use std::{collections::BTreeSet, time::Duration};

use {
    serde::{Deserialize, Deserializer, Serialize},
    tracing::warn,
};

use crate::error::{Error, Result};

/// Default pause after each forward attempt, in seconds.
pub const DEFAULT_MESSAGE_DELAY_SECS: f64 = 1.0;

/// Default truncation boundary, in grapheme clusters.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 4000;

/// Forwarding rules for the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Master switch. Nothing is forwarded while this is off.
    pub enabled: bool,

    /// Channel ID allowlist. Empty means every channel is monitored.
    #[serde(deserialize_with = "deserialize_channel_ids")]
    pub monitored_channels: BTreeSet<String>,

    /// Case-insensitive substring filters. Empty means forward everything.
    #[serde(rename = "keywords_filter")]
    pub keyword_filters: Vec<String>,

    /// Pause after each forward attempt (seconds).
    #[serde(rename = "message_delay")]
    pub message_delay_secs: f64,

    /// Truncation boundary for forwarded text.
    pub max_message_length: usize,

    /// Keys in the section this version does not know about, kept so a save
    /// writes them back untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            monitored_channels: BTreeSet::new(),
            keyword_filters: Vec::new(),
            message_delay_secs: DEFAULT_MESSAGE_DELAY_SECS,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            extra: serde_json::Map::new(),
        }
    }
}

impl RelayConfig {
    /// Post-forward throttle as a [`Duration`].
    pub fn message_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.message_delay_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_MESSAGE_DELAY_SECS))
    }

    /// Replace out-of-range values with their defaults.
    ///
    /// Returns `true` when anything was changed.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        if !self.message_delay_secs.is_finite() || self.message_delay_secs < 0.0 {
            warn!(
                value = self.message_delay_secs,
                "invalid message_delay, using default"
            );
            self.message_delay_secs = DEFAULT_MESSAGE_DELAY_SECS;
            changed = true;
        }
        if self.max_message_length == 0 {
            warn!("max_message_length must be positive, using default");
            self.max_message_length = DEFAULT_MAX_MESSAGE_LENGTH;
            changed = true;
        }
        changed
    }

    /// Set a single field from its on-disk key and a textual value.
    ///
    /// List keys take comma-separated values; an empty value clears the list.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "enabled" => {
                self.enabled = parse_bool(value).ok_or_else(|| {
                    Error::invalid_value(key, format!("expected true/false, got {value:?}"))
                })?;
            },
            "monitored_channels" => {
                self.monitored_channels = split_list(value).collect();
            },
            "keywords_filter" => {
                self.keyword_filters = split_list(value).collect();
            },
            "message_delay" => {
                let secs: f64 = value
                    .trim()
                    .parse()
                    .map_err(|e| Error::invalid_value(key, e))?;
                if !secs.is_finite() || secs < 0.0 {
                    return Err(Error::invalid_value(key, "must be a non-negative number"));
                }
                self.message_delay_secs = secs;
            },
            "max_message_length" => {
                let len: usize = value
                    .trim()
                    .parse()
                    .map_err(|e| Error::invalid_value(key, e))?;
                if len == 0 {
                    return Err(Error::invalid_value(key, "must be positive"));
                }
                self.max_message_length = len;
            },
            _ => return Err(Error::UnknownKey { key: key.into() }),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accept channel IDs written either as strings or as bare integers.
fn deserialize_channel_ids<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<BTreeSet<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ChannelId {
        Text(String),
        Number(i64),
    }

    let ids = Vec::<ChannelId>::deserialize(deserializer)?;
    Ok(ids
        .into_iter()
        .map(|id| match id {
            ChannelId::Text(s) => s.trim().to_string(),
            ChannelId::Number(n) => n.to_string(),
        })
        .filter(|id| !id.is_empty())
        .collect())
}
