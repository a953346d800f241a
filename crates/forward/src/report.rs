//! Human-readable snapshots of relay state for administrators.

use std::sync::Arc;

use {chanrelay_config::RelayConfig, tokio::sync::watch};

use crate::stats::RelayStats;

/// Read-only view of the running pipeline's state.
#[derive(Debug, Clone)]
pub struct StatusView {
    config: Arc<RelayConfig>,
    stats: watch::Receiver<RelayStats>,
}

impl StatusView {
    pub fn new(config: Arc<RelayConfig>, stats: watch::Receiver<RelayStats>) -> Self {
        Self { config, stats }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Latest stats published by the pipeline.
    pub fn stats(&self) -> RelayStats {
        self.stats.borrow().clone()
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

pub fn render_welcome(config: &RelayConfig) -> String {
    format!(
        "Channel relay bot\n\n\
         Commands:\n\
         /status - relay status\n\
         /stats - message counters\n\
         /help - setup guide\n\n\
         Forwarding: {}",
        on_off(config.enabled)
    )
}

pub fn render_status(config: &RelayConfig, stats: &RelayStats) -> String {
    let last_activity = stats
        .last_activity
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "Relay status\n\n\
         Forwarding: {}\n\
         Monitored channels: {}\n\
         Keyword filters: {}\n\
         Last activity: {last_activity}",
        on_off(config.enabled),
        if config.monitored_channels.is_empty() {
            "all".to_string()
        } else {
            config.monitored_channels.len().to_string()
        },
        config.keyword_filters.len(),
    )
}

pub fn render_stats(stats: &RelayStats) -> String {
    format!(
        "Relay statistics\n\n\
         Received: {}\n\
         Forwarded: {}\n\
         Filtered: {}\n\
         Errors: {}",
        stats.messages_received, stats.messages_forwarded, stats.messages_filtered, stats.errors
    )
}

pub fn render_help() -> String {
    "Setup guide\n\n\
     1. Add the bot as an administrator of the channel to monitor.\n\
     2. Enable forwarding: chanrelay config set enabled true\n\
     3. Make sure the destination gateway is running and linked.\n\
     4. Optional: restrict channels (monitored_channels) or add keyword filters (keywords_filter).\n\n\
     Config changes take effect after a restart."
        .to_string()
}

pub const UNKNOWN_COMMAND: &str = "Unknown command. Use /help for help.";

#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone};

    #[test]
    fn status_reports_counts_and_activity() {
        let config = RelayConfig {
            enabled: true,
            monitored_channels: ["-1".to_string(), "-2".to_string()].into(),
            keyword_filters: vec!["promo".into()],
            ..Default::default()
        };
        let stats = RelayStats {
            last_activity: Some(chrono::Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap()),
            ..Default::default()
        };
        let text = render_status(&config, &stats);
        assert!(text.contains("Forwarding: enabled"));
        assert!(text.contains("Monitored channels: 2"));
        assert!(text.contains("Keyword filters: 1"));
        assert!(text.contains("Last activity: 2025-06-01 08:30:00 UTC"));
    }

    #[test]
    fn status_with_empty_allowlist_says_all() {
        let text = render_status(&RelayConfig::default(), &RelayStats::default());
        assert!(text.contains("Forwarding: disabled"));
        assert!(text.contains("Monitored channels: all"));
        assert!(text.contains("Last activity: none"));
    }

    #[test]
    fn stats_lists_every_counter() {
        let stats = RelayStats {
            messages_received: 10,
            messages_forwarded: 6,
            messages_filtered: 3,
            errors: 1,
            last_activity: None,
        };
        let text = render_stats(&stats);
        for line in ["Received: 10", "Forwarded: 6", "Filtered: 3", "Errors: 1"] {
            assert!(text.contains(line), "missing {line:?} in {text}");
        }
    }

    #[test]
    fn view_reflects_published_stats() {
        let (tx, rx) = watch::channel(RelayStats::default());
        let view = StatusView::new(Arc::new(RelayConfig::default()), rx);
        tx.send_replace(RelayStats {
            errors: 4,
            ..Default::default()
        });
        assert_eq!(view.stats().errors, 4);
    }
}
