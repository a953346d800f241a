//! Per-message orchestration: count, gate, filter, format, deliver, persist.
//!
//! The pipeline is the single writer of relay state. It handles one message at
//! a time (`&mut self`), so counters need no locking; readers get snapshots
//! through [`StatusView`].

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use {
    chrono::Utc,
    futures::FutureExt,
    tokio::sync::{mpsc, watch},
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info},
};

use {chanrelay_common::IncomingMessage, chanrelay_config::RelayConfig};

use crate::{
    client::{ForwardRequest, ForwardingClient},
    error::{Error, ForwardError, Result},
    filter, format,
    report::StatusView,
    stats::{RelayStats, StatsStore},
};

/// How a single message left the pipeline.
#[derive(Debug)]
pub enum Outcome {
    /// No text; dropped before any bookkeeping.
    Ignored,
    /// Channel is not on the allowlist. Counted as received only.
    NotMonitored,
    /// Relay disabled or no keyword matched.
    Filtered,
    Delivered,
    DeliveryFailed(ForwardError),
}

/// What the inbound transport feeds the pipeline.
#[derive(Debug)]
pub enum RelayEvent {
    Message(IncomingMessage),
    /// The transport failed outside any single message (polling, replies).
    /// Counted as an error.
    SourceError { reason: String },
}

impl From<IncomingMessage> for RelayEvent {
    fn from(message: IncomingMessage) -> Self {
        Self::Message(message)
    }
}

impl Outcome {
    /// Whether a forward was attempted, which is what the throttle applies to.
    pub fn attempted_delivery(&self) -> bool {
        matches!(self, Self::Delivered | Self::DeliveryFailed(_))
    }

    fn touched_stats(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

pub struct RelayPipeline {
    config: Arc<RelayConfig>,
    stats: RelayStats,
    client: ForwardingClient,
    stats_store: Arc<dyn StatsStore>,
    stats_tx: watch::Sender<RelayStats>,
}

impl RelayPipeline {
    pub fn new(
        config: RelayConfig,
        stats: RelayStats,
        client: ForwardingClient,
        stats_store: Arc<dyn StatsStore>,
    ) -> Self {
        let (stats_tx, _) = watch::channel(stats.clone());
        Self {
            config: Arc::new(config),
            stats,
            client,
            stats_store,
            stats_tx,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// A read-only handle that keeps tracking stats while the pipeline runs.
    pub fn status_view(&self) -> StatusView {
        StatusView::new(Arc::clone(&self.config), self.stats_tx.subscribe())
    }

    /// Consume events in receipt order until the sender side closes or
    /// `cancel` fires, then flush stats. Returns the final counters.
    pub async fn run(
        mut self,
        mut inbound: mpsc::Receiver<RelayEvent>,
        cancel: CancellationToken,
    ) -> RelayStats {
        info!(
            enabled = self.config.enabled,
            endpoint = %self.client.endpoint(),
            "relay pipeline started"
        );

        loop {
            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = inbound.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let message = match event {
                RelayEvent::Message(message) => message,
                RelayEvent::SourceError { reason } => {
                    self.record_source_error(&reason);
                    continue;
                },
            };
            let outcome = self.handle(message).await;
            if outcome.as_ref().is_some_and(Outcome::attempted_delivery) {
                self.throttle(&cancel).await;
            }
        }

        self.persist_stats();
        info!(
            received = self.stats.messages_received,
            forwarded = self.stats.messages_forwarded,
            filtered = self.stats.messages_filtered,
            errors = self.stats.errors,
            "relay pipeline stopped"
        );
        self.stats
    }

    /// Run one message through the pipeline without ever failing the caller.
    ///
    /// Stage errors and panics are counted as errors, persisted, and logged;
    /// `None` is returned for them.
    pub async fn handle(&mut self, message: IncomingMessage) -> Option<Outcome> {
        let result = AssertUnwindSafe(self.process(&message))
            .catch_unwind()
            .await;

        let err = match result {
            Ok(Ok(outcome)) => {
                if outcome.touched_stats() {
                    self.persist_stats();
                }
                return Some(outcome);
            },
            Ok(Err(e)) => e,
            Err(panic) => Error::message(format!("panic: {}", panic_message(panic.as_ref()))),
        };

        error!(
            channel_id = %message.channel_id,
            message_id = message.message_id,
            error = %err,
            "failed to process channel message"
        );
        self.stats.record_error();
        self.persist_stats();
        None
    }

    /// Count a transport failure reported by the inbound side.
    pub fn record_source_error(&mut self, reason: &str) {
        error!(reason, "inbound transport error");
        self.stats.record_error();
        self.persist_stats();
    }

    async fn process(&mut self, message: &IncomingMessage) -> Result<Outcome> {
        if message.is_empty() {
            debug!(channel_id = %message.channel_id, "ignoring message without text");
            return Ok(Outcome::Ignored);
        }

        self.stats.record_received(Utc::now());

        if !filter::is_monitored(&self.config, &message.channel_id) {
            debug!(
                channel_id = %message.channel_id,
                channel = %message.channel_name,
                "ignoring message from unmonitored channel"
            );
            return Ok(Outcome::NotMonitored);
        }

        if !filter::should_forward(&self.config, &message.text) {
            info!(channel = %message.channel_name, "message filtered");
            self.stats.record_filtered();
            return Ok(Outcome::Filtered);
        }

        let text = format::format_message(&message.text, self.config.max_message_length);
        let request = ForwardRequest::from_message(message, text)?;
        info!(
            channel = %request.channel_name,
            preview = %format::format_message(&request.text, 100),
            "new channel message"
        );

        match self.client.forward(&request, &mut self.stats).await {
            Ok(()) => Ok(Outcome::Delivered),
            Err(e) => Ok(Outcome::DeliveryFailed(e)),
        }
    }

    /// Pause after a forward attempt. Cut short by shutdown.
    async fn throttle(&self, cancel: &CancellationToken) {
        let delay = self.config.message_delay();
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            () = cancel.cancelled() => {},
            () = tokio::time::sleep(delay) => {},
        }
    }

    /// Save and publish the current counters. Save failures are logged; the
    /// in-memory counters stay authoritative.
    fn persist_stats(&self) {
        if let Err(e) = self.stats_store.save(&self.stats) {
            error!(error = %e, "failed to save relay stats");
        }
        self.stats_tx.send_replace(self.stats.clone());
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
