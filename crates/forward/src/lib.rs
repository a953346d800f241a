//! The forwarding pipeline.
//!
//! Decides whether a channel post is relayed ([`filter`]), shapes it for the
//! destination ([`format`]), delivers it over HTTP ([`client`]), and keeps the
//! durable counters ([`stats`]). [`pipeline::RelayPipeline`] ties the stages
//! together and owns all mutable state.

pub mod client;
pub mod error;
pub mod filter;
pub mod format;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use {
    client::{DEFAULT_FORWARD_URL, FORWARD_TIMEOUT, ForwardRequest, ForwardingClient},
    error::{Error, ForwardError, Result},
    pipeline::{Outcome, RelayEvent, RelayPipeline},
    report::StatusView,
    stats::{JsonStatsStore, RelayStats, StatsStore},
};
