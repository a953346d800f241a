//! Relay configuration: schema, JSON section persistence, and file locations.
//!
//! Settings live under the `telegram` key of a shared `config.json`; other
//! top-level keys belong to other components and are never touched.

pub mod error;
pub mod loader;
pub mod schema;
pub mod store;

pub use {
    error::{Error, Result},
    loader::{CONFIG_FILENAME, RelayPaths, STATS_FILENAME},
    schema::{DEFAULT_MAX_MESSAGE_LENGTH, DEFAULT_MESSAGE_DELAY_SECS, RelayConfig},
    store::{ConfigStore, JsonConfigStore, RELAY_SECTION, write_json},
};
