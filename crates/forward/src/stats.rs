//! Relay counters and their persistence.

use std::path::{Path, PathBuf};

use {
    chrono::{DateTime, NaiveDateTime, Utc},
    serde::{Deserialize, Deserializer, Serialize},
    tracing::{debug, warn},
};

use chanrelay_config::write_json;

/// Counters describing what the relay has done since the stats file was
/// created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayStats {
    pub messages_received: u64,
    pub messages_forwarded: u64,
    pub messages_filtered: u64,
    pub errors: u64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl RelayStats {
    pub fn record_received(&mut self, at: DateTime<Utc>) {
        self.messages_received = self.messages_received.saturating_add(1);
        self.last_activity = Some(at);
    }

    pub fn record_forwarded(&mut self) {
        self.messages_forwarded = self.messages_forwarded.saturating_add(1);
    }

    pub fn record_filtered(&mut self) {
        self.messages_filtered = self.messages_filtered.saturating_add(1);
    }

    pub fn record_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
    }
}

/// Accept RFC 3339 timestamps and naive ISO timestamps (taken as UTC).
/// Anything unreadable becomes `None` rather than failing the whole file.
fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    match raw.parse::<NaiveDateTime>() {
        Ok(naive) => Ok(Some(naive.and_utc())),
        Err(e) => {
            warn!(value = %raw, error = %e, "ignoring unreadable last_activity");
            Ok(None)
        },
    }
}

/// Load/save seam for relay counters.
pub trait StatsStore: Send + Sync {
    /// Load persisted counters, falling back to zeroes on any problem.
    fn load(&self) -> RelayStats;

    /// Persist `stats`, replacing whatever was stored.
    fn save(&self, stats: &RelayStats) -> chanrelay_config::Result<()>;
}

/// Stats in a standalone JSON file owned by the relay.
#[derive(Debug, Clone)]
pub struct JsonStatsStore {
    path: PathBuf,
}

impl JsonStatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsStore for JsonStatsStore {
    fn load(&self) -> RelayStats {
        let path = self.path.display().to_string();
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path, "stats file not found, starting from zero");
                return RelayStats::default();
            },
            Err(e) => {
                warn!(path = %path, error = %e, "stats file read failed, starting from zero");
                return RelayStats::default();
            },
        };

        match serde_json::from_str(&data) {
            Ok(stats) => stats,
            Err(e) => {
                warn!(path = %path, error = %e, "stats file parse failed, starting from zero");
                RelayStats::default()
            },
        }
    }

    fn save(&self, stats: &RelayStats) -> chanrelay_config::Result<()> {
        write_json(&self.path, stats)
    }
}
