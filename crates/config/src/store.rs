//! Persistence for [`RelayConfig`].
//!
//! The config document is shared with other components (the WhatsApp gateway
//! keeps its own settings in the same file), so only the relay's section is
//! ever read or replaced. Everything else is passed through verbatim.

use std::path::{Path, PathBuf};

use {
    serde_json::{Map, Value},
    tracing::{debug, info, warn},
};

use crate::{
    error::{Context, Error, Result},
    schema::RelayConfig,
};

/// Top-level key holding the relay settings.
pub const RELAY_SECTION: &str = "telegram";

/// Load/save seam for relay configuration.
pub trait ConfigStore: Send + Sync {
    /// Load the persisted config. An absent document or section yields
    /// defaults; an unreadable one is an error.
    fn try_load(&self) -> Result<RelayConfig>;

    /// Load the persisted config, falling back to defaults on any problem.
    fn load(&self) -> RelayConfig {
        self.try_load().unwrap_or_else(|e| {
            warn!(error = %e, "config load failed, using defaults");
            RelayConfig::default()
        })
    }

    /// Persist `config`. Callers log the error and carry on in memory.
    fn save(&self, config: &RelayConfig) -> Result<()>;
}

/// File-backed store that owns one named section of a JSON document.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
    section: String,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_section(path, RELAY_SECTION)
    }

    pub fn with_section(path: impl Into<PathBuf>, section: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            section: section.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document. `Ok(None)` when the file does not exist.
    fn read_document(&self) -> Result<Option<Map<String, Value>>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(Error::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }
}

impl ConfigStore for JsonConfigStore {
    fn try_load(&self) -> Result<RelayConfig> {
        let path = self.path.display().to_string();
        let Some(mut doc) = self.read_document()? else {
            debug!(path = %path, "config file not found, using defaults");
            return Ok(RelayConfig::default());
        };

        let Some(section) = doc.remove(&self.section) else {
            debug!(path = %path, section = %self.section, "config section missing, using defaults");
            return Ok(RelayConfig::default());
        };

        let mut config = serde_json::from_value::<RelayConfig>(section).map_err(|source| {
            Error::InvalidSection {
                path: self.path.clone(),
                section: self.section.clone(),
                source,
            }
        })?;
        config.normalize();
        info!(path = %path, section = %self.section, "relay config loaded");
        Ok(config)
    }

    fn load(&self) -> RelayConfig {
        self.try_load().unwrap_or_else(|e| {
            warn!(
                path = %self.path.display(),
                section = %self.section,
                error = %e,
                "config load failed, using defaults"
            );
            RelayConfig::default()
        })
    }

    fn save(&self, config: &RelayConfig) -> Result<()> {
        // A document we cannot parse may belong to someone else; refuse to
        // replace it wholesale.
        let mut doc = self.read_document()?.unwrap_or_default();
        doc.insert(self.section.clone(), serde_json::to_value(config)?);

        write_json(&self.path, &Value::Object(doc))?;
        info!(path = %self.path.display(), section = %self.section, "relay config saved");
        Ok(())
    }
}

/// Write `value` as pretty JSON, replacing `path` atomically.
///
/// The data goes to a sibling temp file first and is renamed into place, so a
/// crash mid-write leaves the previous document intact.
pub fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut data = serde_json::to_string_pretty(value)?;
    data.push('\n');

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
