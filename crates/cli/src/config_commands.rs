use {anyhow::Result, clap::Subcommand};

use chanrelay_config::{ConfigStore, RelayConfig, RelayPaths};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the relay section of the config file.
    Show,
    /// Set one relay setting (takes effect on the next `run`).
    Set {
        /// On-disk key: enabled, monitored_channels, keywords_filter,
        /// message_delay or max_message_length.
        key: String,
        /// New value. Lists are comma-separated; an empty string clears them.
        value: String,
    },
    /// Print the config file location.
    Path,
}

pub fn handle_config(action: ConfigAction, paths: &RelayPaths) -> Result<()> {
    let store = paths.config_store();
    match action {
        ConfigAction::Show => println!("{}", show(&store)?),
        ConfigAction::Set { key, value } => {
            set(&store, &key, &value)?;
            eprintln!("Updated {key} in {}", store.path().display());
            eprintln!("Restart the relay for the change to take effect.");
        },
        ConfigAction::Path => println!("{}", store.path().display()),
    }
    Ok(())
}

fn show(store: &impl ConfigStore) -> Result<String> {
    Ok(serde_json::to_string_pretty(&store.try_load()?)?)
}

/// Change one key and save. An unreadable section is reported instead of
/// being replaced by defaults.
fn set(store: &impl ConfigStore, key: &str, value: &str) -> Result<RelayConfig> {
    let mut config = store.try_load()?;
    config.set_key(key, value)?;
    store.save(&config)?;
    Ok(config)
}
