use {chanrelay_common::FromMessage, std::path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// The document exists but its root is not a JSON object, so there is no
    /// section to merge into.
    #[error("config document {} is not a JSON object", path.display())]
    NotAnObject { path: PathBuf },

    /// The relay's section exists but does not match the schema.
    #[error("invalid {section} section in {}: {source}", path.display())]
    InvalidSection {
        path: PathBuf,
        section: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown config key: {key}")]
    UnknownKey { key: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_value(key: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

chanrelay_common::impl_context!();
