/// Fallback reason when the destination gives none.
pub const UNKNOWN_REASON: &str = "unknown error";

/// Per-message pipeline faults, and setup errors for the forwarding client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid forward endpoint {url}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("invalid message: {message}")]
    InvalidMessage { message: String },

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
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A failed delivery to the destination API.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("forward request timed out")]
    Timeout,

    #[error("forward request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("destination returned HTTP {status}: {}", .message.as_deref().unwrap_or(UNKNOWN_REASON))]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("destination rejected message: {}", .message.as_deref().unwrap_or(UNKNOWN_REASON))]
    Rejected { message: Option<String> },

    #[error("malformed response from destination: {source}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
    },
}

impl ForwardError {
    /// The destination-provided reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ForwardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e)
        }
    }
}
