use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    /// The relay pipeline stopped accepting messages.
    #[error("relay pipeline is not accepting messages")]
    PipelineClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
