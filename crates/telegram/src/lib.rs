//! Telegram side of the relay.
//!
//! Long-polls the Bot API with teloxide, hands channel posts to the
//! forwarding pipeline, and answers admin commands in private chats.

pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use {
    bot::start_polling,
    config::TelegramBotConfig,
    error::{Error, Result},
};
