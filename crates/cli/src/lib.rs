//! Telegram front end for the clip pipeline.

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod telegram;

pub use config::{Config, ConfigError};
pub use dispatch::{BotState, Command};
pub use telegram::TelegramChannel;
