//! Environment configuration.
//!
//! Values come from the process environment after an optional `.env` file
//! has been merged in by `main`. Blank values count as unset.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const API_SERVER_VAR: &str = "API_SERVER";
pub const LOG_FILE_VAR: &str = "CLIPR_LOG_FILE";
pub const BROWSER_VAR: &str = "CLIPR_BROWSER";

pub const DEFAULT_LOG_FILE: &str = "bot_debug.log";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("{TOKEN_VAR} is not set")]
	MissingToken,

	#[error("{API_SERVER_VAR} is not a valid URL ({value}): {source}")]
	InvalidApiServer {
		value: String,
		#[source]
		source: url::ParseError,
	},
}

#[derive(Clone)]
pub struct Config {
	pub token: String,
	/// Alternate Bot API base, e.g. a self-hosted Bot API server.
	pub api_server: Option<Url>,
	pub log_file: PathBuf,
	/// Skips browser discovery when set.
	pub browser: Option<PathBuf>,
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

		let token = get(TOKEN_VAR).ok_or(ConfigError::MissingToken)?;
		let api_server = match get(API_SERVER_VAR) {
			Some(value) => Some(Url::parse(&value).map_err(|source| ConfigError::InvalidApiServer { value, source })?),
			None => None,
		};

		Ok(Self {
			token,
			api_server,
			log_file: get(LOG_FILE_VAR).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
			browser: get(BROWSER_VAR).map(PathBuf::from),
		})
	}

	/// Human-readable Bot API base for usage texts and logs.
	pub fn api_base(&self) -> String {
		match &self.api_server {
			Some(url) => format!("custom Bot API server at {url}"),
			None => "official Bot API (api.telegram.org)".to_string(),
		}
	}
}

impl fmt::Debug for Config {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Config")
			.field("token", &"<redacted>")
			.field("api_server", &self.api_server.as_ref().map(Url::as_str))
			.field("log_file", &self.log_file)
			.field("browser", &self.browser)
			.finish()
	}
}

/// Log file location, readable before the rest of the configuration so
/// configuration errors can be logged.
pub fn log_file_from_env() -> PathBuf {
	std::env::var(LOG_FILE_VAR)
		.ok()
		.map(|value| value.trim().to_string())
		.filter(|value| !value.is_empty())
		.map(PathBuf::from)
		.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}
