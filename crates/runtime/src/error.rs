//! Error types for the browser runtime.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("Browser launch failed: {0}")]
	Launch(String),

	#[error("Transport error: {0}")]
	Transport(String),

	#[error("Protocol error {code}: {message}")]
	Protocol { code: i64, message: String },

	#[error("Connection closed before a response arrived")]
	ChannelClosed,

	#[error("Timed out: {0}")]
	Timeout(String),

	#[error("Navigation to {url} failed: {reason}")]
	Navigation { url: String, reason: String },

	#[error("Script evaluation failed: {0}")]
	Evaluation(String),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
