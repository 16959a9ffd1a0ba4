//! Error types for the clip pipeline.
//!
//! Each stage recovers its own errors; none of these escape
//! [`Orchestrator::handle`](crate::Orchestrator::handle).

use std::time::Duration;

use thiserror::Error;

/// Browser session acquisition failures.
#[derive(Debug, Error)]
pub enum SessionError {
	#[error("no usable Chrome/Chromium executable found on this host")]
	BrowserUnavailable,

	#[error("browser session could not be started: {0}")]
	Launch(String),
}

/// Failures of a navigate-and-wait step.
#[derive(Debug, Error)]
pub enum NavigationError {
	#[error("timed out after {after:?} waiting for {condition}")]
	Timeout { after: Duration, condition: String },

	#[error("navigation failed: {0}")]
	Failed(String),
}

/// Messaging transport failure.
#[derive(Debug, Error)]
#[error("messaging request failed: {0}")]
pub struct ChannelError(pub String);

/// Failures of the download-and-forward relay.
#[derive(Debug, Error)]
pub enum RelayError {
	#[error("could not build HTTP client: {0}")]
	Client(#[source] reqwest::Error),

	#[error("could not create transient file: {0}")]
	TempFile(#[source] std::io::Error),

	#[error("media request failed: {0}")]
	Request(#[source] reqwest::Error),

	#[error("media origin answered {0}")]
	Status(reqwest::StatusCode),

	#[error("media transfer failed: {0}")]
	Transfer(#[source] std::io::Error),

	#[error("media origin returned an empty body")]
	EmptyBody,

	#[error("forwarding media failed: {0}")]
	Send(#[source] ChannelError),

	#[error("forwarding media timed out after {0:?}")]
	SendTimeout(Duration),
}
