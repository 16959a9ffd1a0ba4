//! Clip title lookup from the public clip page.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::{RESOLVE_TIMEOUT, Resolution};
use crate::session::{PageSessionManager, WaitCondition};

pub const TITLE_EXPRESSION: &str = "document.title";

pub struct TitleResolver {
	sessions: Arc<PageSessionManager>,
	timeout: Duration,
}

impl TitleResolver {
	pub fn new(sessions: Arc<PageSessionManager>) -> Self {
		Self {
			sessions,
			timeout: RESOLVE_TIMEOUT,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// Renders `clip_url` and reads the document title.
	pub async fn resolve_title(&self, clip_url: &str) -> Resolution<String> {
		let lease = match self.sessions.acquire().await {
			Ok(lease) => lease,
			Err(e) => return Resolution::TransientError(e.to_string()),
		};

		if let Err(e) = lease
			.navigate_and_wait_for(clip_url, &WaitCondition::DocumentReadyOrTitle, self.timeout)
			.await
		{
			return Resolution::TransientError(e.to_string());
		}

		match lease.evaluate(TITLE_EXPRESSION).await {
			Ok(Value::String(title)) if !title.trim().is_empty() => {
				debug!(target = "clipr.resolve", title = %title.trim(), "title resolved");
				Resolution::Found(title.trim().to_string())
			}
			Ok(_) => Resolution::NotFound,
			Err(e) => Resolution::TransientError(e.to_string()),
		}
	}
}
