//! Direct media URL lookup from the clip viewer embed.
//!
//! The embed renders its player client-side, so the `<video>` source only
//! exists after the page ran in a real browser.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{RESOLVE_TIMEOUT, Resolution};
use crate::error::NavigationError;
use crate::session::{PageSessionManager, SessionLease, WaitCondition};

/// Viewer embed; `{clip_id}` is replaced by the query-encoded identifier.
pub const DEFAULT_EMBED_TEMPLATE: &str = "https://allstar.gg/iframe?clip={clip_id}";
pub const MEDIA_TAG: &str = "video";
pub const MEDIA_EXTENSION: &str = ".mp4";

const READY_STATE_EXPRESSION: &str = "document.readyState === 'complete'";

/// Expression listing the resolved `src` of every `tag` element in document
/// order.
pub fn sources_expression(tag: &str) -> String {
	format!(
		"Array.from(document.getElementsByTagName({})).map(el => el.src || '')",
		Value::String(tag.to_string())
	)
}

/// `true` for absolute http(s) URLs whose raw value ends in `extension`.
///
/// The match is exact: a query string, fragment or different case after the
/// extension disqualifies the candidate.
pub fn is_direct_media_url(candidate: &str, extension: &str) -> bool {
	let Ok(url) = Url::parse(candidate) else {
		return false;
	};
	matches!(url.scheme(), "http" | "https") && candidate.ends_with(extension)
}

/// First direct media URL in document order.
pub fn select_media_url<'a, I>(sources: I, extension: &str) -> Option<&'a str>
where
	I: IntoIterator<Item = &'a str>,
{
	sources.into_iter().find(|source| is_direct_media_url(source, extension))
}

pub struct MediaUrlResolver {
	sessions: Arc<PageSessionManager>,
	embed_template: String,
	timeout: Duration,
}

impl MediaUrlResolver {
	pub fn new(sessions: Arc<PageSessionManager>) -> Self {
		Self {
			sessions,
			embed_template: DEFAULT_EMBED_TEMPLATE.to_string(),
			timeout: RESOLVE_TIMEOUT,
		}
	}

	pub fn with_embed_template(mut self, template: impl Into<String>) -> Self {
		self.embed_template = template.into();
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn embed_url(&self, clip_id: &str) -> String {
		let encoded: String = url::form_urlencoded::byte_serialize(clip_id.as_bytes()).collect();
		self.embed_template.replace("{clip_id}", &encoded)
	}

	/// Renders the viewer embed for `clip_id` and returns the first direct
	/// media source.
	pub async fn resolve_media_url(&self, clip_id: &str) -> Resolution<String> {
		let lease = match self.sessions.acquire().await {
			Ok(lease) => lease,
			Err(e) => return Resolution::TransientError(e.to_string()),
		};

		let embed_url = self.embed_url(clip_id);
		let condition = WaitCondition::TagPresent(MEDIA_TAG.to_string());
		if let Err(e) = lease.navigate_and_wait_for(&embed_url, &condition, self.timeout).await {
			if matches!(e, NavigationError::Timeout { .. }) && document_loaded(&lease).await {
				debug!(target = "clipr.resolve", %embed_url, "embed loaded without a media element");
				return Resolution::NotFound;
			}
			return Resolution::TransientError(e.to_string());
		}

		let sources = match lease.evaluate(&sources_expression(MEDIA_TAG)).await {
			Ok(Value::Array(values)) => values,
			Ok(other) => return Resolution::TransientError(format!("unexpected media source listing: {other}")),
			Err(e) => return Resolution::TransientError(e.to_string()),
		};

		let candidates = sources.iter().filter_map(Value::as_str);
		match select_media_url(candidates, MEDIA_EXTENSION) {
			Some(media_url) => {
				debug!(target = "clipr.resolve", %media_url, candidates = sources.len(), "media url resolved");
				Resolution::Found(media_url.to_string())
			}
			None => Resolution::NotFound,
		}
	}
}

async fn document_loaded(lease: &SessionLease) -> bool {
	matches!(lease.evaluate(READY_STATE_EXPRESSION).await, Ok(Value::Bool(true)))
}
