//! Per-request sequencing of the clip pipeline.
//!
//! A request walks `Received → Classified → TitleResolving → MediaResolving →
//! Relaying` and ends in `Done` or `Failed`. Whenever a status message was
//! created, exactly one of {delete it, edit it to the failure text} happens
//! before [`Orchestrator::handle`] returns.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::channel::{MessageRef, OutputChannel};
use crate::link::{ClipReference, classify};
use crate::relay::{StreamingRelay, compose_caption};
use crate::resolve::{MediaUrlResolver, Resolution, TitleResolver};

/// Default upper bound for one request, status message to final edit.
pub const REQUEST_BUDGET: Duration = Duration::from_secs(300);

pub const PROCESSING_TEXT: &str = "⏳ Processing clip…";
const MEDIA_NOT_FOUND_TEXT: &str = "❌ Could not find a video for this clip.";
const DOWNLOAD_ERROR_TEXT: &str = "❌ Failed to download or send the video.";
const PROCESS_ERROR_TEXT: &str = "❌ Something went wrong while processing the clip.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
	NotAClip,
	MediaNotFound,
	DownloadError,
	ProcessError,
}

impl FailureReason {
	/// Text the status message is edited to. `None` for requests that never
	/// created one.
	pub fn user_message(self) -> Option<&'static str> {
		match self {
			FailureReason::NotAClip => None,
			FailureReason::MediaNotFound => Some(MEDIA_NOT_FOUND_TEXT),
			FailureReason::DownloadError => Some(DOWNLOAD_ERROR_TEXT),
			FailureReason::ProcessError => Some(PROCESS_ERROR_TEXT),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
	Received,
	Classified,
	TitleResolving,
	MediaResolving,
	Relaying,
	Done,
	Failed(FailureReason),
}

impl RequestState {
	pub fn is_terminal(self) -> bool {
		matches!(self, RequestState::Done | RequestState::Failed(_))
	}
}

impl fmt::Display for RequestState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RequestState::Received => f.write_str("received"),
			RequestState::Classified => f.write_str("classified"),
			RequestState::TitleResolving => f.write_str("title-resolving"),
			RequestState::MediaResolving => f.write_str("media-resolving"),
			RequestState::Relaying => f.write_str("relaying"),
			RequestState::Done => f.write_str("done"),
			RequestState::Failed(reason) => write!(f, "failed({reason:?})"),
		}
	}
}

pub struct Orchestrator {
	titles: TitleResolver,
	media: MediaUrlResolver,
	relay: StreamingRelay,
	budget: Duration,
}

impl Orchestrator {
	pub fn new(titles: TitleResolver, media: MediaUrlResolver, relay: StreamingRelay) -> Self {
		Self {
			titles,
			media,
			relay,
			budget: REQUEST_BUDGET,
		}
	}

	pub fn with_budget(mut self, budget: Duration) -> Self {
		self.budget = budget;
		self
	}

	/// Runs one inbound message through the pipeline and returns its terminal
	/// state. Never fails; every error is reported to the user through
	/// `channel`.
	pub async fn handle(&self, channel: &dyn OutputChannel, text: &str) -> RequestState {
		let Some(clip) = classify(text) else {
			debug!(target = "clipr.orchestrator", "message is not a clip link");
			return RequestState::Failed(FailureReason::NotAClip);
		};
		debug!(target = "clipr.orchestrator", clip_id = %clip.clip_id, state = %RequestState::Classified, "request accepted");

		let status = match channel.send_text(PROCESSING_TEXT).await {
			Ok(status) => status,
			Err(e) => {
				warn!(target = "clipr.orchestrator", clip_id = %clip.clip_id, error = %e, "status message not sent");
				return RequestState::Failed(FailureReason::ProcessError);
			}
		};

		let stages = AssertUnwindSafe(self.run_stages(channel, &clip)).catch_unwind();
		let state = match tokio::time::timeout(self.budget, stages).await {
			Ok(Ok(state)) => state,
			Ok(Err(_)) => {
				warn!(target = "clipr.orchestrator", clip_id = %clip.clip_id, "request stage panicked");
				RequestState::Failed(FailureReason::ProcessError)
			}
			Err(_) => {
				warn!(target = "clipr.orchestrator", clip_id = %clip.clip_id, budget = ?self.budget, "request exceeded its budget");
				RequestState::Failed(FailureReason::ProcessError)
			}
		};

		finish(channel, status, state).await;
		info!(target = "clipr.orchestrator", clip_id = %clip.clip_id, %state, "request finished");
		state
	}

	async fn run_stages(&self, channel: &dyn OutputChannel, clip: &ClipReference) -> RequestState {
		debug!(target = "clipr.orchestrator", clip_id = %clip.clip_id, state = %RequestState::TitleResolving);
		let title = match self.titles.resolve_title(&clip.raw_url).await {
			Resolution::Found(title) => Some(title),
			Resolution::NotFound => {
				debug!(target = "clipr.orchestrator", clip_id = %clip.clip_id, "clip page has no title");
				None
			}
			Resolution::TransientError(e) => {
				warn!(target = "clipr.orchestrator", clip_id = %clip.clip_id, error = %e, "title lookup failed, continuing without");
				None
			}
		};

		debug!(target = "clipr.orchestrator", clip_id = %clip.clip_id, state = %RequestState::MediaResolving);
		let media_url = match self.media.resolve_media_url(&clip.clip_id).await {
			Resolution::Found(url) => url,
			Resolution::NotFound => {
				info!(target = "clipr.orchestrator", clip_id = %clip.clip_id, "no media url on embed page");
				return RequestState::Failed(FailureReason::MediaNotFound);
			}
			Resolution::TransientError(e) => {
				warn!(target = "clipr.orchestrator", clip_id = %clip.clip_id, error = %e, "media lookup failed");
				return RequestState::Failed(FailureReason::MediaNotFound);
			}
		};

		debug!(target = "clipr.orchestrator", clip_id = %clip.clip_id, state = %RequestState::Relaying, %media_url);
		let caption = compose_caption(title.as_deref(), &clip.raw_url);
		match self.relay.relay(channel, &media_url, &caption).await {
			Ok(_) => RequestState::Done,
			Err(_) => RequestState::Failed(FailureReason::DownloadError),
		}
	}
}

/// Deletes the status message on success, otherwise edits it to the failure
/// text. Errors here are only logged.
async fn finish(channel: &dyn OutputChannel, status: MessageRef, state: RequestState) {
	let outcome = match state {
		RequestState::Done => channel.delete_message(status).await,
		RequestState::Failed(reason) => channel.edit_text(status, reason.user_message().unwrap_or(PROCESS_ERROR_TEXT)).await,
		_ => return,
	};

	if let Err(e) = outcome {
		warn!(target = "clipr.orchestrator", message = status.0, error = %e, "status message not updated");
	}
}
