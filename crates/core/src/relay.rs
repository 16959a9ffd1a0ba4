//! Download-to-disk then forward.
//!
//! The media body is streamed into a transient file in fixed-size chunks so
//! memory stays bounded by the chunk size whatever the clip size. The file is
//! removed before [`StreamingRelay::relay`] returns, on every path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::TryStreamExt;
use tempfile::{NamedTempFile, TempPath};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

use crate::DESKTOP_USER_AGENT;
use crate::channel::{MediaOptions, OutputChannel};
use crate::error::RelayError;

/// Telegram's caption limit, in characters.
pub const CAPTION_LIMIT: usize = 1024;

#[derive(Debug, Clone)]
pub struct RelayConfig {
	pub user_agent: String,
	/// Connect and per-read timeout of the media request.
	pub request_timeout: Duration,
	pub chunk_size: usize,
	/// Upper bound for forwarding the finished file.
	pub send_timeout: Duration,
	/// Where transient files live; the system temp dir when `None`.
	pub temp_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
	fn default() -> Self {
		Self {
			user_agent: DESKTOP_USER_AGENT.to_string(),
			request_timeout: Duration::from_secs(60),
			chunk_size: 8 * 1024,
			send_timeout: Duration::from_secs(120),
			temp_dir: None,
		}
	}
}

/// Summary of a successful relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
	pub bytes: u64,
}

pub struct StreamingRelay {
	client: reqwest::Client,
	config: RelayConfig,
}

impl StreamingRelay {
	pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
		let client = reqwest::Client::builder()
			.user_agent(config.user_agent.clone())
			.connect_timeout(config.request_timeout)
			.read_timeout(config.request_timeout)
			.build()
			.map_err(RelayError::Client)?;
		Ok(Self { client, config })
	}

	/// Downloads `media_url` and forwards it through `channel` as one video
	/// message captioned with `caption`.
	pub async fn relay(&self, channel: &dyn OutputChannel, media_url: &str, caption: &str) -> Result<RelayReport, RelayError> {
		if let Err(e) = channel.send_upload_action().await {
			debug!(target = "clipr.relay", error = %e, "upload indicator not shown");
		}

		let (file, path) = self.create_transient()?;
		debug!(target = "clipr.relay", path = %path.display(), %media_url, "relay started");

		let outcome = self.download_and_forward(channel, media_url, caption, file, &path).await;

		let shown = path.display().to_string();
		if let Err(e) = path.close() {
			warn!(target = "clipr.relay", path = %shown, error = %e, "transient file not removed");
		}

		match &outcome {
			Ok(report) => info!(target = "clipr.relay", bytes = report.bytes, "media forwarded"),
			Err(e) => warn!(target = "clipr.relay", error = %e, %media_url, "relay failed"),
		}
		outcome
	}

	fn create_transient(&self) -> Result<(std::fs::File, TempPath), RelayError> {
		let mut builder = tempfile::Builder::new();
		builder.prefix("clipr-").suffix(".mp4");
		let file: NamedTempFile = match &self.config.temp_dir {
			Some(dir) => builder.tempfile_in(dir),
			None => builder.tempfile(),
		}
		.map_err(RelayError::TempFile)?;
		Ok(file.into_parts())
	}

	async fn download_and_forward(
		&self,
		channel: &dyn OutputChannel,
		media_url: &str,
		caption: &str,
		file: std::fs::File,
		path: &Path,
	) -> Result<RelayReport, RelayError> {
		let bytes = self.download(media_url, file).await?;
		if bytes == 0 {
			return Err(RelayError::EmptyBody);
		}

		let options = MediaOptions { supports_streaming: true };
		match tokio::time::timeout(self.config.send_timeout, channel.send_video(path, caption, options)).await {
			Ok(Ok(())) => Ok(RelayReport { bytes }),
			Ok(Err(e)) => Err(RelayError::Send(e)),
			Err(_) => Err(RelayError::SendTimeout(self.config.send_timeout)),
		}
	}

	/// Streams the response body into `file`; the file is closed on return.
	async fn download(&self, media_url: &str, file: std::fs::File) -> Result<u64, RelayError> {
		let response = self.client.get(media_url).send().await.map_err(RelayError::Request)?;
		let status = response.status();
		if !status.is_success() {
			return Err(RelayError::Status(status));
		}

		let body = response.bytes_stream().map_err(std::io::Error::other);
		let reader = StreamReader::new(body);
		tokio::pin!(reader);

		let mut file = tokio::fs::File::from_std(file);
		let mut chunk = vec![0u8; self.config.chunk_size.max(1)];
		let mut written = 0u64;
		loop {
			let read = reader.read(&mut chunk).await.map_err(RelayError::Transfer)?;
			if read == 0 {
				break;
			}
			file.write_all(&chunk[..read]).await.map_err(RelayError::Transfer)?;
			written += read as u64;
		}

		file.flush().await.map_err(RelayError::Transfer)?;
		file.sync_all().await.map_err(RelayError::Transfer)?;
		Ok(written)
	}
}

/// Caption of a relayed clip: the title (when known) above the clip link.
///
/// The title is shortened so the caption stays within [`CAPTION_LIMIT`].
/// A clip URL that alone exceeds the limit is shortened too.
pub fn compose_caption(title: Option<&str>, clip_url: &str) -> String {
	if clip_url.chars().count() > CAPTION_LIMIT {
		return shorten(clip_url, CAPTION_LIMIT);
	}

	let title = title.map(str::trim).filter(|title| !title.is_empty());
	let Some(title) = title else {
		return clip_url.to_string();
	};

	let budget = CAPTION_LIMIT.saturating_sub(clip_url.chars().count() + 1);
	if title.chars().count() <= budget {
		return format!("{title}\n{clip_url}");
	}
	if budget < 2 {
		return clip_url.to_string();
	}

	format!("{}\n{clip_url}", shorten(title, budget))
}

/// Cuts `text` to at most `limit` characters, ending in `…`.
fn shorten(text: &str, limit: usize) -> String {
	let kept: String = text.chars().take(limit.saturating_sub(1)).collect();
	format!("{}…", kept.trim_end())
}

#[cfg(test)]
mod tests {
	use super::*;

	const URL: &str = "https://www.faceit.com/en/players/someone/videos/abc123";

	#[test]
	fn caption_puts_title_above_link() {
		assert_eq!(compose_caption(Some("Ace on Mirage"), URL), format!("Ace on Mirage\n{URL}"));
	}

	#[test]
	fn caption_without_title_is_link() {
		assert_eq!(compose_caption(None, URL), URL);
		assert_eq!(compose_caption(Some("   "), URL), URL);
	}

	#[test]
	fn long_title_is_shortened_to_fit() {
		let title = "x".repeat(2000);
		let caption = compose_caption(Some(&title), URL);
		assert_eq!(caption.chars().count(), CAPTION_LIMIT);
		assert!(caption.ends_with(&format!("…\n{URL}")));
	}

	#[test]
	fn oversized_link_is_shortened_to_limit() {
		let url = format!("https://www.faceit.com/en/players/someone/videos/{}", "a".repeat(1100));
		for title in [None, Some("Ace")] {
			let caption = compose_caption(title, &url);
			assert_eq!(caption.chars().count(), CAPTION_LIMIT);
			assert!(caption.ends_with('…'));
			assert!(!caption.contains('\n'));
		}
	}

	#[test]
	fn defaults_match_relay_contract() {
		let config = RelayConfig::default();
		assert_eq!(config.chunk_size, 8192);
		assert_eq!(config.request_timeout, Duration::from_secs(60));
		assert_eq!(config.send_timeout, Duration::from_secs(120));
	}
}
