//! Outbound messaging seam.
//!
//! An [`OutputChannel`] is bound to one conversation; message references are
//! only meaningful within it.

use std::path::Path;

use async_trait::async_trait;

use crate::error::ChannelError;

/// Identifier of a message previously sent through the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(pub i32);

/// Transport hints for media messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaOptions {
	pub supports_streaming: bool,
}

#[async_trait]
pub trait OutputChannel: Send + Sync {
	async fn send_text(&self, text: &str) -> Result<MessageRef, ChannelError>;

	async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), ChannelError>;

	async fn delete_message(&self, message: MessageRef) -> Result<(), ChannelError>;

	/// Shows the "uploading video" indicator.
	async fn send_upload_action(&self) -> Result<(), ChannelError>;

	/// Sends the file at `path` as a single video message.
	async fn send_video(&self, path: &Path, caption: &str, options: MediaOptions) -> Result<(), ChannelError>;
}
