//! Telegram side of the [`OutputChannel`] seam.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use clipr::{ChannelError, MediaOptions, MessageRef, OutputChannel};
use teloxide::payloads::SendVideoSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, MessageId};

use crate::config::Config;

/// HTTP timeout of Bot API calls; above the relay's send timeout so the
/// relay reports the stall first.
pub const BOT_API_TIMEOUT: Duration = Duration::from_secs(130);

/// Builds the bot client against the official or the configured Bot API.
pub fn build_bot(config: &Config) -> anyhow::Result<Bot> {
	let client = teloxide::net::default_reqwest_settings().timeout(BOT_API_TIMEOUT).build()?;
	let bot = Bot::with_client(config.token.clone(), client);
	Ok(match &config.api_server {
		Some(url) => bot.set_api_url(url.clone()),
		None => bot,
	})
}

/// One chat, addressed through the Bot API.
#[derive(Clone)]
pub struct TelegramChannel {
	bot: Bot,
	chat_id: ChatId,
}

impl TelegramChannel {
	pub fn new(bot: Bot, chat_id: ChatId) -> Self {
		Self { bot, chat_id }
	}

	pub fn chat_id(&self) -> ChatId {
		self.chat_id
	}
}

fn channel_error(error: teloxide::RequestError) -> ChannelError {
	ChannelError(error.to_string())
}

#[async_trait]
impl OutputChannel for TelegramChannel {
	async fn send_text(&self, text: &str) -> Result<MessageRef, ChannelError> {
		let message = self.bot.send_message(self.chat_id, text).await.map_err(channel_error)?;
		Ok(MessageRef(message.id.0))
	}

	async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), ChannelError> {
		self.bot
			.edit_message_text(self.chat_id, MessageId(message.0), text)
			.await
			.map(drop)
			.map_err(channel_error)
	}

	async fn delete_message(&self, message: MessageRef) -> Result<(), ChannelError> {
		self.bot
			.delete_message(self.chat_id, MessageId(message.0))
			.await
			.map(drop)
			.map_err(channel_error)
	}

	async fn send_upload_action(&self) -> Result<(), ChannelError> {
		self.bot
			.send_chat_action(self.chat_id, ChatAction::UploadVideo)
			.await
			.map(drop)
			.map_err(channel_error)
	}

	async fn send_video(&self, path: &Path, caption: &str, options: MediaOptions) -> Result<(), ChannelError> {
		self.bot
			.send_video(self.chat_id, InputFile::file(path.to_path_buf()))
			.caption(caption)
			.supports_streaming(options.supports_streaming)
			.await
			.map(drop)
			.map_err(channel_error)
	}
}
