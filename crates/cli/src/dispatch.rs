//! Update routing.
//!
//! Commands get a usage reply. Every other text message is handed to the
//! [`Orchestrator`] in its own task, so a slow clip never blocks the
//! dispatcher or other chats.

use std::sync::Arc;

use clipr::{Orchestrator, PageSessionManager, RequestState};
use teloxide::dispatching::{HandlerExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info};

use crate::telegram::TelegramChannel;

/// Shared by every handler invocation.
pub struct BotState {
	pub orchestrator: Orchestrator,
	pub sessions: Arc<PageSessionManager>,
	/// Description of the Bot API in use, for the usage text.
	pub api_base: String,
}

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
	#[command(description = "show how to use the bot")]
	Start,
	#[command(description = "show how to use the bot")]
	Help,
}

pub fn usage_text(api_base: &str) -> String {
	format!(
		"Send me a Faceit clip link, for example\n\
		 https://www.faceit.com/en/players/<nickname>/videos/<clip-id>\n\
		 and I will reply with the video.\n\n\
		 Connected to the {api_base}."
	)
}

pub fn schema() -> UpdateHandler<teloxide::RequestError> {
	Update::filter_message()
		.branch(dptree::entry().filter_command::<Command>().endpoint(on_command))
		.branch(dptree::endpoint(on_message))
}

/// Runs the dispatcher until Ctrl-C.
pub async fn run(bot: Bot, state: Arc<BotState>) {
	Dispatcher::builder(bot, schema())
		.dependencies(dptree::deps![state])
		.enable_ctrlc_handler()
		.build()
		.dispatch()
		.await;
}

async fn on_command(bot: Bot, msg: Message, cmd: Command, state: Arc<BotState>) -> ResponseResult<()> {
	debug!(target = "clipr.bot", chat = %msg.chat.id, command = ?cmd, "command");
	bot.send_message(msg.chat.id, usage_text(&state.api_base)).await?;
	Ok(())
}

async fn on_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
	let Some(text) = msg.text() else {
		return Ok(());
	};

	let text = text.to_string();
	let channel = TelegramChannel::new(bot, msg.chat.id);
	tokio::spawn(async move {
		let outcome = state.orchestrator.handle(&channel, &text).await;
		if outcome != RequestState::Failed(clipr::FailureReason::NotAClip) {
			info!(target = "clipr.bot", chat = %channel.chat_id(), state = %outcome, "clip request handled");
		}
	});
	Ok(())
}
