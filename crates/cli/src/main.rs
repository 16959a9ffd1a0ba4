use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clipr::{ChromeLauncher, MediaUrlResolver, Orchestrator, PageSessionManager, RelayConfig, StreamingRelay, TitleResolver};
use clipr_bot::config::{self, Config};
use clipr_bot::{BotState, dispatch, logging, telegram};
use teloxide::prelude::*;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> ExitCode {
	let dotenv = dotenvy::dotenv();

	let _guard = match logging::init(&config::log_file_from_env()) {
		Ok(guard) => guard,
		Err(e) => {
			eprintln!("clipr-bot: {e:#}");
			return ExitCode::FAILURE;
		}
	};

	match dotenv {
		Ok(path) => debug!(target = "clipr.bot", path = %path.display(), "loaded .env"),
		Err(e) if e.not_found() => {}
		Err(e) => error!(target = "clipr.bot", error = %e, "ignoring unreadable .env"),
	}

	match run().await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!(target = "clipr.bot", error = %format!("{e:#}"), "fatal");
			ExitCode::FAILURE
		}
	}
}

async fn run() -> Result<()> {
	let config = Config::from_env()?;
	debug!(target = "clipr.bot", ?config, "configuration");

	let bot = telegram::build_bot(&config)?;
	let me = bot.get_me().await.context("Bot API getMe failed; check the token and API server")?;
	info!(target = "clipr.bot", username = %me.username(), api = %config.api_base(), "bot started");

	let sessions = Arc::new(PageSessionManager::new(Box::new(ChromeLauncher::new(config.browser.clone()))));
	let orchestrator = Orchestrator::new(
		TitleResolver::new(Arc::clone(&sessions)),
		MediaUrlResolver::new(Arc::clone(&sessions)),
		StreamingRelay::new(RelayConfig::default())?,
	);

	let state = Arc::new(BotState {
		orchestrator,
		sessions,
		api_base: config.api_base(),
	});
	dispatch::run(bot, Arc::clone(&state)).await;

	info!(target = "clipr.bot", "shutting down");
	state.sessions.reset().await;
	Ok(())
}
