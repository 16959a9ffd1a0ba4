//! Tracing setup: human-readable stderr plus a plain-text log file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Used when `RUST_LOG` is unset or invalid. HTTP internals stay quiet.
pub const DEFAULT_FILTER: &str = "info,clipr=debug,clipr_bot=debug,hyper=warn,hyper_util=warn,reqwest=warn,teloxide=info";

/// Installs the global subscriber. Keep the returned guard alive for the
/// lifetime of the process; dropping it flushes the file writer.
pub fn init(log_file: &Path) -> Result<WorkerGuard> {
	let (dir, name) = split_log_path(log_file)?;
	std::fs::create_dir_all(&dir).with_context(|| format!("creating log directory {}", dir.display()))?;

	let appender = RollingFileAppender::builder()
		.rotation(Rotation::NEVER)
		.filename_prefix(name)
		.build(&dir)
		.with_context(|| format!("opening log file {}", log_file.display()))?;
	let (writer, guard) = tracing_appender::non_blocking(appender);

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_target(true).with_writer(std::io::stderr))
		.with(fmt::layer().with_target(true).with_ansi(false).with_writer(writer))
		.try_init()
		.context("installing tracing subscriber")?;

	Ok(guard)
}

/// Splits `path` into its directory (`.` when bare) and file name.
fn split_log_path(path: &Path) -> Result<(PathBuf, String)> {
	let name = path
		.file_name()
		.and_then(|name| name.to_str())
		.with_context(|| format!("log file path has no file name: {}", path.display()))?
		.to_string();
	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
		_ => PathBuf::from("."),
	};
	Ok((dir, name))
}
