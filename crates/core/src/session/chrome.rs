//! Headless Chrome implementation of the page seam.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clipr_runtime::{BrowserProcess, CdpPage, Connection, LaunchOptions, WebSocketTransport, find_browser_executable, launch_browser};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{PageDriver, PageLauncher};
use crate::DESKTOP_USER_AGENT;
use crate::error::SessionError;

const VIEWPORT: (u32, u32) = (1920, 1080);
const LIVENESS_TIMEOUT: Duration = Duration::from_secs(2);

/// Hides the usual headless automation fingerprints before page scripts run.
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };
"#;

/// Launches a private headless Chrome per session.
pub struct ChromeLauncher {
	options: LaunchOptions,
}

impl ChromeLauncher {
	/// `executable` overrides candidate discovery.
	pub fn new(executable: Option<PathBuf>) -> Self {
		Self {
			options: LaunchOptions {
				executable,
				window_size: VIEWPORT,
				user_agent: Some(DESKTOP_USER_AGENT.to_string()),
				..LaunchOptions::default()
			},
		}
	}
}

#[async_trait]
impl PageLauncher for ChromeLauncher {
	async fn launch(&self) -> Result<Box<dyn PageDriver>, SessionError> {
		let mut options = self.options.clone();
		if options.executable.is_none() {
			options.executable = Some(find_browser_executable().ok_or(SessionError::BrowserUnavailable)?);
		}

		let process = launch_browser(&options).await.map_err(launch_error)?;
		let parts = WebSocketTransport::connect(process.ws_endpoint()).await.map_err(launch_error)?;
		let connection = Connection::new(parts);
		let message_loop = tokio::spawn({
			let connection = Arc::clone(&connection);
			async move { connection.run().await }
		});

		let page = ChromePage {
			page: CdpPage::open(connection).await.map_err(launch_error)?,
			process: Mutex::new(process),
			message_loop,
		};
		page.apply_stealth().await.map_err(launch_error)?;

		let (executable, port, version) = {
			let process = page.process.lock().await;
			(
				process.executable().display().to_string(),
				process.port(),
				process.version().unwrap_or("unknown").to_string(),
			)
		};
		info!(target = "clipr.session", %executable, port, %version, "headless page ready");
		Ok(Box::new(page))
	}
}

fn launch_error(error: clipr_runtime::Error) -> SessionError {
	SessionError::Launch(error.to_string())
}

struct ChromePage {
	page: CdpPage,
	process: Mutex<BrowserProcess>,
	message_loop: JoinHandle<()>,
}

impl ChromePage {
	async fn apply_stealth(&self) -> clipr_runtime::Result<()> {
		self.page.add_init_script(STEALTH_SCRIPT).await?;
		self.page.set_user_agent(DESKTOP_USER_AGENT, Some("en-US,en;q=0.9")).await?;
		self.page.set_viewport(VIEWPORT.0, VIEWPORT.1).await
	}
}

#[async_trait]
impl PageDriver for ChromePage {
	async fn navigate(&self, url: &str) -> clipr_runtime::Result<()> {
		self.page.navigate(url).await
	}

	async fn evaluate(&self, expression: &str) -> clipr_runtime::Result<Value> {
		self.page.evaluate(expression).await
	}

	async fn is_alive(&self) -> bool {
		if self.page.connection().is_closed() || !self.process.lock().await.is_running() {
			return false;
		}
		matches!(tokio::time::timeout(LIVENESS_TIMEOUT, self.page.evaluate("1")).await, Ok(Ok(_)))
	}

	async fn close(&self) {
		match tokio::time::timeout(LIVENESS_TIMEOUT, self.page.close()).await {
			Ok(Ok(())) => {}
			Ok(Err(e)) => debug!(target = "clipr.session", error = %e, "closing page failed"),
			Err(_) => debug!(target = "clipr.session", "closing page timed out"),
		}
		if let Err(e) = self.process.lock().await.kill().await {
			debug!(target = "clipr.session", error = %e, "killing browser failed");
		}
		self.message_loop.abort();
	}
}

impl Drop for ChromePage {
	fn drop(&mut self) {
		self.message_loop.abort();
	}
}
