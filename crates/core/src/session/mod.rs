//! Headless browser session ownership.
//!
//! [`PageSessionManager`] owns at most one browser page for the whole
//! process. It is launched on first [`acquire`](PageSessionManager::acquire),
//! reused while healthy and relaunched when a health check fails. A
//! [`SessionLease`] grants exclusive use of the page until dropped, so
//! concurrent requests take turns on the browser.

mod chrome;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMappedMutexGuard, OwnedMutexGuard};
use tracing::{debug, info, warn};

pub use chrome::ChromeLauncher;

use crate::error::{NavigationError, SessionError};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const READ_TIMEOUT: Duration = Duration::from_secs(5);

const STALE_MARKER: &str = "__cliprStale";

/// Tags the current document so a probe cannot mistake it for the next one.
pub const MARK_STALE_EXPRESSION: &str = "window.__cliprStale = true";

/// One browser page as seen by the pipeline.
#[async_trait]
pub trait PageDriver: Send + Sync {
	/// Starts navigating to `url`.
	async fn navigate(&self, url: &str) -> clipr_runtime::Result<()>;

	/// Evaluates a JavaScript expression and returns its JSON value.
	async fn evaluate(&self, expression: &str) -> clipr_runtime::Result<Value>;

	/// Cheap liveness probe used before reuse.
	async fn is_alive(&self) -> bool;

	/// Releases the page and its browser.
	async fn close(&self);
}

/// Creates pages; the session manager calls this lazily.
#[async_trait]
pub trait PageLauncher: Send + Sync {
	async fn launch(&self) -> Result<Box<dyn PageDriver>, SessionError>;
}

type Slot = Option<Box<dyn PageDriver>>;

pub struct PageSessionManager {
	launcher: Box<dyn PageLauncher>,
	slot: Arc<Mutex<Slot>>,
}

impl PageSessionManager {
	pub fn new(launcher: Box<dyn PageLauncher>) -> Self {
		Self {
			launcher,
			slot: Arc::new(Mutex::new(None)),
		}
	}

	/// Returns exclusive access to the session, launching or relaunching the
	/// browser when needed.
	pub async fn acquire(&self) -> Result<SessionLease, SessionError> {
		let mut slot = Arc::clone(&self.slot).lock_owned().await;

		if let Some(page) = slot.as_ref() {
			if page.is_alive().await {
				debug!(target = "clipr.session", "reusing browser session");
			} else {
				warn!(target = "clipr.session", "browser session unhealthy; relaunching");
				if let Some(stale) = slot.take() {
					stale.close().await;
				}
			}
		}

		if slot.is_none() {
			let page = self.launcher.launch().await?;
			info!(target = "clipr.session", "browser session started");
			*slot = Some(page);
		}

		OwnedMutexGuard::try_map(slot, |slot| slot.as_mut())
			.map(|page| SessionLease { page })
			.map_err(|_| SessionError::Launch("session slot empty after launch".into()))
	}

	/// `true` when a session exists and answers its liveness probe.
	pub async fn is_healthy(&self) -> bool {
		match self.slot.lock().await.as_ref() {
			Some(page) => page.is_alive().await,
			None => false,
		}
	}

	/// Closes the current session, if any. The next acquire launches afresh.
	pub async fn reset(&self) {
		let stale = self.slot.lock().await.take();
		if let Some(page) = stale {
			info!(target = "clipr.session", "closing browser session");
			page.close().await;
		}
	}
}

/// Readiness conditions polled after navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
	/// At least one element with this tag name exists.
	TagPresent(String),
	/// The document finished loading or already has a non-empty title.
	DocumentReadyOrTitle,
}

impl WaitCondition {
	/// Expression polled until truthy. It is falsy while the previous
	/// document is still current.
	pub fn probe_expression(&self) -> String {
		let condition = match self {
			WaitCondition::TagPresent(tag) => {
				format!("document.getElementsByTagName({}).length > 0", Value::String(tag.clone()))
			}
			WaitCondition::DocumentReadyOrTitle => {
				"document.readyState === 'complete' || document.title.trim().length > 0".to_string()
			}
		};
		format!("window.{STALE_MARKER} !== true && ({condition})")
	}
}

impl fmt::Display for WaitCondition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WaitCondition::TagPresent(tag) => write!(f, "<{tag}> element"),
			WaitCondition::DocumentReadyOrTitle => f.write_str("document ready or title"),
		}
	}
}

/// Exclusive use of the browser page.
pub struct SessionLease {
	page: OwnedMappedMutexGuard<Slot, Box<dyn PageDriver>>,
}

impl SessionLease {
	pub fn page(&self) -> &dyn PageDriver {
		&**self.page
	}

	/// Navigates to `url` and blocks until `condition` holds or `timeout`
	/// elapses. No retries.
	pub async fn navigate_and_wait_for(&self, url: &str, condition: &WaitCondition, timeout: Duration) -> Result<(), NavigationError> {
		let probe = condition.probe_expression();
		debug!(target = "clipr.session", %url, %condition, "navigate");

		let work = async {
			if let Err(e) = self.page.evaluate(MARK_STALE_EXPRESSION).await {
				debug!(target = "clipr.session", error = %e, "could not mark previous document");
			}
			if let Err(e) = self.page.navigate(url).await {
				return Err(NavigationError::Failed(e.to_string()));
			}

			loop {
				match self.page.evaluate(&probe).await {
					Ok(value) if is_truthy(&value) => return Ok(()),
					Ok(_) => {}
					// The execution context is torn down while the document commits.
					Err(e) => debug!(target = "clipr.session", error = %e, "readiness probe failed"),
				}
				tokio::time::sleep(POLL_INTERVAL).await;
			}
		};

		match tokio::time::timeout(timeout, work).await {
			Ok(result) => result,
			Err(_) => Err(NavigationError::Timeout {
				after: timeout,
				condition: condition.to_string(),
			}),
		}
	}

	/// Evaluates `expression` on the current document.
	pub async fn evaluate(&self, expression: &str) -> Result<Value, NavigationError> {
		match tokio::time::timeout(READ_TIMEOUT, self.page.evaluate(expression)).await {
			Ok(result) => result.map_err(|e| NavigationError::Failed(e.to_string())),
			Err(_) => Err(NavigationError::Timeout {
				after: READ_TIMEOUT,
				condition: "script evaluation".into(),
			}),
		}
	}
}

/// JavaScript truthiness for values returned by value.
fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}
