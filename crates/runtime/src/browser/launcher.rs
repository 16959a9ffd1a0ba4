//! Browser process launch.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use super::finder::find_browser_executable;
use super::probe::{CdpVersionInfo, fetch_cdp_endpoint};
use crate::error::{Error, Result};
use crate::process::free_port;

const PROBE_INTERVAL: Duration = Duration::from_millis(200);

/// Launch parameters for a headless browser.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
	/// Explicit executable; discovered from the candidate list when `None`.
	pub executable: Option<PathBuf>,
	pub headless: bool,
	pub window_size: (u32, u32),
	pub user_agent: Option<String>,
	/// Required when running as root inside containers.
	pub no_sandbox: bool,
	pub extra_args: Vec<String>,
	/// How long to wait for the DevTools endpoint after spawning.
	pub startup_timeout: Duration,
}

impl Default for LaunchOptions {
	fn default() -> Self {
		Self {
			executable: None,
			headless: true,
			window_size: (1920, 1080),
			user_agent: None,
			no_sandbox: cfg!(target_os = "linux"),
			extra_args: Vec::new(),
			startup_timeout: Duration::from_secs(10),
		}
	}
}

impl LaunchOptions {
	fn args(&self, port: u16, profile: &Path) -> Vec<String> {
		let (width, height) = self.window_size;
		let mut args = vec![
			format!("--remote-debugging-port={}", port),
			format!("--user-data-dir={}", profile.display()),
			format!("--window-size={},{}", width, height),
			"--no-first-run".to_string(),
			"--no-default-browser-check".to_string(),
			"--disable-blink-features=AutomationControlled".to_string(),
			"--disable-dev-shm-usage".to_string(),
			"--disable-gpu".to_string(),
			"--mute-audio".to_string(),
		];

		if self.headless {
			args.push("--headless=new".to_string());
		}
		if self.no_sandbox {
			args.push("--no-sandbox".to_string());
		}
		if let Some(user_agent) = &self.user_agent {
			args.push(format!("--user-agent={}", user_agent));
		}
		args.extend(self.extra_args.iter().cloned());
		args.push("about:blank".to_string());
		args
	}
}

/// A running browser with its DevTools endpoint resolved.
///
/// The process is killed and its private profile removed when dropped.
#[derive(Debug)]
pub struct BrowserProcess {
	child: Child,
	executable: PathBuf,
	port: u16,
	endpoint: CdpVersionInfo,
	_profile: TempDir,
}

impl BrowserProcess {
	pub fn ws_endpoint(&self) -> &str {
		&self.endpoint.web_socket_debugger_url
	}

	pub fn version(&self) -> Option<&str> {
		self.endpoint.browser.as_deref()
	}

	pub fn executable(&self) -> &Path {
		&self.executable
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	/// `false` once the process has exited.
	pub fn is_running(&mut self) -> bool {
		matches!(self.child.try_wait(), Ok(None))
	}

	pub async fn kill(&mut self) -> Result<()> {
		if self.is_running() {
			self.child.kill().await?;
		}
		Ok(())
	}
}

/// Spawns a browser and waits for its DevTools endpoint.
pub async fn launch_browser(options: &LaunchOptions) -> Result<BrowserProcess> {
	let executable = match &options.executable {
		Some(path) => path.clone(),
		None => find_browser_executable().ok_or_else(|| {
			Error::Launch(
				"Could not find a Chrome/Chromium executable. \
				 Install Chrome or Chromium, or point CLIPR_BROWSER at one."
					.into(),
			)
		})?,
	};

	let profile = tempfile::Builder::new().prefix("clipr-profile-").tempdir()?;
	let port = free_port()?;
	let args = options.args(port, profile.path());
	debug!(target = "clipr.runtime", executable = %executable.display(), port, "spawning browser");

	let mut child = Command::new(&executable)
		.args(&args)
		.stdin(Stdio::null())
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.kill_on_drop(true)
		.spawn()
		.map_err(|e| Error::Launch(format!("Failed to launch {}: {}", executable.display(), e)))?;

	let attempts = (options.startup_timeout.as_millis() / PROBE_INTERVAL.as_millis()).max(1);
	let mut last_error = "endpoint not reachable".to_string();
	for _ in 0..attempts {
		tokio::time::sleep(PROBE_INTERVAL).await;

		if let Ok(Some(status)) = child.try_wait() {
			return Err(Error::Launch(format!(
				"{} exited before its DevTools endpoint became available (status: {})",
				executable.display(),
				status
			)));
		}

		match fetch_cdp_endpoint(port).await {
			Ok(endpoint) => {
				info!(
					target = "clipr.runtime",
					browser = endpoint.browser.as_deref().unwrap_or("unknown"),
					port,
					"browser launched"
				);
				return Ok(BrowserProcess {
					child,
					executable,
					port,
					endpoint,
					_profile: profile,
				});
			}
			Err(Error::Launch(msg)) => last_error = msg,
			Err(other) => last_error = other.to_string(),
		}
	}

	let _ = child.kill().await;
	Err(Error::Launch(format!(
		"Browser launched but DevTools endpoint not available on port {} after {:?}: {}",
		port, options.startup_timeout, last_error
	)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn args_carry_stealth_and_viewport_flags() {
		let options = LaunchOptions {
			user_agent: Some("UA/1.0".into()),
			no_sandbox: false,
			..LaunchOptions::default()
		};
		let args = options.args(9333, Path::new("/tmp/profile"));

		assert!(args.contains(&"--remote-debugging-port=9333".to_string()));
		assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
		assert!(args.contains(&"--window-size=1920,1080".to_string()));
		assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
		assert!(args.contains(&"--headless=new".to_string()));
		assert!(args.contains(&"--user-agent=UA/1.0".to_string()));
		assert!(!args.contains(&"--no-sandbox".to_string()));
		assert_eq!(args.last().map(String::as_str), Some("about:blank"));
	}

	#[test]
	fn headful_launch_omits_headless_flag() {
		let options = LaunchOptions {
			headless: false,
			..LaunchOptions::default()
		};
		let args = options.args(9222, Path::new("/tmp/p"));
		assert!(!args.iter().any(|arg| arg.starts_with("--headless")));
	}

	#[tokio::test]
	async fn missing_executable_fails_to_launch() {
		let options = LaunchOptions {
			executable: Some(PathBuf::from("/definitely/not/a/browser")),
			..LaunchOptions::default()
		};
		assert!(matches!(launch_browser(&options).await, Err(Error::Launch(_))));
	}
}
