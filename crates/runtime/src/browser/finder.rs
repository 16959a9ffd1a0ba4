//! Browser executable discovery.
//!
//! Candidates are tried in order; bare names are resolved through `PATH`,
//! absolute paths are checked for existence.

use std::path::{Path, PathBuf};

/// Returns the first candidate that exists on this host.
pub fn find_browser_executable() -> Option<PathBuf> {
	browser_candidates().into_iter().find_map(|candidate| resolve_candidate(&candidate))
}

/// Ordered candidate list for the current platform.
pub fn browser_candidates() -> Vec<String> {
	if cfg!(target_os = "macos") {
		[
			"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
			"/Applications/Chromium.app/Contents/MacOS/Chromium",
			"/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
			"/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
		]
		.into_iter()
		.map(str::to_string)
		.collect()
	} else if cfg!(target_os = "windows") {
		windows_browser_candidates()
	} else {
		[
			"google-chrome-stable",
			"google-chrome",
			"chromium-browser",
			"chromium",
			"headless_shell",
			"brave-browser",
			"microsoft-edge",
			"/usr/bin/google-chrome-stable",
			"/usr/bin/google-chrome",
			"/usr/bin/chromium-browser",
			"/usr/bin/chromium",
			"/snap/bin/chromium",
			"/opt/google/chrome/chrome",
		]
		.into_iter()
		.map(str::to_string)
		.collect()
	}
}

fn resolve_candidate(candidate: &str) -> Option<PathBuf> {
	if is_path_like(candidate) {
		let path = Path::new(candidate);
		path.is_file().then(|| path.to_path_buf())
	} else {
		which::which(candidate).ok()
	}
}

fn is_path_like(candidate: &str) -> bool {
	candidate.starts_with('/') || candidate.contains('\\') || candidate.contains(':')
}

fn windows_browser_candidates() -> Vec<String> {
	let mut roots = Vec::new();
	for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
		if let Ok(value) = std::env::var(key) {
			roots.push(PathBuf::from(value));
		}
	}
	if roots.is_empty() {
		roots.push(PathBuf::from(r"C:\Program Files"));
		roots.push(PathBuf::from(r"C:\Program Files (x86)"));
	}

	let suffixes: &[&[&str]] = &[
		&["Google", "Chrome", "Application", "chrome.exe"],
		&["Chromium", "Application", "chrome.exe"],
		&["Microsoft", "Edge", "Application", "msedge.exe"],
		&["BraveSoftware", "Brave-Browser", "Application", "brave.exe"],
	];

	let mut candidates = Vec::new();
	for root in roots {
		for suffix in suffixes {
			let path: PathBuf = suffix.iter().fold(root.clone(), |path, component| path.join(component));
			candidates.push(path.to_string_lossy().to_string());
		}
	}

	candidates.extend(["chrome.exe", "msedge.exe", "brave.exe"].map(str::to_string));
	candidates
}
