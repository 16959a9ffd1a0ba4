//! Local Chromium-family browser discovery and launch.

mod finder;
mod launcher;
mod probe;

pub use finder::{browser_candidates, find_browser_executable};
pub use launcher::{BrowserProcess, LaunchOptions, launch_browser};
pub use probe::{CdpVersionInfo, fetch_cdp_endpoint};
