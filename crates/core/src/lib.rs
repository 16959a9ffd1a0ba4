//! Faceit clip resolution and streaming relay.
//!
//! The pipeline for one request:
//!
//! 1. [`link::classify`] turns message text into a [`ClipReference`]
//! 2. [`TitleResolver`] and [`MediaUrlResolver`] render the clip page and the
//!    viewer embed in a shared headless browser ([`PageSessionManager`])
//! 3. [`StreamingRelay`] downloads the media to a transient file and forwards
//!    it through an [`OutputChannel`]
//!
//! [`Orchestrator`] sequences the stages and keeps the user's status message
//! in sync with the outcome.

pub mod channel;
pub mod error;
pub mod link;
pub mod orchestrator;
pub mod relay;
pub mod resolve;
pub mod session;

pub use channel::{MediaOptions, MessageRef, OutputChannel};
pub use error::{ChannelError, NavigationError, RelayError, SessionError};
pub use link::{ClipReference, classify};
pub use orchestrator::{FailureReason, Orchestrator, RequestState};
pub use relay::{RelayConfig, RelayReport, StreamingRelay, compose_caption};
pub use resolve::{MediaUrlResolver, Resolution, TitleResolver};
pub use session::{ChromeLauncher, PageDriver, PageLauncher, PageSessionManager, SessionLease, WaitCondition};

/// Desktop Chrome user agent presented to viewer pages and media origins.
pub const DESKTOP_USER_AGENT: &str =
	"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
