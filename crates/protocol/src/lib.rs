//! Wire types for the Chrome DevTools Protocol.
//!
//! This crate contains the serde-serializable types exchanged with a Chromium
//! browser over its remote-debugging WebSocket. Only the handful of domains the
//! clip pipeline drives are modelled:
//!
//! * `Target`: open, attach to and close a page
//! * `Page`: navigate and register init scripts
//! * `Runtime`: evaluate expressions in the page
//! * `Emulation` / `Network`: viewport and user-agent overrides
//!
//! Types here are pure data. Behavior lives in `clipr-runtime`.

pub mod commands;
pub mod message;

pub use commands::*;
pub use message::*;
