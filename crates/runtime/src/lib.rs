//! Headless Chrome runtime for clipr.
//!
//! Owns everything between "a browser binary exists on this host" and "a page
//! that can navigate and evaluate JavaScript":
//!
//! * [`browser`]: executable discovery, process launch, endpoint probing
//! * [`transport`]: WebSocket framing of CDP JSON messages
//! * [`connection`]: request/response correlation over a transport
//! * [`page`]: one attached page target

pub mod browser;
pub mod connection;
pub mod error;
pub mod fake_transport;
pub mod page;
pub mod process;
pub mod transport;

pub use browser::{BrowserProcess, LaunchOptions, find_browser_executable, launch_browser};
pub use connection::Connection;
pub use error::{Error, Result};
pub use page::CdpPage;
pub use transport::{Transport, TransportParts, TransportReceiver, WebSocketTransport};
