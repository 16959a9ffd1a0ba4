//! Port helpers for browser launch.

use std::net::TcpListener;

use crate::error::Result;

/// Asks the OS for a currently unused localhost port.
pub fn free_port() -> Result<u16> {
	let listener = TcpListener::bind(("127.0.0.1", 0))?;
	Ok(listener.local_addr()?.port())
}
