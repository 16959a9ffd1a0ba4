//! In-memory transport for exercising the protocol layer without a browser.
//!
//! ```ignore
//! let (parts, controller) = FakeTransportBuilder::new().build();
//! let connection = Connection::new(parts);
//! tokio::spawn({
//!     let conn = Arc::clone(&connection);
//!     async move { conn.run().await }
//! });
//!
//! let fut = connection.send_message(None, "Target.createTarget", json!({}));
//! controller.inject_response(0, json!({"targetId": "T"}));
//! let result = fut.await?;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, Notify, mpsc};

use crate::error::Result;
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Builder for fake transport instances.
#[derive(Default)]
pub struct FakeTransportBuilder {}

impl FakeTransportBuilder {
	pub fn new() -> Self {
		Self {}
	}

	/// Returns the transport parts for a [`Connection`] plus a controller for
	/// injecting inbound traffic and inspecting what was sent.
	///
	/// [`Connection`]: crate::connection::Connection
	pub fn build(self) -> (TransportParts, FakeTransportController) {
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		let sent = Arc::new(Mutex::new(Vec::new()));
		let sent_signal = Arc::new(Notify::new());

		let sender = FakeTransportSender {
			sent: Arc::clone(&sent),
			sent_signal: Arc::clone(&sent_signal),
		};
		let receiver = FakeTransportReceiver { inbound_rx, message_tx };
		let controller = FakeTransportController {
			inbound_tx: Some(inbound_tx),
			sent,
			sent_signal,
		};

		let parts = TransportParts {
			sender: Box::new(sender),
			receiver: Box::new(receiver),
			message_rx,
		};

		(parts, controller)
	}
}

/// Handle for driving the fake peer.
pub struct FakeTransportController {
	inbound_tx: Option<mpsc::UnboundedSender<Value>>,
	sent: Arc<Mutex<Vec<Value>>>,
	sent_signal: Arc<Notify>,
}

impl FakeTransportController {
	/// Injects a raw inbound message.
	pub fn inject(&self, message: Value) {
		if let Some(tx) = &self.inbound_tx {
			let _ = tx.send(message);
		}
	}

	pub fn inject_response(&self, id: u32, result: Value) {
		self.inject(serde_json::json!({ "id": id, "result": result }));
	}

	pub fn inject_error(&self, id: u32, code: i64, message: &str) {
		self.inject(serde_json::json!({
			"id": id,
			"error": { "code": code, "message": message }
		}));
	}

	pub fn inject_event(&self, method: &str, params: Value) {
		self.inject(serde_json::json!({ "method": method, "params": params }));
	}

	/// Simulates the peer hanging up.
	pub fn disconnect(&mut self) {
		self.inbound_tx = None;
	}

	/// Waits until at least one unread message has been sent and returns the
	/// oldest one.
	pub async fn next_sent(&self) -> Value {
		loop {
			let notified = self.sent_signal.notified();
			{
				let mut sent = self.sent.lock().await;
				if !sent.is_empty() {
					return sent.remove(0);
				}
			}
			notified.await;
		}
	}
}

struct FakeTransportSender {
	sent: Arc<Mutex<Vec<Value>>>,
	sent_signal: Arc<Notify>,
}

impl Transport for FakeTransportSender {
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		let sent = Arc::clone(&self.sent);
		let signal = Arc::clone(&self.sent_signal);
		Box::pin(async move {
			sent.lock().await.push(message);
			signal.notify_waiters();
			Ok(())
		})
	}
}

struct FakeTransportReceiver {
	inbound_rx: mpsc::UnboundedReceiver<Value>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl TransportReceiver for FakeTransportReceiver {
	fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(async move {
			while let Some(message) = self.inbound_rx.recv().await {
				if self.message_tx.send(message).is_err() {
					break;
				}
			}
			Ok(())
		})
	}
}
