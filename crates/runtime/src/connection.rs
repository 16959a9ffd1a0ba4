//! JSON-RPC connection over a CDP transport.
//!
//! Correlates responses with pending requests:
//!
//! 1. [`Connection::send_message`] allocates an id and parks a oneshot sender
//! 2. the request is serialized and written to the transport
//! 3. [`Connection::run`] reads inbound messages and completes the matching
//!    oneshot; events are logged and dropped
//!
//! When the transport ends every pending request fails with
//! [`Error::ChannelClosed`] and the connection reports itself closed.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use clipr_protocol::{ErrorPayload, Message, Request};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

type Callbacks = HashMap<u32, oneshot::Sender<Result<Value>>>;

pub struct Connection {
	last_id: AtomicU32,
	callbacks: Mutex<Callbacks>,
	sender: Mutex<Box<dyn Transport>>,
	inbound: Mutex<Option<(Box<dyn TransportReceiver>, mpsc::UnboundedReceiver<Value>)>>,
	closed: AtomicBool,
}

impl Connection {
	pub fn new(parts: TransportParts) -> Arc<Self> {
		Arc::new(Self {
			last_id: AtomicU32::new(0),
			callbacks: Mutex::new(HashMap::new()),
			sender: Mutex::new(parts.sender),
			inbound: Mutex::new(Some((parts.receiver, parts.message_rx))),
			closed: AtomicBool::new(false),
		})
	}

	/// `true` once the message loop has ended.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Sends `method` and waits for its response.
	///
	/// `session_id` routes the command to an attached page; `None` addresses
	/// the browser itself.
	pub async fn send_message(&self, session_id: Option<&str>, method: &str, params: Value) -> Result<Value> {
		if self.is_closed() {
			return Err(Error::ChannelClosed);
		}

		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().await.insert(id, tx);
		if self.is_closed() {
			self.callbacks.lock().await.remove(&id);
			return Err(Error::ChannelClosed);
		}

		let request = Request {
			id,
			method: method.to_string(),
			params,
			session_id: session_id.map(str::to_string),
		};
		trace!(target = "clipr.runtime", id, %method, "cdp request");

		let sent = match serde_json::to_value(&request) {
			Ok(value) => self.sender.lock().await.send(value).await,
			Err(e) => Err(e.into()),
		};
		if let Err(e) = sent {
			self.callbacks.lock().await.remove(&id);
			return Err(e);
		}

		rx.await.map_err(|_| Error::ChannelClosed).and_then(|result| result)
	}

	/// Runs the dispatch loop until the transport closes.
	///
	/// May only do work once; later calls return immediately.
	pub async fn run(&self) {
		let Some((receiver, mut message_rx)) = self.inbound.lock().await.take() else {
			return;
		};

		let transport_task = tokio::spawn(async move {
			if let Err(e) = receiver.run().await {
				error!(target = "clipr.runtime", error = %e, "transport error");
			}
		});

		while let Some(value) = message_rx.recv().await {
			match serde_json::from_value::<Message>(value) {
				Ok(message) => self.dispatch(message).await,
				Err(e) => error!(target = "clipr.runtime", error = %e, "failed to parse cdp message"),
			}
		}

		debug!(target = "clipr.runtime", "message loop ended");
		self.closed.store(true, Ordering::SeqCst);
		// Dropping the senders fails every in-flight request with ChannelClosed.
		self.callbacks.lock().await.clear();
		let _ = transport_task.await;
	}

	async fn dispatch(&self, message: Message) {
		match message {
			Message::Response(response) => {
				let Some(callback) = self.callbacks.lock().await.remove(&response.id) else {
					debug!(target = "clipr.runtime", id = response.id, "response for unknown request");
					return;
				};

				let result = match response.error {
					Some(payload) => Err(protocol_error(payload)),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};
				let _ = callback.send(result);
			}
			Message::Event(event) => {
				trace!(
					target = "clipr.runtime",
					method = %event.method,
					session = event.session_id.as_deref().unwrap_or("-"),
					"cdp event"
				);
			}
		}
	}
}

fn protocol_error(payload: ErrorPayload) -> Error {
	let message = match payload.data {
		Some(data) => format!("{} ({})", payload.message, data),
		None => payload.message,
	};
	Error::Protocol {
		code: payload.code,
		message,
	}
}
