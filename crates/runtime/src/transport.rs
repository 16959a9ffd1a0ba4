//! Message transports carrying CDP JSON.
//!
//! A transport is split in two halves so the sender can be shared behind a
//! lock while the receiver runs in its own task:
//!
//! * [`Transport`] sends one JSON message
//! * [`TransportReceiver`] pumps inbound messages into an mpsc channel until
//!   the peer goes away
//!
//! [`WebSocketTransport`] is the production implementation;
//! [`crate::fake_transport`] is the in-memory one used by tests.

use std::future::Future;
use std::pin::Pin;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound half of a transport.
pub trait Transport: Send + Sync {
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Inbound half of a transport.
pub trait TransportReceiver: Send {
	/// Forwards inbound messages until the peer closes or the channel is dropped.
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// Both halves plus the channel the receiver feeds.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// CDP over a browser's remote-debugging WebSocket.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Connects to `url` (a `ws://` debugger endpoint).
	pub async fn connect(url: &str) -> Result<TransportParts> {
		debug!(target = "clipr.runtime", %url, "connecting websocket");
		let (stream, _) = tokio_tungstenite::connect_async(url)
			.await
			.map_err(|e| Error::Transport(format!("Failed to connect to {}: {}", url, e)))?;

		let (sink, stream) = stream.split();
		let (message_tx, message_rx) = mpsc::unbounded_channel();

		Ok(TransportParts {
			sender: Box::new(WebSocketSender { sink }),
			receiver: Box::new(WebSocketReceiver { stream, message_tx }),
			message_rx,
		})
	}
}

struct WebSocketSender {
	sink: SplitSink<WsStream, WsMessage>,
}

impl Transport for WebSocketSender {
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(async move {
			let text = serde_json::to_string(&message)?;
			trace!(target = "clipr.runtime", %text, "ws send");
			self.sink
				.send(WsMessage::Text(text.into()))
				.await
				.map_err(|e| Error::Transport(e.to_string()))
		})
	}
}

struct WebSocketReceiver {
	stream: SplitStream<WsStream>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl TransportReceiver for WebSocketReceiver {
	fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(async move {
			while let Some(frame) = self.stream.next().await {
				let frame = frame.map_err(|e| Error::Transport(e.to_string()))?;
				let text = match frame {
					WsMessage::Text(text) => text.to_string(),
					WsMessage::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
					WsMessage::Close(_) => break,
					_ => continue,
				};

				match serde_json::from_str::<Value>(&text) {
					Ok(value) => {
						if self.message_tx.send(value).is_err() {
							break;
						}
					}
					Err(e) => warn!(target = "clipr.runtime", error = %e, "dropping unparsable frame"),
				}
			}
			Ok(())
		})
	}
}
