//! WebSocket transport against an in-process DevTools-like server.

use std::sync::Arc;

use clipr_runtime::{CdpPage, Connection, Error, WebSocketTransport};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// Answers every request with `respond(request)` until the client hangs up.
async fn serve_cdp<F>(respond: F) -> (String, tokio::task::JoinHandle<()>)
where
	F: Fn(&Value) -> Value + Send + 'static,
{
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		let (mut tx, mut rx) = ws.split();

		while let Some(Ok(frame)) = rx.next().await {
			let Message::Text(text) = frame else { continue };
			let request: Value = serde_json::from_str(&text).unwrap();
			let mut reply = respond(&request);
			reply["id"] = request["id"].clone();
			if tx.send(Message::Text(reply.to_string().into())).await.is_err() {
				break;
			}
		}
	});

	(format!("ws://{}", addr), server)
}

#[tokio::test]
async fn connection_round_trips_over_websocket() {
	let (url, server) = serve_cdp(|request| match request["method"].as_str() {
		Some("Target.createTarget") => json!({"result": {"targetId": "T1"}}),
		Some("Target.attachToTarget") => json!({"result": {"sessionId": "S1"}}),
		Some("Runtime.evaluate") => {
			assert_eq!(request["sessionId"], "S1");
			json!({"result": {"result": {"type": "boolean", "value": true}}})
		}
		_ => json!({"error": {"code": -32601, "message": "method not found"}}),
	})
	.await;

	let parts = WebSocketTransport::connect(&url).await.unwrap();
	let connection = Connection::new(parts);
	let runner = Arc::clone(&connection);
	tokio::spawn(async move { runner.run().await });

	let page = CdpPage::open(Arc::clone(&connection)).await.unwrap();
	assert_eq!(page.evaluate("!!document").await.unwrap(), json!(true));

	match connection.send_message(None, "Bogus.method", json!({})).await {
		Err(Error::Protocol { code, .. }) => assert_eq!(code, -32601),
		other => panic!("expected protocol error, got {other:?}"),
	}

	server.abort();
	let _ = server.await;
}

#[tokio::test]
async fn server_hangup_closes_connection() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		let _ = ws.next().await;
		let _ = ws.close(None).await;
	});

	let parts = WebSocketTransport::connect(&format!("ws://{}", addr)).await.unwrap();
	let connection = Connection::new(parts);
	let runner = Arc::clone(&connection);
	let loop_task = tokio::spawn(async move { runner.run().await });

	let result = connection.send_message(None, "Browser.getVersion", json!({})).await;
	assert!(matches!(result, Err(Error::ChannelClosed)));

	loop_task.await.unwrap();
	assert!(connection.is_closed());
	server.await.unwrap();
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
	let port = clipr_runtime::process::free_port().unwrap();
	let result = WebSocketTransport::connect(&format!("ws://127.0.0.1:{}/devtools/browser/x", port)).await;
	assert!(matches!(result, Err(Error::Transport(_))));
}
