//! `TelegramChannel` against a local stand-in for the Bot API.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, State};
use axum::response::Json;
use clipr::{MessageRef, OutputChannel};
use clipr_bot::{Config, TelegramChannel, telegram};
use serde_json::{Value, json};
use teloxide::types::ChatId;

type Calls = Arc<Mutex<Vec<String>>>;

/// Answers `/bot<token>/<method>` the way the Bot API would for a private chat.
async fn bot_api(State(calls): State<Calls>, Path((_token, method)): Path<(String, String)>) -> Json<Value> {
	let method = method.to_ascii_lowercase();
	calls.lock().unwrap().push(method.clone());

	let result = match method.as_str() {
		"sendmessage" => json!({
			"message_id": 77,
			"date": 1700000000,
			"chat": {"id": 42, "type": "private", "first_name": "Tester"},
			"text": "⏳ Processing clip…"
		}),
		_ => json!(true),
	};
	Json(json!({"ok": true, "result": result}))
}

async fn start_api() -> (String, Calls) {
	let calls = Calls::default();
	let app = Router::new().route("/{token}/{method}", axum::routing::post(bot_api)).with_state(Arc::clone(&calls));

	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	(format!("http://{addr}/"), calls)
}

fn channel(api: &str) -> TelegramChannel {
	let config = Config {
		token: "123:test".into(),
		api_server: Some(api.parse().unwrap()),
		log_file: PathBuf::from("bot_debug.log"),
		browser: None,
	};
	TelegramChannel::new(telegram::build_bot(&config).unwrap(), ChatId(42))
}

#[tokio::test]
async fn status_lifecycle_uses_configured_api_server() {
	let (api, calls) = start_api().await;
	let channel = channel(&api);

	let status = channel.send_text("⏳ Processing clip…").await.unwrap();
	assert_eq!(status, MessageRef(77));

	channel.send_upload_action().await.unwrap();
	channel.delete_message(status).await.unwrap();

	assert_eq!(*calls.lock().unwrap(), vec!["sendmessage", "sendchataction", "deletemessage"]);
}

#[tokio::test]
async fn api_failures_become_channel_errors() {
	let channel = channel("http://127.0.0.1:9/");
	assert!(channel.send_text("hello").await.is_err());
}
