//! Shared fakes for pipeline integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use clipr::session::MARK_STALE_EXPRESSION;
use clipr::{
	ChannelError, MediaOptions, MessageRef, OutputChannel, PageDriver, PageLauncher, PageSessionManager, SessionError,
	WaitCondition,
};
use clipr::resolve::{TITLE_EXPRESSION, sources_expression};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const CLIP_URL: &str = "https://www.faceit.com/en/players/someone/videos/abc123";
pub const EMBED_TEMPLATE: &str = "https://embed.test/iframe?clip={clip_id}";

/// Bytes served at `/clip.mp4`; several relay chunks long.
pub fn clip_bytes() -> Vec<u8> {
	(0..100_000u32).map(|i| (i % 251) as u8).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
	Text { id: i32, text: String },
	Edit { id: i32, text: String },
	Delete { id: i32 },
	UploadAction,
	Video { caption: String, bytes: Vec<u8>, supports_streaming: bool },
}

/// Records everything sent to one chat.
#[derive(Default)]
pub struct FakeChannel {
	events: Mutex<Vec<ChannelEvent>>,
	next_id: AtomicUsize,
	fail_text: bool,
	fail_video: bool,
	fail_upload_action: bool,
}

impl FakeChannel {
	pub fn new() -> Self {
		Self::default()
	}

	/// Every text send fails, including the status message.
	pub fn failing_text(mut self) -> Self {
		self.fail_text = true;
		self
	}

	pub fn failing_video(mut self) -> Self {
		self.fail_video = true;
		self
	}

	pub fn failing_upload_action(mut self) -> Self {
		self.fail_upload_action = true;
		self
	}

	pub fn events(&self) -> Vec<ChannelEvent> {
		self.events.lock().unwrap().clone()
	}

	pub fn videos(&self) -> Vec<(String, Vec<u8>)> {
		self.events()
			.into_iter()
			.filter_map(|event| match event {
				ChannelEvent::Video { caption, bytes, .. } => Some((caption, bytes)),
				_ => None,
			})
			.collect()
	}

	fn record(&self, event: ChannelEvent) {
		self.events.lock().unwrap().push(event);
	}
}

#[async_trait]
impl OutputChannel for FakeChannel {
	async fn send_text(&self, text: &str) -> Result<MessageRef, ChannelError> {
		if self.fail_text {
			return Err(ChannelError("chat not found".into()));
		}
		let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i32 + 1;
		self.record(ChannelEvent::Text { id, text: text.to_string() });
		Ok(MessageRef(id))
	}

	async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), ChannelError> {
		self.record(ChannelEvent::Edit {
			id: message.0,
			text: text.to_string(),
		});
		Ok(())
	}

	async fn delete_message(&self, message: MessageRef) -> Result<(), ChannelError> {
		self.record(ChannelEvent::Delete { id: message.0 });
		Ok(())
	}

	async fn send_upload_action(&self) -> Result<(), ChannelError> {
		if self.fail_upload_action {
			return Err(ChannelError("too many requests".into()));
		}
		self.record(ChannelEvent::UploadAction);
		Ok(())
	}

	async fn send_video(&self, path: &Path, caption: &str, options: MediaOptions) -> Result<(), ChannelError> {
		if self.fail_video {
			return Err(ChannelError("request entity too large".into()));
		}
		let bytes = tokio::fs::read(path).await.map_err(|e| ChannelError(e.to_string()))?;
		self.record(ChannelEvent::Video {
			caption: caption.to_string(),
			bytes,
			supports_streaming: options.supports_streaming,
		});
		Ok(())
	}
}

/// What the fake browser renders for one URL.
#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
	pub ready: bool,
	pub title: String,
	pub video_sources: Vec<String>,
}

impl FakeDocument {
	pub fn titled(title: &str) -> Self {
		Self {
			ready: true,
			title: title.to_string(),
			video_sources: Vec::new(),
		}
	}

	pub fn with_videos<I, S>(sources: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			ready: true,
			title: String::new(),
			video_sources: sources.into_iter().map(Into::into).collect(),
		}
	}
}

#[derive(Default)]
struct BrowserState {
	documents: HashMap<String, FakeDocument>,
	current: Option<FakeDocument>,
	stale: bool,
	visited: Vec<String>,
}

/// In-memory browser answering the pipeline's page scripts.
#[derive(Clone, Default)]
pub struct FakeBrowser {
	state: Arc<Mutex<BrowserState>>,
	launches: Arc<AtomicUsize>,
	panic_on_navigate: bool,
}

impl FakeBrowser {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn serve(self, url: &str, document: FakeDocument) -> Self {
		self.state.lock().unwrap().documents.insert(url.to_string(), document);
		self
	}

	/// Pages of this browser panic when navigated.
	pub fn panicking(mut self) -> Self {
		self.panic_on_navigate = true;
		self
	}

	pub fn visited(&self) -> Vec<String> {
		self.state.lock().unwrap().visited.clone()
	}

	pub fn launches(&self) -> usize {
		self.launches.load(Ordering::SeqCst)
	}

	pub fn sessions(&self) -> Arc<PageSessionManager> {
		Arc::new(PageSessionManager::new(Box::new(self.clone())))
	}
}

#[async_trait]
impl PageLauncher for FakeBrowser {
	async fn launch(&self) -> Result<Box<dyn PageDriver>, SessionError> {
		self.launches.fetch_add(1, Ordering::SeqCst);
		Ok(Box::new(FakePage {
			state: Arc::clone(&self.state),
			panic_on_navigate: self.panic_on_navigate,
		}))
	}
}

struct FakePage {
	state: Arc<Mutex<BrowserState>>,
	panic_on_navigate: bool,
}

#[async_trait]
impl PageDriver for FakePage {
	async fn navigate(&self, url: &str) -> clipr_runtime::Result<()> {
		if self.panic_on_navigate {
			panic!("renderer crashed");
		}
		let mut state = self.state.lock().unwrap();
		state.visited.push(url.to_string());
		let Some(document) = state.documents.get(url).cloned() else {
			return Err(clipr_runtime::Error::Navigation {
				url: url.to_string(),
				reason: "net::ERR_NAME_NOT_RESOLVED".into(),
			});
		};
		state.current = Some(document);
		state.stale = false;
		Ok(())
	}

	async fn evaluate(&self, expression: &str) -> clipr_runtime::Result<Value> {
		let mut state = self.state.lock().unwrap();
		if expression == MARK_STALE_EXPRESSION {
			state.stale = true;
			return Ok(json!(true));
		}
		let document = state.current.clone().unwrap_or_default();

		let video = WaitCondition::TagPresent("video".into()).probe_expression();
		let ready_or_title = WaitCondition::DocumentReadyOrTitle.probe_expression();
		let value = if expression == video {
			json!(!state.stale && !document.video_sources.is_empty())
		} else if expression == ready_or_title {
			json!(!state.stale && (document.ready || !document.title.trim().is_empty()))
		} else if expression == TITLE_EXPRESSION {
			json!(document.title)
		} else if expression == "document.readyState === 'complete'" {
			json!(document.ready)
		} else if expression == sources_expression("video") {
			json!(document.video_sources)
		} else {
			return Err(clipr_runtime::Error::Evaluation(format!("unexpected script: {expression}")));
		};
		Ok(value)
	}

	async fn is_alive(&self) -> bool {
		true
	}

	async fn close(&self) {}
}

/// Media origin for relay tests.
pub struct MediaServer {
	pub addr: SocketAddr,
}

impl MediaServer {
	pub async fn start() -> Self {
		let app = Router::new()
			.route("/clip.mp4", get(|| async { clip_bytes() }))
			.route("/missing.mp4", get(|| async { StatusCode::NOT_FOUND }))
			.route("/empty.mp4", get(|| async { Vec::<u8>::new() }))
			.route("/desktop-only.mp4", get(desktop_only))
			.route("/slow.mp4", get(slow));

		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});
		Self { addr }
	}

	pub fn url(&self, path: &str) -> String {
		format!("http://{}{}", self.addr, path)
	}
}

/// Origin that announces a longer body than it sends, then hangs up.
///
/// The response head goes out intact, so the failure surfaces while the body
/// is being read.
pub async fn start_truncating_origin() -> String {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		while let Ok((mut socket, _)) = listener.accept().await {
			tokio::spawn(async move {
				let mut request = [0u8; 4096];
				let _ = socket.read(&mut request).await;
				let head = "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: 100000\r\n\r\n";
				let _ = socket.write_all(head.as_bytes()).await;
				let _ = socket.write_all(&[7u8; 32 * 1024]).await;
				let _ = socket.shutdown().await;
			});
		}
	});
	format!("http://{addr}/truncated.mp4")
}

/// Refuses clients that do not look like desktop Chrome.
async fn desktop_only(headers: HeaderMap) -> impl IntoResponse {
	let agent = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or_default();
	if agent.contains("Chrome/") && agent.contains("Windows NT") {
		(StatusCode::OK, clip_bytes())
	} else {
		(StatusCode::FORBIDDEN, Vec::new())
	}
}

async fn slow() -> impl IntoResponse {
	tokio::time::sleep(Duration::from_secs(30)).await;
	clip_bytes()
}

/// Number of entries left in `dir`.
pub fn entries(dir: &Path) -> usize {
	std::fs::read_dir(dir).unwrap().count()
}
