//! Parameter and result shapes for the CDP commands clipr issues.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `Target.createTarget` parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetParams {
	pub url: String,
}

/// `Target.createTarget` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResult {
	pub target_id: String,
}

/// `Target.attachToTarget` parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetParams {
	pub target_id: String,
	/// Routes page traffic over the browser socket, keyed by `sessionId`.
	pub flatten: bool,
}

/// `Target.attachToTarget` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
	pub session_id: String,
}

/// `Target.closeTarget` parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTargetParams {
	pub target_id: String,
}

/// `Page.navigate` parameters.
#[derive(Debug, Clone, Serialize)]
pub struct NavigateParams {
	pub url: String,
}

/// `Page.navigate` result.
///
/// `error_text` is set when the navigation itself failed (DNS, TLS, aborted).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
	pub frame_id: String,
	#[serde(default)]
	pub error_text: Option<String>,
}

/// `Page.addScriptToEvaluateOnNewDocument` parameters.
#[derive(Debug, Clone, Serialize)]
pub struct AddScriptParams {
	pub source: String,
}

/// `Runtime.evaluate` parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
	pub expression: String,
	pub return_by_value: bool,
	pub await_promise: bool,
}

impl EvaluateParams {
	/// Evaluates `expression` and returns its JSON value.
	pub fn by_value(expression: impl Into<String>) -> Self {
		Self {
			expression: expression.into(),
			return_by_value: true,
			await_promise: false,
		}
	}
}

/// `Runtime.evaluate` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
	pub result: RemoteObject,
	#[serde(default)]
	pub exception_details: Option<ExceptionDetails>,
}

/// Subset of `Runtime.RemoteObject`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub value: Option<Value>,
	#[serde(default)]
	pub description: Option<String>,
}

/// Subset of `Runtime.ExceptionDetails`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
	pub text: String,
	#[serde(default)]
	pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
	/// Best human-readable description of the thrown value.
	pub fn message(&self) -> String {
		self.exception
			.as_ref()
			.and_then(|object| object.description.clone())
			.unwrap_or_else(|| self.text.clone())
	}
}

/// `Emulation.setDeviceMetricsOverride` parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetricsParams {
	pub width: u32,
	pub height: u32,
	pub device_scale_factor: f64,
	pub mobile: bool,
}

/// `Network.setUserAgentOverride` parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAgentParams {
	pub user_agent: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub accept_language: Option<String>,
}
