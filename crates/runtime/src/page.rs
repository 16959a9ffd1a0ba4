//! A single page target driven over a flattened CDP session.

use std::sync::Arc;

use clipr_protocol::{
	AddScriptParams, AttachToTargetParams, AttachToTargetResult, CloseTargetParams, CreateTargetParams, CreateTargetResult,
	DeviceMetricsParams, EvaluateParams, EvaluateResult, NavigateParams, NavigateResult, UserAgentParams,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::connection::Connection;
use crate::error::{Error, Result};

/// Handle to one attached page.
pub struct CdpPage {
	connection: Arc<Connection>,
	target_id: String,
	session_id: String,
}

impl CdpPage {
	/// Opens a blank page and attaches to it.
	pub async fn open(connection: Arc<Connection>) -> Result<Self> {
		let created: CreateTargetResult = call_typed(
			&connection,
			None,
			"Target.createTarget",
			&CreateTargetParams {
				url: "about:blank".into(),
			},
		)
		.await?;

		let attached: AttachToTargetResult = call_typed(
			&connection,
			None,
			"Target.attachToTarget",
			&AttachToTargetParams {
				target_id: created.target_id.clone(),
				flatten: true,
			},
		)
		.await?;

		debug!(
			target = "clipr.runtime",
			target_id = %created.target_id,
			session_id = %attached.session_id,
			"page attached"
		);

		Ok(Self {
			connection,
			target_id: created.target_id,
			session_id: attached.session_id,
		})
	}

	pub fn target_id(&self) -> &str {
		&self.target_id
	}

	pub fn connection(&self) -> &Arc<Connection> {
		&self.connection
	}

	/// Sends a raw page-scoped command.
	pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
		self.connection.send_message(Some(&self.session_id), method, params).await
	}

	/// Starts a navigation. Returns once the browser accepted it, not when the
	/// document finished loading.
	pub async fn navigate(&self, url: &str) -> Result<()> {
		let result: NavigateResult = call_typed(
			&self.connection,
			Some(&self.session_id),
			"Page.navigate",
			&NavigateParams { url: url.to_string() },
		)
		.await?;

		match result.error_text {
			Some(reason) if !reason.is_empty() => Err(Error::Navigation {
				url: url.to_string(),
				reason,
			}),
			_ => Ok(()),
		}
	}

	/// Evaluates `expression` in the page's main world and returns its value.
	///
	/// `undefined` evaluates to `Value::Null`.
	pub async fn evaluate(&self, expression: &str) -> Result<Value> {
		let result: EvaluateResult = call_typed(
			&self.connection,
			Some(&self.session_id),
			"Runtime.evaluate",
			&EvaluateParams::by_value(expression),
		)
		.await?;

		if let Some(details) = result.exception_details {
			return Err(Error::Evaluation(details.message()));
		}
		Ok(result.result.value.unwrap_or(Value::Null))
	}

	/// Registers a script that runs before any page script on every navigation.
	pub async fn add_init_script(&self, source: &str) -> Result<()> {
		self.call(
			"Page.addScriptToEvaluateOnNewDocument",
			serde_json::to_value(AddScriptParams {
				source: source.to_string(),
			})?,
		)
		.await
		.map(drop)
	}

	pub async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
		let params = DeviceMetricsParams {
			width,
			height,
			device_scale_factor: 1.0,
			mobile: false,
		};
		self.call("Emulation.setDeviceMetricsOverride", serde_json::to_value(params)?)
			.await
			.map(drop)
	}

	pub async fn set_user_agent(&self, user_agent: &str, accept_language: Option<&str>) -> Result<()> {
		let params = UserAgentParams {
			user_agent: user_agent.to_string(),
			accept_language: accept_language.map(str::to_string),
		};
		self.call("Network.setUserAgentOverride", serde_json::to_value(params)?)
			.await
			.map(drop)
	}

	/// Closes the page target.
	pub async fn close(&self) -> Result<()> {
		call_typed::<_, Value>(
			&self.connection,
			None,
			"Target.closeTarget",
			&CloseTargetParams {
				target_id: self.target_id.clone(),
			},
		)
		.await
		.map(drop)
	}
}

async fn call_typed<P, R>(connection: &Connection, session_id: Option<&str>, method: &str, params: &P) -> Result<R>
where
	P: Serialize,
	R: DeserializeOwned,
{
	let value = connection.send_message(session_id, method, serde_json::to_value(params)?).await?;
	Ok(serde_json::from_value(value)?)
}
