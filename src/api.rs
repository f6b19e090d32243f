//! HTTP client for the pipeline service.

use std::sync::OnceLock;

use gloo_net::http::{Request, Response};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::components::pipeline_graph::{RunRecord, StatusReport};
use crate::error::ApiError;

/// `<meta>` tag that overrides the service origin.
const API_BASE_META: &str = "pipeline-api-base";

/// Reads the service origin from the page, falling back to same-origin.
fn resolve_api_base() -> String {
	let base = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| {
			d.query_selector(&format!("meta[name=\"{API_BASE_META}\"]"))
				.ok()
				.flatten()
		})
		.and_then(|meta| meta.get_attribute("content"))
		.unwrap_or_default();
	info!("pipeline API base: {:?}", if base.is_empty() { "same origin" } else { base.as_str() });
	base
}

static API_BASE: OnceLock<String> = OnceLock::new();

pub fn api_base() -> &'static str {
	API_BASE.get_or_init(resolve_api_base).as_str()
}

fn endpoint(base: &str, path: &str) -> String {
	format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
	if !response.ok() {
		return Err(ApiError::Status {
			status: response.status(),
		});
	}
	response
		.json::<T>()
		.await
		.map_err(|e| ApiError::Decode(e.to_string()))
}

async fn get<T: DeserializeOwned>(path: &str) -> Result<T, ApiError> {
	let url = endpoint(api_base(), path);
	debug!("GET {url}");
	let response = Request::get(&url)
		.send()
		.await
		.map_err(|e| ApiError::Transport(e.to_string()))?;
	decode(response).await
}

async fn post<T: DeserializeOwned>(path: &str) -> Result<T, ApiError> {
	let url = endpoint(api_base(), path);
	debug!("POST {url}");
	let response = Request::post(&url)
		.send()
		.await
		.map_err(|e| ApiError::Transport(e.to_string()))?;
	decode(response).await
}

/// Triggers one full pipeline run.
pub async fn run_pipeline() -> Result<RunRecord, ApiError> {
	post("/pipeline/run").await
}

/// Loads a previously completed run.
pub async fn fetch_run(run_id: &str) -> Result<RunRecord, ApiError> {
	let id = String::from(js_sys::encode_uri_component(run_id));
	get(&format!("/pipeline/run/{id}")).await
}

pub async fn fetch_status() -> Result<StatusReport, ApiError> {
	get("/status").await
}

pub async fn fetch_last_packet() -> Result<Value, ApiError> {
	get("/packet/last").await
}

pub async fn execute_last() -> Result<Value, ApiError> {
	post("/execute/last").await
}

pub async fn report_last() -> Result<Value, ApiError> {
	get("/report/last").await
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn endpoint_joins_without_double_slashes() {
		assert_eq!(endpoint("", "/status"), "/status");
		assert_eq!(endpoint("http://localhost:8000/", "/status"), "http://localhost:8000/status");
		assert_eq!(endpoint("http://api", "pipeline/run"), "http://api/pipeline/run");
	}
}
