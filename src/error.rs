//! Error types shared by the renderers and the API client.

use thiserror::Error;

/// Why a renderer could not be brought up. Shown once in the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
	#[error("Canvas not supported in this browser")]
	ContextUnavailable,
	#[error("3D view unavailable: missing {}", .missing.join(", "))]
	CapabilityUnavailable { missing: Vec<&'static str> },
	#[error("Error initializing canvas: {0}")]
	Dom(String),
}

/// Failure of a call to the pipeline service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
	#[error("request failed: {0}")]
	Transport(String),
	#[error("HTTP error: {status}")]
	Status { status: u16 },
	#[error("failed to parse response: {0}")]
	Decode(String),
}
