use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

/// One stage's output inside a run record.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NodeOutput {
	pub id: String,
	#[serde(default)]
	pub output: Value,
}

/// Result of one pipeline execution as returned by the run endpoints.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RunRecord {
	pub run_id: String,
	#[serde(default)]
	pub nodes: Vec<NodeOutput>,
	#[serde(default)]
	pub packet: Option<Value>,
}

/// Advisory service status.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct StatusReport {
	pub mode: String,
	#[serde(default)]
	pub profiles: Vec<String>,
	#[serde(default)]
	pub last_run_id: Option<String>,
}

impl StatusReport {
	pub fn summary(&self) -> String {
		let mut line = format!("Mode: {}", self.mode);
		if !self.profiles.is_empty() {
			line.push_str(&format!(" | Profiles: {}", self.profiles.join(", ")));
		}
		match &self.last_run_id {
			Some(id) => line.push_str(&format!(" | Last run: {id}")),
			None => line.push_str(" | No runs yet"),
		}
		line
	}
}

/// Screen rectangle of a surface, in client (CSS pixel) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
}

/// A pointer position in client coordinates together with the bounds of the
/// surface it landed on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
	pub client_x: f64,
	pub client_y: f64,
	pub bounds: Bounds,
}

impl PointerSample {
	/// Position relative to the surface's top-left corner.
	pub fn local(&self) -> (f64, f64) {
		(
			self.client_x - self.bounds.left,
			self.client_y - self.bounds.top,
		)
	}

	/// Normalized device coordinates, y pointing up. `None` for an empty surface.
	pub fn ndc(&self) -> Option<(f64, f64)> {
		if self.bounds.width <= 0.0 || self.bounds.height <= 0.0 {
			return None;
		}
		let (x, y) = self.local();
		Some((
			(x / self.bounds.width) * 2.0 - 1.0,
			-(y / self.bounds.height) * 2.0 + 1.0,
		))
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerKind {
	#[default]
	Move,
	Down,
}

/// Which renderer draws the graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
	#[default]
	Flat,
	Scene,
}

impl FromStr for ViewMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"2d" | "flat" | "canvas" => Ok(Self::Flat),
			"3d" | "scene" => Ok(Self::Scene),
			other => Err(format!("unknown view mode: {other}")),
		}
	}
}
