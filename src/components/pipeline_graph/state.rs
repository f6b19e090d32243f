use log::{debug, info, warn};
use serde_json::Value;

use super::catalog::{PACKET, StageId};
use super::types::{PointerKind, RunRecord};
use crate::error::ApiError;

pub const NO_RUN: &str = "No run yet.";
pub const NO_DATA: &str = "No data for node";
pub const RUNNING: &str = "Running...";
pub const RUN_ERROR: &str = "Error running pipeline";

/// Hovered and selected node. Pointer handling is the only writer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InteractionState {
	hovered: Option<StageId>,
	selected: Option<StageId>,
}

impl InteractionState {
	pub fn hovered(&self) -> Option<StageId> {
		self.hovered
	}

	pub fn selected(&self) -> Option<StageId> {
		self.selected
	}

	pub fn is_hovered(&self, id: StageId) -> bool {
		self.hovered == Some(id)
	}

	pub fn is_selected(&self, id: StageId) -> bool {
		self.selected == Some(id)
	}

	/// Applies a picking result. Returns `true` when the selection changed.
	///
	/// Moves only touch the hover. A press with no hit keeps the previous
	/// selection.
	pub fn apply(&mut self, kind: PointerKind, hit: Option<StageId>) -> bool {
		self.hovered = hit;
		match (kind, hit) {
			(PointerKind::Down, Some(id)) => {
				let changed = self.selected != Some(id);
				self.selected = Some(id);
				changed
			}
			_ => false,
		}
	}

	pub fn clear_hover(&mut self) {
		self.hovered = None;
	}

	fn select(&mut self, id: StageId) {
		self.selected = Some(id);
	}
}

/// What the output surface shows for a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeDisplay<'a> {
	NoRun,
	Missing,
	Value(&'a Value),
}

impl NodeDisplay<'_> {
	pub fn render(&self) -> String {
		match self {
			Self::NoRun => NO_RUN.to_string(),
			Self::Missing => NO_DATA.to_string(),
			Self::Value(value) => pretty(value),
		}
	}
}

pub fn pretty(value: &Value) -> String {
	serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// The most recent run record, replaced wholesale on every successful fetch.
#[derive(Clone, Debug, Default)]
pub struct RunBinding {
	last_run: Option<RunRecord>,
	pending: usize,
}

impl RunBinding {
	#[cfg(test)]
	pub fn last_run(&self) -> Option<&RunRecord> {
		self.last_run.as_ref()
	}

	pub fn is_pending(&self) -> bool {
		self.pending > 0
	}

	pub fn replace(&mut self, record: RunRecord) {
		self.last_run = Some(record);
	}

	/// Per-stage output of the last run. A missing entry is not an error.
	pub fn output(&self, id: StageId) -> NodeDisplay<'_> {
		let Some(run) = &self.last_run else {
			return NodeDisplay::NoRun;
		};
		run.nodes
			.iter()
			.find(|n| n.id == id.as_str())
			.map_or(NodeDisplay::Missing, |n| NodeDisplay::Value(&n.output))
	}

	/// Like [`Self::output`], but the terminal stage prefers the packet artifact.
	pub fn display(&self, id: StageId) -> NodeDisplay<'_> {
		if id == PACKET {
			if let Some(packet) = self.last_run.as_ref().and_then(|r| r.packet.as_ref()) {
				return NodeDisplay::Value(packet);
			}
		}
		self.output(id)
	}
}

/// Text updates produced by a state transition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewUpdate {
	pub status: Option<String>,
	pub output: Option<String>,
}

/// Interaction and run state for one mounted graph view.
#[derive(Clone, Debug, Default)]
pub struct PipelineView {
	pub interaction: InteractionState,
	pub binding: RunBinding,
}

impl PipelineView {
	pub fn pointer(&mut self, kind: PointerKind, hit: Option<StageId>) -> ViewUpdate {
		if self.interaction.apply(kind, hit) {
			debug!("selected {:?}", self.interaction.selected());
		}
		match (kind, hit) {
			(PointerKind::Down, Some(_)) => ViewUpdate {
				status: None,
				output: self.selected_output(),
			},
			_ => ViewUpdate::default(),
		}
	}

	pub fn pointer_left(&mut self) {
		self.interaction.clear_hover();
	}

	pub fn selected_output(&self) -> Option<String> {
		self.interaction
			.selected()
			.map(|id| self.binding.display(id).render())
	}

	pub fn run_started(&mut self) -> ViewUpdate {
		self.binding.pending += 1;
		ViewUpdate {
			status: Some(RUNNING.to_string()),
			output: None,
		}
	}

	/// Settles a run request. Failures leave the previous record and selection alone.
	pub fn run_finished(&mut self, result: Result<RunRecord, ApiError>) -> ViewUpdate {
		self.binding.pending = self.binding.pending.saturating_sub(1);
		match result {
			Ok(record) => {
				info!("run {} complete with {} node outputs", record.run_id, record.nodes.len());
				let status = format!("Run {} complete", record.run_id);
				self.binding.replace(record);
				self.interaction.select(PACKET);
				ViewUpdate {
					status: Some(status),
					output: self.selected_output(),
				}
			}
			Err(err) => {
				warn!("pipeline run failed: {err}");
				ViewUpdate {
					status: Some(RUN_ERROR.to_string()),
					output: None,
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::super::catalog::CATALOG;
	use super::super::picking::{FlatView, Picking};
	use super::super::types::{Bounds, PointerSample};
	use super::super::viewport::Viewport;
	use super::*;

	fn record() -> RunRecord {
		serde_json::from_value(json!({
			"run_id": "run-42",
			"nodes": [
				{ "id": "news", "output": { "headlines": ["a", "b"] } },
				{ "id": "parser", "output": { "ticker": "XYZ" } },
				{ "id": "brain", "output": { "action": "hold" } },
				{ "id": "packet", "output": { "stage": "packet" } },
				{ "id": "mystery", "output": 1 }
			],
			"packet": { "signed": true }
		}))
		.unwrap()
	}

	#[test]
	fn moves_never_select() {
		let mut state = InteractionState::default();
		assert!(!state.apply(PointerKind::Move, Some(CATALOG[1].id)));
		assert_eq!(state.hovered(), Some(CATALOG[1].id));
		assert_eq!(state.selected(), None);
		state.apply(PointerKind::Move, None);
		assert_eq!(state.hovered(), None);
	}

	#[test]
	fn press_without_hit_keeps_selection() {
		let mut state = InteractionState::default();
		assert!(state.apply(PointerKind::Down, Some(CATALOG[2].id)));
		assert!(!state.apply(PointerKind::Down, None));
		assert_eq!(state.selected(), Some(CATALOG[2].id));
		assert_eq!(state.hovered(), None);
		assert!(!state.apply(PointerKind::Down, Some(CATALOG[2].id)));
	}

	#[test]
	fn hover_and_selection_may_coincide() {
		let mut state = InteractionState::default();
		state.apply(PointerKind::Down, Some(CATALOG[0].id));
		assert!(state.is_hovered(CATALOG[0].id) && state.is_selected(CATALOG[0].id));
		state.clear_hover();
		assert!(!state.is_hovered(CATALOG[0].id) && state.is_selected(CATALOG[0].id));
	}

	#[test]
	fn lookup_reports_no_run_then_missing_entries() {
		let mut binding = RunBinding::default();
		assert_eq!(binding.display(CATALOG[0].id), NodeDisplay::NoRun);
		binding.replace(record());
		assert_eq!(binding.output(CATALOG[3].id), NodeDisplay::Missing);
		assert_eq!(binding.display(CATALOG[3].id).render(), NO_DATA);
		assert_eq!(
			binding.display(CATALOG[1].id),
			NodeDisplay::Value(&json!({ "ticker": "XYZ" }))
		);
	}

	#[test]
	fn packet_node_prefers_packet_artifact() {
		let mut binding = RunBinding::default();
		let mut run = record();
		binding.replace(run.clone());
		assert_eq!(binding.display(PACKET), NodeDisplay::Value(&json!({ "signed": true })));

		run.packet = None;
		binding.replace(run);
		assert_eq!(
			binding.display(PACKET),
			NodeDisplay::Value(&json!({ "stage": "packet" }))
		);
	}

	#[test]
	fn selecting_a_node_shows_its_output() {
		let mut view = PipelineView::default();
		view.binding.replace(record());
		let update = view.pointer(PointerKind::Down, Some(CATALOG[2].id));
		assert_eq!(update.output, Some(pretty(&record().nodes[2].output)));
		assert_eq!(view.interaction.selected(), Some(CATALOG[2].id));
	}

	#[test]
	fn press_on_third_node_centre_shows_its_output() {
		let flat = FlatView::new(CATALOG, Viewport::flat(800.0, 600.0));
		let centre = flat.points()[2];
		let hit = flat.pick(&PointerSample {
			client_x: centre.x,
			client_y: centre.y,
			bounds: Bounds {
				left: 0.0,
				top: 0.0,
				width: 800.0,
				height: 600.0,
			},
		});

		let mut view = PipelineView::default();
		view.binding.replace(record());
		let update = view.pointer(PointerKind::Down, hit);
		assert_eq!(view.interaction.selected(), Some(CATALOG[2].id));
		assert_eq!(update.output, Some(pretty(&record().nodes[2].output)));

		let update = view.pointer(PointerKind::Down, flat.pick(&PointerSample {
			client_x: 5.0,
			client_y: 5.0,
			bounds: Bounds::default(),
		}));
		assert_eq!(update, ViewUpdate::default());
		assert_eq!(view.interaction.selected(), Some(CATALOG[2].id));
	}

	#[test]
	fn successful_run_selects_packet_and_replaces_record() {
		let mut view = PipelineView::default();
		view.interaction.apply(PointerKind::Down, Some(CATALOG[0].id));
		assert_eq!(view.run_started().status.as_deref(), Some(RUNNING));
		assert!(view.binding.is_pending());

		let update = view.run_finished(Ok(record()));
		assert!(!view.binding.is_pending());
		assert_eq!(update.status.as_deref(), Some("Run run-42 complete"));
		assert_eq!(update.output, Some(pretty(&json!({ "signed": true }))));
		assert_eq!(view.interaction.selected(), Some(PACKET));

		let second = RunRecord {
			run_id: "run-43".into(),
			nodes: vec![],
			packet: None,
		};
		let update = view.run_finished(Ok(second.clone()));
		assert_eq!(view.binding.last_run(), Some(&second));
		assert_eq!(update.output.as_deref(), Some(NO_DATA));
	}

	#[test]
	fn overlapping_runs_stay_pending_until_all_settle() {
		let mut view = PipelineView::default();
		view.run_started();
		view.run_started();
		view.run_finished(Ok(record()));
		assert!(view.binding.is_pending());
		view.run_finished(Err(ApiError::Status { status: 503 }));
		assert!(!view.binding.is_pending());
		assert_eq!(view.binding.last_run().map(|r| r.run_id.as_str()), Some("run-42"));
	}

	#[test]
	fn failed_run_keeps_previous_state() {
		let mut view = PipelineView::default();
		view.run_started();
		let update = view.run_finished(Err(ApiError::Transport("offline".into())));
		assert_eq!(update.status.as_deref(), Some(RUN_ERROR));
		assert_eq!(update.output, None);
		assert!(view.binding.last_run().is_none());
		assert_eq!(view.interaction.selected(), None);

		view.run_finished(Ok(record()));
		view.interaction.apply(PointerKind::Down, Some(CATALOG[1].id));
		view.run_finished(Err(ApiError::Status { status: 500 }));
		assert_eq!(view.binding.last_run().map(|r| r.run_id.as_str()), Some("run-42"));
		assert_eq!(view.interaction.selected(), Some(CATALOG[1].id));
	}
}
