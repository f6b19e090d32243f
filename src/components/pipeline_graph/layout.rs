use glam::Vec3;

use super::catalog::{StageId, StageNode};
use super::viewport::Viewport;

/// Margin between the outermost nodes and the surface edges.
pub const PADDING: f64 = 80.0;
pub const NODE_RADIUS: f64 = 26.0;

/// Distance between neighbouring spheres in scene units.
pub const SCENE_SPACING: f32 = 2.5;

/// Screen-space placement of one node on the flat surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatPoint {
	pub id: StageId,
	pub label: &'static str,
	pub x: f64,
	pub y: f64,
	pub radius: f64,
}

impl FlatPoint {
	pub fn contains(&self, x: f64, y: f64) -> bool {
		let (dx, dy) = (x - self.x, y - self.y);
		(dx * dx + dy * dy).sqrt() <= self.radius
	}
}

/// Scene-space placement of one node, before the group rotation is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScenePoint {
	pub id: StageId,
	pub label: &'static str,
	pub position: Vec3,
}

/// Spreads `nodes` along the horizontal centre line of `viewport`.
pub fn flat_layout(nodes: &[StageNode], viewport: Viewport) -> Vec<FlatPoint> {
	let spacing = if nodes.len() > 1 {
		(viewport.width - PADDING * 2.0) / (nodes.len() - 1) as f64
	} else {
		0.0
	};
	let y = viewport.height / 2.0;

	nodes
		.iter()
		.enumerate()
		.map(|(i, node)| FlatPoint {
			id: node.id,
			label: node.label,
			x: if nodes.len() > 1 {
				PADDING + spacing * i as f64
			} else {
				viewport.width / 2.0
			},
			y,
			radius: NODE_RADIUS,
		})
		.collect()
}

/// Places `nodes` on the x axis, centred on the origin.
pub fn scene_layout(nodes: &[StageNode]) -> Vec<ScenePoint> {
	let center = nodes.len().saturating_sub(1) as f32 / 2.0;
	nodes
		.iter()
		.enumerate()
		.map(|(i, node)| ScenePoint {
			id: node.id,
			label: node.label,
			position: Vec3::new((i as f32 - center) * SCENE_SPACING, 0.0, 0.0),
		})
		.collect()
}
