use super::catalog::{StageId, StageNode};
use super::layout::{FlatPoint, flat_layout};
use super::types::PointerSample;
use super::viewport::Viewport;

/// Maps a pointer position to the node under it, if any. Implementations only
/// read the geometry of the most recent frame.
pub trait Picking {
	fn pick(&self, pointer: &PointerSample) -> Option<StageId>;
}

/// Cached flat layout for the frame currently on screen.
#[derive(Clone, Debug)]
pub struct FlatView {
	nodes: &'static [StageNode],
	viewport: Viewport,
	points: Vec<FlatPoint>,
}

impl FlatView {
	pub fn new(nodes: &'static [StageNode], viewport: Viewport) -> Self {
		Self {
			nodes,
			viewport,
			points: flat_layout(nodes, viewport),
		}
	}

	/// Replaces the whole layout for a new surface size.
	pub fn resize(&mut self, viewport: Viewport) {
		self.viewport = viewport;
		self.points = flat_layout(self.nodes, viewport);
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	pub fn points(&self) -> &[FlatPoint] {
		&self.points
	}
}

impl Picking for FlatView {
	fn pick(&self, pointer: &PointerSample) -> Option<StageId> {
		let (x, y) = pointer.local();
		self.points.iter().find(|p| p.contains(x, y)).map(|p| p.id)
	}
}

#[cfg(test)]
mod tests {
	use super::super::catalog::CATALOG;
	use super::super::layout::NODE_RADIUS;
	use super::super::types::Bounds;
	use super::*;

	fn sample(x: f64, y: f64, left: f64, top: f64) -> PointerSample {
		PointerSample {
			client_x: x,
			client_y: y,
			bounds: Bounds {
				left,
				top,
				width: 800.0,
				height: 600.0,
			},
		}
	}

	#[test]
	fn pointer_on_each_centre_hits_that_node() {
		let view = FlatView::new(CATALOG, Viewport::flat(800.0, 600.0));
		for point in view.points() {
			let hit = view.pick(&sample(point.x + 15.0, point.y + 40.0, 15.0, 40.0));
			assert_eq!(hit, Some(point.id));
		}
	}

	#[test]
	fn radius_boundary_is_inclusive() {
		let view = FlatView::new(CATALOG, Viewport::flat(800.0, 600.0));
		let first = view.points()[0];
		assert_eq!(
			view.pick(&sample(first.x + NODE_RADIUS, first.y, 0.0, 0.0)),
			Some(first.id)
		);
		assert_eq!(
			view.pick(&sample(first.x + NODE_RADIUS + 0.5, first.y, 0.0, 0.0)),
			None
		);
	}

	#[test]
	fn empty_space_misses() {
		let view = FlatView::new(CATALOG, Viewport::flat(800.0, 600.0));
		assert_eq!(view.pick(&sample(10.0, 10.0, 0.0, 0.0)), None);
		assert_eq!(view.pick(&sample(160.0, 300.0, 0.0, 0.0)), None);
	}

	#[test]
	fn picking_follows_the_latest_resize() {
		let mut view = FlatView::new(CATALOG, Viewport::flat(800.0, 600.0));
		let old_last = *view.points().last().unwrap();
		view.resize(Viewport::flat(400.0, 300.0));
		assert_eq!(view.viewport(), Viewport::flat(400.0, 300.0));
		assert_eq!(view.pick(&sample(old_last.x, old_last.y, 0.0, 0.0)), None);
		assert_eq!(view.pick(&sample(320.0, 150.0, 0.0, 0.0)), Some(old_last.id));
	}
}
