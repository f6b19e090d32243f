//! In-crate 3D scene: a perspective camera looking at a rotating group of
//! spheres, a ground grid, and an origin marker. Only the spheres take part
//! in ray casting.

use std::f32::consts::TAU;

use glam::{Mat4, Quat, Vec3, Vec4};

use super::catalog::{StageId, StageNode};
use super::layout::{ScenePoint, scene_layout};
use super::picking::Picking;
use super::state::InteractionState;
use super::types::PointerSample;
use super::viewport::Viewport;

pub const FOV_Y_DEGREES: f32 = 50.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 100.0;
/// The camera sits on the ray from the origin through this point; its
/// distance along that ray is chosen to frame the node row.
pub const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 3.0, 12.0);
pub const SPHERE_RADIUS: f32 = 0.6;
/// Radians added to the group rotation every frame.
pub const ROTATION_STEP: f32 = 0.005;
pub const PALETTE: &[&str] = &["#2196f3", "#ff9800", "#4caf50"];

const GRID_SIZE: f32 = 16.0;
const GRID_DIVISIONS: usize = 16;
const GRID_Y: f32 = -1.5;
const MARKER_LENGTH: f32 = 1.2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
	pub position: Vec3,
	pub target: Vec3,
	pub fov_y: f32,
	pub aspect: f32,
}

impl Camera {
	pub fn new(aspect: f32) -> Self {
		Self {
			position: CAMERA_POSITION,
			target: Vec3::ZERO,
			fov_y: FOV_Y_DEGREES.to_radians(),
			aspect,
		}
	}

	/// Moves the camera along its view direction so a row reaching
	/// `half_extent` either side of the target fits the narrower field of view.
	pub fn frame(&mut self, half_extent: f32) {
		let fit = (self.fov_y / 2.0).tan() * self.aspect.min(1.0);
		let distance = half_extent / fit;
		self.position = self.target + CAMERA_POSITION.normalize() * distance;
	}

	pub fn view(&self) -> Mat4 {
		Mat4::look_at_rh(self.position, self.target, Vec3::Y)
	}

	pub fn projection(&self) -> Mat4 {
		Mat4::perspective_rh_gl(self.fov_y, self.aspect, NEAR, FAR)
	}

	pub fn view_projection(&self) -> Mat4 {
		self.projection() * self.view()
	}

	/// Ray from the near plane through the given NDC point.
	pub fn ray(&self, ndc_x: f32, ndc_y: f32) -> Ray {
		let inverse = self.view_projection().inverse();
		let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, -1.0));
		let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
		Ray {
			origin: near,
			direction: (far - near).normalize(),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
	pub origin: Vec3,
	pub direction: Vec3,
}

impl Ray {
	/// Distance along the ray to the first front-facing hit on a sphere.
	pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
		let oc = self.origin - center;
		let b = oc.dot(self.direction);
		let c = oc.length_squared() - radius * radius;
		let disc = b * b - c;
		if disc < 0.0 {
			return None;
		}
		let root = disc.sqrt();
		[-b - root, -b + root].into_iter().find(|t| *t >= 0.0)
	}
}

/// Visual style of one sphere. Every node owns its own entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Material {
	pub color: &'static str,
	pub wireframe: bool,
	pub highlighted: bool,
}

/// Side table from stage to material, kept in step with the interaction state.
#[derive(Clone, Debug)]
pub struct MaterialTable {
	entries: Vec<(StageId, Material)>,
	wireframe: Option<StageId>,
}

impl MaterialTable {
	pub fn new(nodes: &[StageNode]) -> Self {
		let entries = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				(
					node.id,
					Material {
						color: PALETTE[i % PALETTE.len()],
						wireframe: false,
						highlighted: false,
					},
				)
			})
			.collect();
		Self {
			entries,
			wireframe: None,
		}
	}

	pub fn get(&self, id: StageId) -> Option<&Material> {
		self.entries.iter().find(|(s, _)| *s == id).map(|(_, m)| m)
	}

	fn get_mut(&mut self, id: StageId) -> Option<&mut Material> {
		self.entries.iter_mut().find(|(s, _)| *s == id).map(|(_, m)| m)
	}

	/// Moves the wireframe style to `id`. The old holder is restored first.
	pub fn select(&mut self, id: Option<StageId>) {
		if self.wireframe == id {
			return;
		}
		if let Some(prev) = self.wireframe.take() {
			if let Some(material) = self.get_mut(prev) {
				material.wireframe = false;
			}
		}
		if let Some(material) = id.and_then(|id| self.get_mut(id)) {
			material.wireframe = true;
			self.wireframe = id;
		}
	}

	pub fn hover(&mut self, id: Option<StageId>) {
		for (stage, material) in &mut self.entries {
			material.highlighted = Some(*stage) == id;
		}
	}

	pub fn sync(&mut self, interaction: &InteractionState) {
		self.select(interaction.selected());
		self.hover(interaction.hovered());
	}

	#[cfg(test)]
	pub fn wireframe_count(&self) -> usize {
		self.entries.iter().filter(|(_, m)| m.wireframe).count()
	}
}

/// A line segment that is drawn but never picked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
	pub from: Vec3,
	pub to: Vec3,
	pub color: &'static str,
}

fn decorations() -> Vec<Segment> {
	let half = GRID_SIZE / 2.0;
	let step = GRID_SIZE / GRID_DIVISIONS as f32;
	let mut segments = Vec::with_capacity((GRID_DIVISIONS + 1) * 2 + 3);
	for i in 0..=GRID_DIVISIONS {
		let offset = -half + step * i as f32;
		let color = if i == GRID_DIVISIONS / 2 {
			"#3a4660"
		} else {
			"#1f2638"
		};
		segments.push(Segment {
			from: Vec3::new(offset, GRID_Y, -half),
			to: Vec3::new(offset, GRID_Y, half),
			color,
		});
		segments.push(Segment {
			from: Vec3::new(-half, GRID_Y, offset),
			to: Vec3::new(half, GRID_Y, offset),
			color,
		});
	}
	for (axis, color) in [(Vec3::X, "#e53935"), (Vec3::Y, "#43a047"), (Vec3::Z, "#1e88e5")] {
		segments.push(Segment {
			from: Vec3::ZERO,
			to: axis * MARKER_LENGTH,
			color,
		});
	}
	segments
}

/// A world point mapped onto the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
	pub x: f64,
	pub y: f64,
	/// Distance in front of the camera.
	pub depth: f32,
}

#[derive(Clone, Debug)]
pub struct SceneView {
	camera: Camera,
	viewport: Viewport,
	nodes: Vec<ScenePoint>,
	rotation: f32,
	decorations: Vec<Segment>,
	pub materials: MaterialTable,
}

impl SceneView {
	pub fn new(nodes: &[StageNode], viewport: Viewport) -> Self {
		let mut view = Self {
			camera: Camera::new(viewport.aspect() as f32),
			viewport,
			nodes: scene_layout(nodes),
			rotation: 0.0,
			decorations: decorations(),
			materials: MaterialTable::new(nodes),
		};
		view.resize(viewport);
		view
	}

	/// Outermost node offset from the origin plus the sphere radius.
	fn half_extent(&self) -> f32 {
		self.nodes
			.iter()
			.map(|n| n.position.length())
			.fold(0.0, f32::max)
			+ SPHERE_RADIUS
	}

	#[cfg(test)]
	pub fn camera(&self) -> &Camera {
		&self.camera
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	pub fn nodes(&self) -> &[ScenePoint] {
		&self.nodes
	}

	pub fn decorations(&self) -> &[Segment] {
		&self.decorations
	}

	pub fn rotation(&self) -> f32 {
		self.rotation
	}

	pub fn resize(&mut self, viewport: Viewport) {
		self.viewport = viewport;
		self.camera.aspect = viewport.aspect() as f32;
		self.camera.frame(self.half_extent());
	}

	/// One animation tick.
	pub fn advance(&mut self) {
		self.rotation = (self.rotation + ROTATION_STEP) % TAU;
	}

	#[cfg(test)]
	pub fn set_rotation(&mut self, radians: f32) {
		self.rotation = radians % TAU;
	}

	/// Position of the `index`-th node with the group rotation applied.
	pub fn world_position(&self, index: usize) -> Option<Vec3> {
		self.nodes
			.get(index)
			.map(|n| Quat::from_rotation_y(self.rotation) * n.position)
	}

	pub fn project(&self, world: Vec3) -> Option<Projected> {
		let clip = self.camera.view_projection() * Vec4::new(world.x, world.y, world.z, 1.0);
		if clip.w <= NEAR {
			return None;
		}
		let ndc = clip.truncate() / clip.w;
		Some(Projected {
			x: ((ndc.x + 1.0) / 2.0) as f64 * self.viewport.width,
			y: ((1.0 - ndc.y) / 2.0) as f64 * self.viewport.height,
			depth: clip.w,
		})
	}

	/// On-screen radius of a sphere at `depth`.
	pub fn projected_radius(&self, depth: f32) -> f64 {
		let focal = (self.viewport.height / 2.0) as f32 / (self.camera.fov_y / 2.0).tan();
		(SPHERE_RADIUS * focal / depth) as f64
	}

	/// Node indices ordered back to front.
	pub fn draw_order(&self) -> Vec<(usize, Projected)> {
		let mut order: Vec<_> = (0..self.nodes.len())
			.filter_map(|i| {
				self.world_position(i)
					.and_then(|p| self.project(p))
					.map(|p| (i, p))
			})
			.collect();
		order.sort_by(|a, b| b.1.depth.total_cmp(&a.1.depth));
		order
	}

	fn cast(&self, ray: &Ray) -> Option<StageId> {
		(0..self.nodes.len())
			.filter_map(|i| {
				let center = self.world_position(i)?;
				ray.intersect_sphere(center, SPHERE_RADIUS)
					.map(|t| (t, self.nodes[i].id))
			})
			.min_by(|a, b| a.0.total_cmp(&b.0))
			.map(|(_, id)| id)
	}
}

impl Picking for SceneView {
	fn pick(&self, pointer: &PointerSample) -> Option<StageId> {
		let (x, y) = pointer.ndc()?;
		self.cast(&self.camera.ray(x as f32, y as f32))
	}
}

#[cfg(test)]
mod tests {
	use super::super::catalog::CATALOG;
	use super::super::state::InteractionState;
	use super::super::types::{Bounds, PointerKind};
	use super::*;

	fn scene(width: f64, height: f64) -> SceneView {
		SceneView::new(CATALOG, Viewport::scene(width, height))
	}

	fn at(view: &SceneView, x: f64, y: f64) -> PointerSample {
		PointerSample {
			client_x: x + 30.0,
			client_y: y + 12.0,
			bounds: Bounds {
				left: 30.0,
				top: 12.0,
				width: view.viewport().width,
				height: view.viewport().height,
			},
		}
	}

	#[test]
	fn projected_centres_pick_their_node() {
		for rotation in [0.0, 0.3, -0.4] {
			let mut view = scene(800.0, 600.0);
			view.set_rotation(rotation);
			for (i, node) in view.nodes().iter().enumerate() {
				let p = view.project(view.world_position(i).unwrap()).unwrap();
				assert_eq!(view.pick(&at(&view, p.x, p.y)), Some(node.id), "rotation {rotation}");
			}
		}
	}

	#[test]
	fn decorations_are_not_pickable() {
		let view = scene(800.0, 600.0);
		assert_eq!(view.pick(&at(&view, 2.0, 2.0)), None);
		let on_grid_line = Vec3::new(-6.0, GRID_Y, 3.0);
		let p = view.project(on_grid_line).unwrap();
		assert_eq!(view.pick(&at(&view, p.x, p.y)), None);
		let marker_tip = view.decorations().last().unwrap().to;
		assert_eq!(marker_tip, Vec3::Z * MARKER_LENGTH);
	}

	#[test]
	fn nearest_sphere_wins_when_they_overlap() {
		let mut view = scene(800.0, 600.0);
		// A quarter turn lines the row up with the view direction.
		view.set_rotation(std::f32::consts::FRAC_PI_2);
		let far = view.project(view.world_position(4).unwrap()).unwrap();
		let near = view.project(view.world_position(3).unwrap()).unwrap();
		assert!(far.depth > near.depth);
		assert_eq!(view.pick(&at(&view, far.x, far.y)), Some(CATALOG[3].id));
		assert!(view.camera().ray(0.0, 0.0).intersect_sphere(Vec3::ZERO, SPHERE_RADIUS).is_some());
	}

	#[test]
	fn rotation_advances_and_wraps() {
		let mut view = scene(800.0, 600.0);
		view.advance();
		assert_eq!(view.rotation(), ROTATION_STEP);
		view.set_rotation(TAU - ROTATION_STEP / 2.0);
		view.advance();
		assert!(view.rotation() < ROTATION_STEP);
	}

	#[test]
	fn portrait_surfaces_keep_the_whole_row_in_view() {
		for (width, height) in [(800.0, 600.0), (400.0, 800.0), (300.0, 900.0)] {
			let mut view = scene(1024.0, 768.0);
			view.resize(Viewport::scene(width, height));
			for i in 0..CATALOG.len() {
				let p = view.project(view.world_position(i).unwrap()).unwrap();
				assert!((0.0..=width).contains(&p.x), "node {i} at x={} on {width}x{height}", p.x);
				assert_eq!(view.pick(&at(&view, p.x, p.y)), Some(CATALOG[i].id));
			}
		}
	}

	#[test]
	fn camera_keeps_its_view_direction_when_reframed() {
		let wide = scene(800.0, 600.0);
		let tall = scene(300.0, 900.0);
		let dir = |v: &SceneView| (v.camera().position - v.camera().target).normalize();
		assert!(dir(&wide).abs_diff_eq(CAMERA_POSITION.normalize(), 1e-5));
		assert!(dir(&tall).abs_diff_eq(CAMERA_POSITION.normalize(), 1e-5));
		assert!(tall.camera().position.length() > wide.camera().position.length());
	}

	#[test]
	fn resize_updates_camera_aspect() {
		let mut view = scene(800.0, 600.0);
		view.resize(Viewport::scene(400.0, 400.0));
		assert_eq!(view.camera().aspect, 1.0);
		assert_eq!(view.viewport().width, 400.0);
		let p = view.project(Vec3::ZERO).unwrap();
		assert!((p.x - 200.0).abs() < 1e-3);
	}

	#[test]
	fn one_wireframe_at_a_time() {
		let mut table = MaterialTable::new(CATALOG);
		table.select(Some(CATALOG[0].id));
		table.select(Some(CATALOG[3].id));
		assert_eq!(table.wireframe_count(), 1);
		assert!(!table.get(CATALOG[0].id).unwrap().wireframe);
		assert!(table.get(CATALOG[3].id).unwrap().wireframe);
		// Palette entries are shared by colour, not by instance.
		assert_eq!(
			table.get(CATALOG[0].id).unwrap().color,
			table.get(CATALOG[3].id).unwrap().color
		);
		table.select(None);
		assert_eq!(table.wireframe_count(), 0);
	}

	#[test]
	fn materials_follow_interaction_state() {
		let mut table = MaterialTable::new(CATALOG);
		let mut interaction = InteractionState::default();
		interaction.apply(PointerKind::Down, Some(CATALOG[1].id));
		interaction.apply(PointerKind::Move, Some(CATALOG[4].id));
		table.sync(&interaction);
		assert!(table.get(CATALOG[1].id).unwrap().wireframe);
		assert!(table.get(CATALOG[4].id).unwrap().highlighted);
		assert!(!table.get(CATALOG[1].id).unwrap().highlighted);
	}

	#[test]
	fn draw_order_is_back_to_front() {
		let mut view = scene(800.0, 600.0);
		view.set_rotation(0.8);
		let order = view.draw_order();
		assert_eq!(order.len(), CATALOG.len());
		assert!(order.windows(2).all(|w| w[0].1.depth >= w[1].1.depth));
	}
}
