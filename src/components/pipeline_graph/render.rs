use std::f64::consts::PI;

use log::debug;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement};

use super::catalog::{CATALOG, StageId, chain_edges};
use super::picking::{FlatView, Picking};
use super::state::InteractionState;
use super::types::PointerSample;
use super::viewport::{Viewport, element_bounds};
use crate::error::RenderError;

const BACKGROUND: &str = "#0b1021";
const EDGE: &str = "#2e7dff";
const NODE: &str = "#2196f3";
const NODE_HOVERED: &str = "#1f5dcc";
const NODE_SELECTED: &str = "#4caf50";
const LABEL: &str = "#e8ecf1";

/// A drawing strategy for the pipeline graph. Both strategies share the
/// pointer and selection handling built on [`Picking`].
pub trait GraphRenderer {
	/// Re-reads the container size and rebuilds size-dependent geometry.
	fn resize(&mut self);

	fn draw(&mut self, interaction: &InteractionState);

	/// Animation step, called once per display frame when the renderer animates.
	fn tick(&mut self) {}

	fn canvas(&self) -> &HtmlCanvasElement;

	fn picker(&self) -> &dyn Picking;

	fn pick(&self, client_x: f64, client_y: f64) -> Option<StageId> {
		self.picker().pick(&PointerSample {
			client_x,
			client_y,
			bounds: element_bounds(self.canvas()),
		})
	}
}

pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, RenderError> {
	canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		.ok_or(RenderError::ContextUnavailable)
}

/// Sizes `canvas` to the container's current bounds.
pub fn fit_canvas(
	container: &Element,
	canvas: &HtmlCanvasElement,
	size: fn(f64, f64) -> Viewport,
) -> Viewport {
	let bounds = element_bounds(container);
	let viewport = size(bounds.width, bounds.height);
	if canvas.width() != viewport.width as u32 || canvas.height() != viewport.height as u32 {
		canvas.set_width(viewport.width as u32);
		canvas.set_height(viewport.height as u32);
	}
	viewport
}

/// Straight-chain renderer on a 2D canvas context.
pub struct FlatRenderer {
	container: Element,
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	view: FlatView,
}

impl FlatRenderer {
	pub fn new(container: Element, canvas: HtmlCanvasElement) -> Result<Self, RenderError> {
		let ctx = context_2d(&canvas)?;
		let viewport = fit_canvas(&container, &canvas, Viewport::flat);
		debug!("flat renderer ready at {}x{}", viewport.width, viewport.height);
		Ok(Self {
			container,
			canvas,
			ctx,
			view: FlatView::new(CATALOG, viewport),
		})
	}
}

impl GraphRenderer for FlatRenderer {
	fn resize(&mut self) {
		let viewport = fit_canvas(&self.container, &self.canvas, Viewport::flat);
		self.view.resize(viewport);
	}

	fn draw(&mut self, interaction: &InteractionState) {
		// Layout always comes from the bounds of this very frame.
		self.resize();
		paint(&self.view, interaction, &self.ctx);
	}

	fn canvas(&self) -> &HtmlCanvasElement {
		&self.canvas
	}

	fn picker(&self) -> &dyn Picking {
		&self.view
	}
}

fn paint(view: &FlatView, interaction: &InteractionState, ctx: &CanvasRenderingContext2d) {
	let viewport = view.viewport();
	ctx.clear_rect(0.0, 0.0, viewport.width, viewport.height);
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);
	draw_edges(view, ctx);
	draw_nodes(view, interaction, ctx);
}

fn draw_edges(view: &FlatView, ctx: &CanvasRenderingContext2d) {
	let points = view.points();
	ctx.set_stroke_style_str(EDGE);
	ctx.set_line_width(2.0);
	ctx.begin_path();
	for (a, b) in chain_edges(CATALOG) {
		let (Some(a), Some(b)) = (points.get(a), points.get(b)) else {
			continue;
		};
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x, b.y);
	}
	ctx.stroke();
}

fn draw_nodes(view: &FlatView, interaction: &InteractionState, ctx: &CanvasRenderingContext2d) {
	ctx.set_font("14px Arial");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for node in view.points() {
		let (fill, line_width) = if interaction.is_selected(node.id) {
			(NODE_SELECTED, 4.0)
		} else if interaction.is_hovered(node.id) {
			(NODE_HOVERED, 2.0)
		} else {
			(NODE, 2.0)
		};

		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, node.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(fill);
		ctx.fill();
		ctx.set_stroke_style_str(BACKGROUND);
		ctx.set_line_width(line_width);
		ctx.stroke();

		ctx.set_fill_style_str(LABEL);
		let _ = ctx.fill_text(node.label, node.x, node.y);
	}
}
