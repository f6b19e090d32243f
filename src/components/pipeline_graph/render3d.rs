use std::cell::{Cell, RefCell};
use std::f64::consts::PI;
use std::rc::Rc;

use log::{debug, info};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement, Window};

use super::catalog::CATALOG;
use super::picking::Picking;
use super::render::{GraphRenderer, context_2d, fit_canvas};
use super::scene::{Material, SceneView};
use super::state::InteractionState;
use super::viewport::Viewport;
use crate::error::RenderError;

const BACKGROUND: &str = "#0b1021";
const LABEL: &str = "#e8ecf1";

/// Lists what the scene renderer needs but the browser lacks.
fn missing_capabilities(window: &Window, canvas: &HtmlCanvasElement) -> Vec<&'static str> {
	let mut missing = Vec::new();
	for name in ["requestAnimationFrame", "ResizeObserver"] {
		if !js_sys::Reflect::has(window, &JsValue::from_str(name)).unwrap_or(false) {
			missing.push(name);
		}
	}
	if context_2d(canvas).is_err() {
		missing.push("canvas 2D context");
	}
	let accelerated = window
		.document()
		.and_then(|doc| doc.create_element("canvas").ok())
		.and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
		.is_some_and(|probe| {
			["webgl2", "webgl"]
				.into_iter()
				.any(|kind| matches!(probe.get_context(kind), Ok(Some(_))))
		});
	if !accelerated {
		missing.push("hardware-accelerated context (WebGL)");
	}
	missing
}

/// Rotating sphere scene rasterised onto a 2D canvas.
pub struct SceneRenderer {
	container: Element,
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	view: SceneView,
}

impl SceneRenderer {
	pub fn new(container: Element, canvas: HtmlCanvasElement) -> Result<Self, RenderError> {
		let window = web_sys::window().ok_or_else(|| RenderError::Dom("no window".into()))?;
		let missing = missing_capabilities(&window, &canvas);
		if !missing.is_empty() {
			return Err(RenderError::CapabilityUnavailable { missing });
		}
		let ctx = context_2d(&canvas)?;
		let viewport = fit_canvas(&container, &canvas, Viewport::scene);
		info!("scene renderer ready at {}x{}", viewport.width, viewport.height);
		Ok(Self {
			container,
			canvas,
			ctx,
			view: SceneView::new(CATALOG, viewport),
		})
	}

	fn draw_decorations(&self) {
		let ctx = &self.ctx;
		ctx.set_line_width(1.0);
		for segment in self.view.decorations() {
			let (Some(a), Some(b)) = (self.view.project(segment.from), self.view.project(segment.to))
			else {
				continue;
			};
			ctx.set_stroke_style_str(segment.color);
			ctx.begin_path();
			ctx.move_to(a.x, a.y);
			ctx.line_to(b.x, b.y);
			ctx.stroke();
		}
	}

	fn draw_sphere(&self, x: f64, y: f64, r: f64, material: &Material) {
		let ctx = &self.ctx;
		if material.wireframe {
			ctx.set_stroke_style_str(material.color);
			ctx.set_line_width(1.5);
			let phase = self.view.rotation() as f64;
			ctx.begin_path();
			let _ = ctx.arc(x, y, r, 0.0, 2.0 * PI);
			ctx.stroke();
			for ry in [r * 0.35, r * 0.7] {
				ctx.begin_path();
				let _ = ctx.ellipse(x, y, r, ry, 0.0, 0.0, 2.0 * PI);
				ctx.stroke();
			}
			for offset in [0.0, PI / 3.0, 2.0 * PI / 3.0] {
				ctx.begin_path();
				let rx = (r * (phase + offset).cos()).abs();
				let _ = ctx.ellipse(x, y, rx, r, 0.0, 0.0, 2.0 * PI);
				ctx.stroke();
			}
		} else {
			ctx.begin_path();
			let _ = ctx.arc(x, y, r, 0.0, 2.0 * PI);
			match ctx.create_radial_gradient(x - r * 0.35, y - r * 0.35, r * 0.1, x, y, r) {
				Ok(gradient) => {
					let _ = gradient.add_color_stop(0.0, "rgba(255, 255, 255, 0.85)");
					let _ = gradient.add_color_stop(0.35, material.color);
					let _ = gradient.add_color_stop(1.0, BACKGROUND);
					#[allow(deprecated)]
					ctx.set_fill_style(&gradient);
				}
				Err(_) => ctx.set_fill_style_str(material.color),
			}
			ctx.fill();
		}

		if material.highlighted {
			ctx.begin_path();
			let _ = ctx.arc(x, y, r + 3.0, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
			ctx.set_line_width(2.0);
			ctx.stroke();
		}
	}
}

impl GraphRenderer for SceneRenderer {
	fn resize(&mut self) {
		let viewport = fit_canvas(&self.container, &self.canvas, Viewport::scene);
		debug!("scene resized to {}x{}", viewport.width, viewport.height);
		self.view.resize(viewport);
	}

	fn draw(&mut self, interaction: &InteractionState) {
		self.view.materials.sync(interaction);
		let viewport = self.view.viewport();
		self.ctx.set_fill_style_str(BACKGROUND);
		self.ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);
		self.draw_decorations();

		self.ctx.set_font("13px Arial");
		self.ctx.set_text_align("center");
		self.ctx.set_text_baseline("top");
		for (i, p) in self.view.draw_order() {
			let node = &self.view.nodes()[i];
			let Some(material) = self.view.materials.get(node.id).copied() else {
				continue;
			};
			let r = self.view.projected_radius(p.depth);
			self.draw_sphere(p.x, p.y, r, &material);
			self.ctx.set_fill_style_str(LABEL);
			let _ = self.ctx.fill_text(node.label, p.x, p.y + r + 6.0);
		}
	}

	fn tick(&mut self) {
		self.view.advance();
	}

	fn canvas(&self) -> &HtmlCanvasElement {
		&self.canvas
	}

	fn picker(&self) -> &dyn Picking {
		&self.view
	}
}

/// Shared flag that ends an [`AnimationLoop`] and silences teardown-sensitive callbacks.
#[derive(Clone, Debug)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
	pub fn new() -> Self {
		Self(Rc::new(Cell::new(false)))
	}

	pub fn stop(&self) {
		self.0.set(true);
	}

	pub fn is_stopped(&self) -> bool {
		self.0.get()
	}
}

impl Default for StopHandle {
	fn default() -> Self {
		Self::new()
	}
}

/// Self-rescheduling `requestAnimationFrame` callback. Runs `frame` once per
/// display refresh until its [`StopHandle`] is stopped.
pub struct AnimationLoop;

impl AnimationLoop {
	pub fn start(stop: StopHandle, mut frame: impl FnMut() + 'static) {
		let callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
		let inner = callback.clone();

		*callback.borrow_mut() = Some(Closure::new(move || {
			if stop.is_stopped() {
				debug!("animation loop stopped");
				let _ = inner.borrow_mut().take();
				return;
			}
			frame();
			if let (Some(window), Some(cb)) = (web_sys::window(), inner.borrow().as_ref()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));

		if let (Some(window), Some(cb)) = (web_sys::window(), callback.borrow().as_ref()) {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	}
}
