use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Element, ResizeObserver};

use super::types::Bounds;

/// Smallest edge length the flat layout accepts.
pub const MIN_EDGE: f64 = 200.0;
pub const FALLBACK_WIDTH: f64 = 800.0;
pub const FALLBACK_HEIGHT: f64 = 600.0;

/// Drawing-surface size in whole pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	/// Size for the flat renderer: zero edges fall back to the defaults, and
	/// both edges are floored at [`MIN_EDGE`].
	pub fn flat(width: f64, height: f64) -> Self {
		let width = or_fallback(width, FALLBACK_WIDTH).floor().max(MIN_EDGE);
		let height = or_fallback(height, FALLBACK_HEIGHT).floor().max(MIN_EDGE);
		Self { width, height }
	}

	/// Size for the scene renderer: only zero edges are replaced.
	pub fn scene(width: f64, height: f64) -> Self {
		Self {
			width: or_fallback(width, FALLBACK_WIDTH).floor().max(1.0),
			height: or_fallback(height, FALLBACK_HEIGHT).floor().max(1.0),
		}
	}

	pub fn aspect(&self) -> f64 {
		self.width / self.height
	}
}

fn or_fallback(value: f64, fallback: f64) -> f64 {
	if value.is_finite() && value > 0.0 {
		value
	} else {
		fallback
	}
}

pub fn element_bounds(el: &Element) -> Bounds {
	let rect = el.get_bounding_client_rect();
	Bounds {
		left: rect.left(),
		top: rect.top(),
		width: rect.width(),
		height: rect.height(),
	}
}

/// Calls back on every size change of a container. Uses a `ResizeObserver`
/// when the browser has one, the window `resize` event otherwise.
pub struct ResizeWatcher {
	observer: Option<ResizeObserver>,
	callback: Closure<dyn FnMut()>,
}

impl ResizeWatcher {
	pub fn watch(container: &Element, on_resize: impl FnMut() + 'static) -> Self {
		let callback = Closure::<dyn FnMut()>::new(on_resize);
		let observer = match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
			Ok(obs) => {
				obs.observe(container);
				debug!("watching container with ResizeObserver");
				Some(obs)
			}
			Err(_) => {
				match web_sys::window() {
					Some(window) => {
						let _ = window.add_event_listener_with_callback(
							"resize",
							callback.as_ref().unchecked_ref(),
						);
						debug!("ResizeObserver unavailable, watching window resize");
					}
					None => warn!("no window; resize events will not be observed"),
				}
				None
			}
		};
		Self { observer, callback }
	}
}

impl Drop for ResizeWatcher {
	fn drop(&mut self) {
		if let Some(obs) = self.observer.take() {
			obs.disconnect();
		} else if let Some(window) = web_sys::window() {
			let _ = window
				.remove_event_listener_with_callback("resize", self.callback.as_ref().unchecked_ref());
		}
	}
}
