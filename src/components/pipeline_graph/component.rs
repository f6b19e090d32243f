use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use log::{debug, info, warn};
use send_wrapper::SendWrapper;
use serde_json::Value;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlCanvasElement, PointerEvent};

use super::render::{FlatRenderer, GraphRenderer};
use super::render3d::{AnimationLoop, SceneRenderer, StopHandle};
use super::state::{NO_RUN, PipelineView, ViewUpdate, pretty};
use super::types::{PointerKind, RunRecord, ViewMode};
use super::viewport::ResizeWatcher;
use crate::api;
use crate::error::{ApiError, RenderError};

/// State of one mounted graph: the interaction/run model, the active
/// renderer, and the text surfaces around it.
#[derive(Clone)]
pub struct GraphSession {
	view: Rc<RefCell<PipelineView>>,
	renderer: Rc<RefCell<Option<Box<dyn GraphRenderer>>>>,
	watcher: Rc<RefCell<Option<ResizeWatcher>>>,
	stop: StopHandle,
	pub status: RwSignal<String>,
	pub pending: RwSignal<bool>,
	pub service: RwSignal<String>,
	pub output: RwSignal<String>,
	pub overlay: RwSignal<Option<String>>,
}

impl GraphSession {
	pub fn new() -> Self {
		Self {
			view: Rc::new(RefCell::new(PipelineView::default())),
			renderer: Rc::new(RefCell::new(None)),
			watcher: Rc::new(RefCell::new(None)),
			stop: StopHandle::new(),
			status: RwSignal::new(String::new()),
			pending: RwSignal::new(false),
			service: RwSignal::new(String::new()),
			output: RwSignal::new(NO_RUN.to_string()),
			overlay: RwSignal::new(None),
		}
	}

	pub fn stop_handle(&self) -> StopHandle {
		self.stop.clone()
	}

	fn apply(&self, update: ViewUpdate) {
		if let Some(status) = update.status {
			self.status.set(status);
		}
		if let Some(output) = update.output {
			self.output.set(output);
		}
		self.pending.set(self.view.borrow().binding.is_pending());
	}

	/// Reports an initialisation failure on every text surface.
	fn fail(&self, err: RenderError) {
		warn!("graph rendering unavailable: {err}");
		let message = err.to_string();
		self.status.set(message.clone());
		self.output.set(message.clone());
		self.overlay.set(Some(message));
	}

	fn install(&self, renderer: Box<dyn GraphRenderer>) {
		*self.renderer.borrow_mut() = Some(renderer);
		self.overlay.set(None);
	}

	pub fn redraw(&self) {
		if let Some(renderer) = self.renderer.borrow_mut().as_mut() {
			renderer.draw(&self.view.borrow().interaction);
		}
	}

	fn downgrade(&self) -> WeakSession {
		WeakSession {
			view: Rc::downgrade(&self.view),
			renderer: Rc::downgrade(&self.renderer),
			stop: self.stop.clone(),
		}
	}

	/// Ends the animation loop and releases the observer and renderer.
	fn teardown(&self) {
		self.stop.stop();
		drop(self.watcher.borrow_mut().take());
		drop(self.renderer.borrow_mut().take());
		debug!("pipeline graph torn down");
	}

	fn frame(&self) {
		if let Some(renderer) = self.renderer.borrow_mut().as_mut() {
			renderer.tick();
			renderer.draw(&self.view.borrow().interaction);
		}
	}

	fn pointer(&self, kind: PointerKind, ev: &PointerEvent) {
		let hit = match self.renderer.borrow().as_ref() {
			Some(renderer) => renderer.pick(ev.client_x() as f64, ev.client_y() as f64),
			None => return,
		};
		let update = self.view.borrow_mut().pointer(kind, hit);
		self.apply(update);
		self.redraw();
	}

	fn pointer_left(&self) {
		self.view.borrow_mut().pointer_left();
		self.redraw();
	}

	fn settle_run(&self, result: Result<RunRecord, ApiError>) -> bool {
		let ok = result.is_ok();
		let update = self.view.borrow_mut().run_finished(result);
		self.apply(update);
		self.redraw();
		ok
	}

	/// Triggers a pipeline run; the result replaces the current record.
	pub fn run(&self) {
		let update = self.view.borrow_mut().run_started();
		self.apply(update);
		let session = self.clone();
		spawn_local(async move {
			let result = api::run_pipeline().await;
			session.settle_run(result);
		});
	}

	/// Loads a stored run by id with the same replace semantics as [`Self::run`].
	pub fn load_run(&self, run_id: String) {
		let run_id = run_id.trim().to_string();
		if run_id.is_empty() {
			self.status.set("Enter a run id to load".to_string());
			return;
		}
		let update = self.view.borrow_mut().run_started();
		self.apply(update);
		let session = self.clone();
		spawn_local(async move {
			let result = api::fetch_run(&run_id).await;
			if !session.settle_run(result) {
				session.status.set(format!("Error loading run {run_id}"));
			}
		});
	}

	/// Runs an auxiliary request and shows its JSON response as opaque text.
	pub fn show_json<F>(&self, label: &'static str, request: F)
	where
		F: Future<Output = Result<Value, ApiError>> + 'static,
	{
		let (status, output) = (self.status, self.output);
		status.set(format!("{label}..."));
		spawn_local(async move {
			match request.await {
				Ok(value) => {
					output.set(pretty(&value));
					status.set(format!("{label} done"));
				}
				Err(err) => {
					warn!("{label} failed: {err}");
					status.set(format!("{label} failed: {err}"));
				}
			}
		});
	}

	pub fn refresh_service_status(&self) {
		let service = self.service;
		spawn_local(async move {
			match api::fetch_status().await {
				Ok(report) => {
					info!("service status: {report:?}");
					service.set(report.summary());
				}
				Err(err) => {
					warn!("status fetch failed: {err}");
					service.set("Status unavailable".to_string());
				}
			}
		});
	}
}

/// Handle given to long-lived browser callbacks so they never keep the
/// session alive on their own.
#[derive(Clone)]
struct WeakSession {
	view: Weak<RefCell<PipelineView>>,
	renderer: Weak<RefCell<Option<Box<dyn GraphRenderer>>>>,
	stop: StopHandle,
}

impl WeakSession {
	/// Refits and redraws. Returns `false` once the session is stopped or gone.
	fn resize(&self) -> bool {
		if self.stop.is_stopped() {
			return false;
		}
		let (Some(view), Some(renderer)) = (self.view.upgrade(), self.renderer.upgrade()) else {
			return false;
		};
		if let Some(renderer) = renderer.borrow_mut().as_mut() {
			renderer.resize();
			renderer.draw(&view.borrow().interaction);
		}
		true
	}
}

impl Default for GraphSession {
	fn default() -> Self {
		Self::new()
	}
}

fn build_renderer(
	mode: ViewMode,
	container: Element,
	canvas: HtmlCanvasElement,
) -> Result<Box<dyn GraphRenderer>, RenderError> {
	let renderer: Box<dyn GraphRenderer> = match mode {
		ViewMode::Flat => Box::new(FlatRenderer::new(container, canvas)?),
		ViewMode::Scene => Box::new(SceneRenderer::new(container, canvas)?),
	};
	Ok(renderer)
}

/// Pipeline graph surface. Pointer input drives hover and selection; the
/// selected node's output lands in `session.output`.
#[component]
pub fn PipelineGraph(
	session: GraphSession,
	#[prop(default = ViewMode::Flat)] mode: ViewMode,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let overlay = session.overlay;

	let session_init = session.clone();
	Effect::new(move |_| {
		let (Some(container), Some(canvas)) = (container_ref.get(), canvas_ref.get()) else {
			return;
		};
		if session_init.renderer.borrow().is_some() {
			return;
		}
		let container: Element = container.into();
		let canvas: HtmlCanvasElement = canvas.into();

		match build_renderer(mode, container.clone(), canvas) {
			Ok(renderer) => session_init.install(renderer),
			Err(err) => {
				session_init.fail(err);
				return;
			}
		}
		info!("pipeline graph mounted in {mode:?} mode");
		session_init.redraw();

		let session_resize = session_init.downgrade();
		*session_init.watcher.borrow_mut() = Some(ResizeWatcher::watch(&container, move || {
			session_resize.resize();
		}));

		if mode == ViewMode::Scene {
			let session_frame = session_init.clone();
			AnimationLoop::start(session_init.stop_handle(), move || session_frame.frame());
		}
	});

	let session_cleanup = SendWrapper::new(session.clone());
	on_cleanup(move || session_cleanup.take().teardown());

	let session_mm = session.clone();
	let on_pointermove = move |ev: PointerEvent| session_mm.pointer(PointerKind::Move, &ev);

	let session_md = session.clone();
	let on_pointerdown = move |ev: PointerEvent| session_md.pointer(PointerKind::Down, &ev);

	let session_ml = session.clone();
	let on_pointerleave = move |_: PointerEvent| session_ml.pointer_left();

	view! {
		<div
			node_ref=container_ref
			class="pipeline-graph"
			style="position: relative; width: 100%; height: 100%;"
		>
			<canvas
				node_ref=canvas_ref
				class="pipeline-graph-canvas"
				on:pointermove=on_pointermove
				on:pointerdown=on_pointerdown
				on:pointerleave=on_pointerleave
				style="position: absolute; top: 0; left: 0; display: block; cursor: pointer;"
			/>
			{move || {
				overlay
					.get()
					.map(|message| view! { <div class="render-overlay">{message}</div> })
			}}
		</div>
	}
}
