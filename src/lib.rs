//! Leptos client-side app that draws the trading pipeline as a node graph
//! and shows each stage's output from the latest run.
//!
//! The single route `/` renders run controls, the graph surface and an
//! output pane. Clicking a node shows that stage's output from the most
//! recent run; after a run completes the Packet node is selected. The
//! `view` query parameter picks the renderer: `?view=2d` (default) draws a
//! flat chain, `?view=3d` a rotating sphere scene.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
mod api;
mod components;
mod error;
mod pages;

// Top-Level pages
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Root component: document head, then a router with the pipeline page at
/// `/` (graph, run controls, output pane, `?view=2d|3d` renderer switch)
/// and a 404 fallback.
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		// sets the document title
		<Title text="Pipeline Graph" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
