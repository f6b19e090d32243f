use leptos::prelude::*;
use leptos_router::hooks::use_query_map;

use crate::api;
use crate::components::pipeline_graph::{GraphSession, PipelineGraph, ViewMode};

/// Default Home Page. `?view=3d` switches the graph to the scene renderer.
#[component]
pub fn Home() -> impl IntoView {
	let query = use_query_map();
	let mode = query
		.with_untracked(|q| q.get("view"))
		.and_then(|v| v.parse::<ViewMode>().ok())
		.unwrap_or_default();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<PipelineWorkspace mode=mode />
		</ErrorBoundary>
	}
}

/// Run controls, the graph, and the selected node's output.
#[component]
fn PipelineWorkspace(mode: ViewMode) -> impl IntoView {
	let session = GraphSession::new();
	session.refresh_service_status();
	let (status, pending, service, output) =
		(session.status, session.pending, session.service, session.output);
	let run_id = RwSignal::new(String::new());

	let session_run = session.clone();
	let session_load = session.clone();
	let session_packet = session.clone();
	let session_execute = session.clone();
	let session_report = session.clone();

	view! {
		<div class="pipeline-page">
			<header class="controls">
				<h1>"Pipeline"</h1>
				<button on:click=move |_| session_run.run()>"Run pipeline"</button>
				<input
					type="text"
					placeholder="run id"
					prop:value=move || run_id.get()
					on:input=move |ev| run_id.set(event_target_value(&ev))
				/>
				<button on:click=move |_| {
					session_load.load_run(run_id.get_untracked())
				}>"Load run"</button>
				<button on:click=move |_| {
					session_packet.show_json("Last packet", api::fetch_last_packet())
				}>"Last packet"</button>
				<button on:click=move |_| {
					session_execute.show_json("Execute last", api::execute_last())
				}>"Execute last"</button>
				<button on:click=move |_| {
					session_report.show_json("Report", api::report_last())
				}>"Report"</button>
				<span class="status" class:pending=move || pending.get()>
					{move || status.get()}
				</span>
				<span class="service-status">{move || service.get()}</span>
			</header>
			<main class="workspace">
				<div class="canvas-container">
					<PipelineGraph session=session mode=mode />
				</div>
				<pre class="output">{move || output.get()}</pre>
			</main>
		</div>
	}
}
