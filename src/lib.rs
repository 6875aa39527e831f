//! knowledge-graph-viz: interactive neighborhood viewer for knowledge-graph
//! collections.
//!
//! This crate provides a WASM application that fetches the neighborhood of one
//! focus entity and renders it with a cooling force layout, an entity-only
//! filter, click-to-focus camera moves, and pan/zoom.

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::*;
use log::{Level, info, warn};

pub mod components;
pub mod fetch;
pub mod params;

pub use components::force_graph::{ForceGraphCanvas, GraphLink, GraphNode, RawGraph};

use components::force_graph::{REPULSION_RANGE, Theme};
use fetch::{LoadTracker, fetch_neighborhood};
use params::ViewParams;

/// Repulsion the slider starts at.
const DEFAULT_REPULSION: f64 = 200.0;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("kg-viz: logging initialized");
}

/// Where the neighborhood load stands.
#[derive(Clone, Debug, PartialEq)]
enum LoadState {
	Loading,
	Ready,
	Failed(String),
}

/// Main application component.
/// Reads the focus from the page query, fetches its neighborhood once and
/// renders the graph with its operator controls.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let params = match ViewParams::from_location() {
		Ok(params) => params,
		Err(e) => {
			warn!("kg-viz: {}", e);
			return view! {
				<Title text="Knowledge graph" />
				<ErrorScreen message=e.to_string() />
			}
			.into_any();
		}
	};

	let theme = params.theme.as_deref().map(Theme::by_name).unwrap_or_default();
	let graph = RwSignal::new(None::<Arc<RawGraph>>);
	let load = RwSignal::new(LoadState::Loading);
	let repulsion = RwSignal::new(DEFAULT_REPULSION);
	let show_labels = RwSignal::new(true);
	let entity_only = RwSignal::new(false);

	let tracker = Arc::new(LoadTracker::default());
	let ticket = tracker.begin();
	on_cleanup({
		let tracker = tracker.clone();
		move || tracker.invalidate()
	});
	{
		let (params, palette) = (params.clone(), theme.roles.clone());
		spawn_local(async move {
			let result = fetch_neighborhood(&params, &palette).await;
			let Some(result) = tracker.accept(ticket, result) else {
				return;
			};
			match result {
				Ok(raw) => {
					graph.set(Some(Arc::new(raw)));
					load.set(LoadState::Ready);
				}
				Err(e) => {
					warn!("kg-viz: neighborhood load failed: {}", e);
					load.set(LoadState::Failed(e.to_string()));
				}
			}
		});
	}

	let theme_name = theme.name;
	let title = format!("{} · Knowledge graph", params.entity);
	let subtitle = format!("{} · backend: {}", params.collection, params.backend_label());
	let entity = params.entity.clone();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme=theme_name />
		<Title text=title />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			{move || match load.get() {
				LoadState::Loading => {
					view! { <div class="graph-loading">"Loading neighborhood…"</div> }.into_any()
				}
				LoadState::Failed(message) => view! { <ErrorScreen message=message /> }.into_any(),
				LoadState::Ready => {
					view! {
						<ForceGraphCanvas
							data=graph
							repulsion=repulsion
							show_labels=show_labels
							entity_only=entity_only
							theme=theme.clone()
							fullscreen=true
						/>
					}
						.into_any()
				}
			}}
			<div class="graph-overlay">
				<h1>{entity}</h1>
				<p class="subtitle">{subtitle}</p>
				<Controls repulsion=repulsion show_labels=show_labels entity_only=entity_only />
			</div>
		</div>
	}
	.into_any()
}

/// Repulsion slider plus the labels and entity-only checkboxes.
#[component]
fn Controls(
	repulsion: RwSignal<f64>,
	show_labels: RwSignal<bool>,
	entity_only: RwSignal<bool>,
) -> impl IntoView {
	let (min, max) = (REPULSION_RANGE.0.to_string(), REPULSION_RANGE.1.to_string());
	view! {
		<div class="graph-controls">
			<label>
				"Repulsion "
				<input
					type="range"
					min=min
					max=max
					step="10"
					prop:value=move || repulsion.get().to_string()
					on:input=move |ev| {
						if let Ok(value) = event_target_value(&ev).parse::<f64>() {
							repulsion.set(value);
						}
					}
				/>
				<span class="value">{move || format!("{:.0}", repulsion.get())}</span>
			</label>
			<label>
				<input
					type="checkbox"
					prop:checked=move || show_labels.get()
					on:change=move |ev| show_labels.set(event_target_checked(&ev))
				/>
				" Show labels"
			</label>
			<label>
				<input
					type="checkbox"
					prop:checked=move || entity_only.get()
					on:change=move |ev| entity_only.set(event_target_checked(&ev))
				/>
				" Entities only"
			</label>
		</div>
	}
}

/// Full-screen message for a load that cannot proceed.
#[component]
fn ErrorScreen(message: String) -> impl IntoView {
	view! {
		<div class="graph-error">
			<h1>"Unable to show this graph"</h1>
			<p>{message}</p>
		</div>
	}
}
