//! Neighborhood retrieval from the graph service.
//!
//! One GET per (entity, collection, backend). The response is mapped into a
//! [`RawGraph`] with role colors applied; nothing is cached because every
//! focus change is a deliberate new query.

use std::sync::atomic::{AtomicU64, Ordering};

use log::{info, warn};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use thiserror::Error;

use crate::components::force_graph::theme::RolePalette;
use crate::components::force_graph::{GraphLink, GraphNode, NodeGroup, RawGraph};
use crate::params::ViewParams;

/// Path of the neighborhood endpoint, relative to the page origin.
pub const NEIGHBORHOOD_PATH: &str = "/api/graph/neighborhood";

/// Label shown for chunk nodes instead of their raw text.
pub const CHUNK_PLACEHOLDER: &str = "Text chunk";

/// Size hint given to the focus node when the service sends none.
const FOCUS_SIZE_HINT: f64 = 4.0;

/// Why a neighborhood could not be loaded.
#[derive(Error, Debug)]
pub enum FetchError {
	/// Entity or collection missing from the page query.
	#[error("missing required parameter: {0}")]
	MissingParameters(&'static str),

	/// The request never completed.
	#[error("request failed: {0}")]
	Transport(String),

	/// The service answered with a non-success status.
	#[error("graph service returned HTTP {0}")]
	Status(u16),

	/// The body was not a valid neighborhood document.
	#[error("invalid graph response: {0}")]
	Decode(String),
}

impl FetchError {
	/// Everything except missing parameters comes from the network leg.
	pub fn is_transport(&self) -> bool {
		!matches!(self, FetchError::MissingParameters(_))
	}
}

/// Wire document: `{ nodes: [{id, label, group}], links: [{source, target, label}] }`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WireGraph {
	#[serde(default)]
	pub nodes: Vec<WireNode>,
	#[serde(default)]
	pub links: Vec<WireLink>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireNode {
	pub id: String,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default)]
	pub group: Option<String>,
	/// Optional relative size.
	#[serde(default)]
	pub val: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireLink {
	pub source: String,
	pub target: String,
	#[serde(default)]
	pub label: Option<String>,
}

impl WireNode {
	fn group(&self) -> NodeGroup {
		self.group.as_deref().map(NodeGroup::from_tag).unwrap_or_default()
	}
}

impl WireGraph {
	/// Tags nodes with role, color and label:
	/// - chunk nodes always get the placeholder label and the chunk color, so
	///   raw chunk text is never displayed;
	/// - the focus node (matched by id, then by the label of a non-chunk node)
	///   gets a larger size hint and, unless it is a chunk, the highlight color;
	/// - everything else gets the entity color.
	pub fn into_raw_graph(self, focus: &str, palette: &RolePalette) -> RawGraph {
		let focus_id = self
			.nodes
			.iter()
			.find(|n| n.id == focus)
			.or_else(|| {
				self.nodes
					.iter()
					.find(|n| n.group() != NodeGroup::Chunk && n.label.as_deref() == Some(focus))
			})
			.map(|n| n.id.clone())
			.unwrap_or_else(|| focus.to_string());

		let nodes = self
			.nodes
			.into_iter()
			.map(|n| {
				let group = n.group();
				let is_focus = n.id == focus_id;
				let size_hint = if is_focus {
					n.val.or(Some(FOCUS_SIZE_HINT))
				} else {
					n.val
				};
				let (label, color) = if group == NodeGroup::Chunk {
					(CHUNK_PLACEHOLDER.to_string(), palette.chunk)
				} else if is_focus {
					(n.label.unwrap_or_else(|| n.id.clone()), palette.focus)
				} else {
					(n.label.unwrap_or_else(|| n.id.clone()), palette.entity)
				};
				GraphNode {
					id: n.id,
					label,
					group,
					size_hint,
					color: Some(color.to_css()),
					is_focus,
				}
			})
			.collect();

		let links = self
			.links
			.into_iter()
			.map(|l| GraphLink {
				source: l.source,
				target: l.target,
				label: l.label.unwrap_or_default(),
			})
			.collect();

		RawGraph {
			focus: focus_id,
			nodes,
			links,
		}
	}
}

/// Absolute request URL with every parameter percent-encoded.
pub fn neighborhood_url(params: &ViewParams) -> String {
	let enc = |s: &str| utf8_percent_encode(s, NON_ALPHANUMERIC).to_string();
	let mut url = format!(
		"{}{}?collection_id={}&entity={}",
		params.origin,
		NEIGHBORHOOD_PATH,
		enc(&params.collection),
		enc(&params.entity)
	);
	if let Some(backend) = &params.backend {
		url.push_str("&backend=");
		url.push_str(&enc(backend));
	}
	url
}

/// Fetches and maps the neighborhood for `params`.
pub async fn fetch_neighborhood(
	params: &ViewParams,
	palette: &RolePalette,
) -> Result<RawGraph, FetchError> {
	let url = neighborhood_url(params);
	info!("kg-viz: fetching {}", url);

	let response = reqwest::get(&url)
		.await
		.map_err(|e| FetchError::Transport(e.to_string()))?;
	let status = response.status();
	if !status.is_success() {
		return Err(FetchError::Status(status.as_u16()));
	}
	let wire: WireGraph = response
		.json()
		.await
		.map_err(|e| FetchError::Decode(e.to_string()))?;

	let graph = wire.into_raw_graph(&params.entity, palette);
	info!(
		"kg-viz: loaded {} nodes, {} links",
		graph.nodes.len(),
		graph.links.len()
	);
	Ok(graph)
}

/// Proof that a request was the latest one when it was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Ignore-if-stale guard for in-flight loads.
///
/// Each request takes a ticket. A response is only applied if no newer ticket
/// was issued and the consumer was not torn down in the meantime.
#[derive(Debug, Default)]
pub struct LoadTracker {
	generation: AtomicU64,
}

impl LoadTracker {
	pub fn begin(&self) -> LoadTicket {
		LoadTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
	}

	pub fn is_current(&self, ticket: LoadTicket) -> bool {
		self.generation.load(Ordering::SeqCst) == ticket.0
	}

	/// Makes every outstanding ticket stale, e.g. on teardown.
	pub fn invalidate(&self) {
		self.generation.fetch_add(1, Ordering::SeqCst);
	}

	/// Passes `value` through only if `ticket` is still current.
	pub fn accept<T>(&self, ticket: LoadTicket, value: T) -> Option<T> {
		if self.is_current(ticket) {
			Some(value)
		} else {
			warn!("kg-viz: discarding stale response #{}", ticket.0);
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::components::force_graph::model::GraphModel;
	use crate::components::force_graph::theme::Theme;

	const ACME: &str = r#"{
		"nodes": [
			{"id": "Acme Corp", "label": "Acme Corp", "group": "Entity"},
			{"id": "Jane Doe", "label": "Jane Doe", "group": "Entity"},
			{"id": "c-17", "label": "Acme Corp was founded in 1947 by ...", "group": "Chunk"}
		],
		"links": [
			{"source": "Acme Corp", "target": "Jane Doe", "label": "EMPLOYS"},
			{"source": "c-17", "target": "Acme Corp", "label": "MENTIONS"}
		]
	}"#;

	fn params(backend: Option<&str>) -> ViewParams {
		ViewParams {
			entity: "Acme Corp".into(),
			collection: "docs/2024".into(),
			backend: backend.map(String::from),
			theme: None,
			origin: "http://localhost:3000".into(),
		}
	}

	fn acme() -> RawGraph {
		let wire: WireGraph = serde_json::from_str(ACME).unwrap();
		wire.into_raw_graph("Acme Corp", &Theme::default().roles)
	}

	#[test]
	fn url_encodes_every_parameter() {
		assert_eq!(
			neighborhood_url(&params(Some("light rag"))),
			"http://localhost:3000/api/graph/neighborhood?collection_id=docs%2F2024&entity=Acme%20Corp&backend=light%20rag"
		);
		assert!(!neighborhood_url(&params(None)).contains("backend"));
	}

	#[test]
	fn roles_colors_and_labels() {
		let palette = Theme::default().roles;
		let graph = acme();
		assert_eq!(graph.focus, "Acme Corp");

		let focus = &graph.nodes[0];
		assert!(focus.is_focus);
		assert_eq!(focus.color.as_deref(), Some(palette.focus.to_css().as_str()));
		assert_eq!(focus.size_hint, Some(FOCUS_SIZE_HINT));

		let other = &graph.nodes[1];
		assert!(!other.is_focus);
		assert_eq!(other.color.as_deref(), Some(palette.entity.to_css().as_str()));
		assert_eq!(other.size_hint, None);

		let chunk = &graph.nodes[2];
		assert_eq!(chunk.group, NodeGroup::Chunk);
		assert_eq!(chunk.label, CHUNK_PLACEHOLDER);
		assert_eq!(chunk.color.as_deref(), Some(palette.chunk.to_css().as_str()));
		assert_eq!(graph.links[0].label, "EMPLOYS");
	}

	#[test]
	fn focus_can_match_by_label() {
		let json = r#"{"nodes":[{"id":"n1","label":"Acme Corp"},{"id":"n2"}],"links":[]}"#;
		let wire: WireGraph = serde_json::from_str(json).unwrap();
		let graph = wire.into_raw_graph("Acme Corp", &Theme::default().roles);
		assert_eq!(graph.focus, "n1");
		assert!(graph.nodes[0].is_focus);
		assert_eq!(graph.nodes[1].label, "n2");
	}

	#[test]
	fn chunk_focus_never_shows_raw_text() {
		let palette = Theme::default().roles;
		let json = r#"{"nodes":[{"id":"c-1","label":"Raw chunk text","group":"Chunk"}],"links":[]}"#;
		let wire: WireGraph = serde_json::from_str(json).unwrap();
		let graph = wire.into_raw_graph("c-1", &palette);
		let chunk = &graph.nodes[0];
		assert!(chunk.is_focus);
		assert_eq!(chunk.label, CHUNK_PLACEHOLDER);
		assert_eq!(chunk.color.as_deref(), Some(palette.chunk.to_css().as_str()));
	}

	#[test]
	fn label_match_skips_chunks() {
		let json = r#"{"nodes":[
			{"id":"c-1","label":"Acme Corp","group":"Chunk"},
			{"id":"e-1","label":"Acme Corp","group":"Entity"}
		],"links":[]}"#;
		let wire: WireGraph = serde_json::from_str(json).unwrap();
		let graph = wire.into_raw_graph("Acme Corp", &Theme::default().roles);
		assert_eq!(graph.focus, "e-1");
		assert!(!graph.nodes[0].is_focus);
		assert_eq!(graph.nodes[0].label, CHUNK_PLACEHOLDER);
		assert!(graph.nodes[1].is_focus);
	}

	#[test]
	fn acme_view_with_and_without_filter() {
		let mut model = GraphModel::new(false);
		model.load(Arc::new(acme()));
		let view = model.view().unwrap();
		assert_eq!(view.node_count(), 3);
		assert!(view.link_count() >= 1);

		model.set_entity_only_filter(true);
		let view = model.view().unwrap();
		assert_eq!(view.node_count(), 2);
		for l in view.links() {
			assert!(l.source != "c-17" && l.target != "c-17");
		}
	}

	#[test]
	fn stale_response_is_discarded() {
		let tracker = LoadTracker::default();
		let mut model = GraphModel::new(false);

		let a = tracker.begin();
		let b = tracker.begin();

		let mut graph_b = acme();
		graph_b.focus = "Jane Doe".into();
		if let Some(g) = tracker.accept(b, graph_b) {
			model.load(Arc::new(g));
		}
		if let Some(g) = tracker.accept(a, acme()) {
			model.load(Arc::new(g));
		}
		assert_eq!(model.raw().unwrap().focus, "Jane Doe");
	}

	#[test]
	fn teardown_invalidates_in_flight_loads() {
		let tracker = LoadTracker::default();
		let ticket = tracker.begin();
		assert!(tracker.is_current(ticket));
		tracker.invalidate();
		assert!(tracker.accept(ticket, ()).is_none());
	}

	#[test]
	fn transport_classification() {
		assert!(FetchError::Status(502).is_transport());
		assert!(FetchError::Transport("offline".into()).is_transport());
		assert_eq!(FetchError::Status(404).to_string(), "graph service returned HTTP 404");
	}
}
