//! Canonical graph storage and the filtered view derived from it.

use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use log::info;

use super::types::{GraphLink, GraphNode, NodeGroup, RawGraph};

/// Node and link subset of a [`RawGraph`] after filtering.
///
/// Holds arena indices into the raw graph rather than copies. Every link index
/// refers to a link whose endpoints are both in `nodes`.
#[derive(Debug)]
pub struct DerivedView {
	raw: Arc<RawGraph>,
	nodes: Vec<usize>,
	links: Vec<usize>,
}

impl DerivedView {
	/// Applies the filter to `raw`. Node survival is settled before any link is
	/// considered, so a link can only survive if both its ends already have.
	pub fn compute(raw: Arc<RawGraph>, entity_only: bool) -> Self {
		let nodes: Vec<usize> = raw
			.nodes
			.iter()
			.enumerate()
			.filter(|(_, n)| !entity_only || n.group != NodeGroup::Chunk)
			.map(|(i, _)| i)
			.collect();

		let surviving: HashSet<&str> = nodes.iter().map(|&i| raw.nodes[i].id.as_str()).collect();

		let links = raw
			.links
			.iter()
			.enumerate()
			.filter(|(_, l)| {
				surviving.contains(l.source.as_str()) && surviving.contains(l.target.as_str())
			})
			.map(|(i, _)| i)
			.collect();

		Self { raw, nodes, links }
	}

	pub fn raw(&self) -> &Arc<RawGraph> {
		&self.raw
	}

	/// Arena indices (into `raw().nodes`) of visible nodes.
	pub fn node_indices(&self) -> &[usize] {
		&self.nodes
	}

	pub fn nodes(&self) -> impl Iterator<Item = (usize, &GraphNode)> + '_ {
		self.nodes.iter().map(|&i| (i, &self.raw.nodes[i]))
	}

	pub fn links(&self) -> impl Iterator<Item = &GraphLink> + '_ {
		self.links.iter().map(|&i| &self.raw.links[i])
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn link_count(&self) -> usize {
		self.links.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

/// Owns the fetched graph and the active filter, memoizing the derived view.
///
/// The cached view is dropped whenever an input changes and rebuilt on the
/// next [`GraphModel::view`] call. Until then the same `Rc` is handed out, so
/// consumers can detect changes with [`Rc::ptr_eq`].
#[derive(Debug, Default)]
pub struct GraphModel {
	raw: Option<Arc<RawGraph>>,
	entity_only: bool,
	cached: Option<Rc<DerivedView>>,
	/// Transient selection, cleared on every load.
	selected: Option<String>,
}

impl GraphModel {
	pub fn new(entity_only: bool) -> Self {
		Self {
			entity_only,
			..Default::default()
		}
	}

	/// Replaces the canonical graph wholesale.
	pub fn load(&mut self, raw: Arc<RawGraph>) {
		self.raw = Some(raw);
		self.cached = None;
		self.selected = None;
	}

	/// Returns whether the flag actually changed.
	pub fn set_entity_only_filter(&mut self, entity_only: bool) -> bool {
		if self.entity_only == entity_only {
			return false;
		}
		self.entity_only = entity_only;
		self.cached = None;
		true
	}

	pub fn entity_only(&self) -> bool {
		self.entity_only
	}

	pub fn raw(&self) -> Option<&Arc<RawGraph>> {
		self.raw.as_ref()
	}

	/// Current derived view, or `None` before the first load.
	pub fn view(&mut self) -> Option<Rc<DerivedView>> {
		if self.cached.is_none() {
			let raw = self.raw.clone()?;
			let view = DerivedView::compute(raw, self.entity_only);
			info!(
				"kg-viz: view recomputed ({} nodes, {} links, entity_only={})",
				view.node_count(),
				view.link_count(),
				self.entity_only
			);
			self.cached = Some(Rc::new(view));
		}
		self.cached.clone()
	}

	pub fn select(&mut self, id: Option<String>) {
		self.selected = id;
	}

	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}
}
