//! Graph data structures shared by the model, layout, and renderer.
//!
//! Links reference nodes by id only. Every consumer resolves ids through an
//! index built from the node list, so dropping nodes from a view can never
//! leave a link pointing at freed data.

use std::collections::HashMap;

/// Role of a node in the neighborhood.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeGroup {
	/// A named entity extracted from the collection.
	#[default]
	Entity,
	/// A text chunk the entities were extracted from.
	Chunk,
}

impl NodeGroup {
	/// Maps the wire group tag. Unknown tags are treated as entities.
	pub fn from_tag(tag: &str) -> Self {
		if tag.eq_ignore_ascii_case("chunk") {
			NodeGroup::Chunk
		} else {
			NodeGroup::Entity
		}
	}
}

/// A 2-D point in world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Position) -> f64 {
		((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
	}
}

/// A node in the neighborhood graph.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Unique identifier within the neighborhood. Used to reference nodes in links.
	pub id: String,
	/// Display label drawn under the node.
	pub label: String,
	pub group: NodeGroup,
	/// Relative size. Radius grows with its square root.
	pub size_hint: Option<f64>,
	/// CSS color assigned at fetch time.
	pub color: Option<String>,
	/// Set on the node the operator centered the query on.
	pub is_focus: bool,
}

/// A directed edge between two nodes, by id.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	/// Source node ID.
	pub source: String,
	/// Target node ID.
	pub target: String,
	pub label: String,
}

/// The neighborhood as fetched. Never mutated after construction; a new fetch
/// replaces it wholesale.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawGraph {
	/// Id of the focus entity the neighborhood was requested for.
	pub focus: String,
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

impl RawGraph {
	/// Builds the id to arena-index lookup. Later duplicates shadow earlier ones.
	pub fn index_by_id(&self) -> HashMap<&str, usize> {
		self.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.as_str(), i))
			.collect()
	}
}
