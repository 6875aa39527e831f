//! Force-directed neighborhood graph component.
//!
//! Renders a knowledge-graph neighborhood on an HTML canvas with:
//! - A cooling force simulation that reheats on every discrete change
//! - An entity-only view derived from the raw graph without refetching
//! - Click-to-focus camera moves, auto-fit once the layout settles
//! - Pan, wheel zoom, and node dragging
//!
//! # Example
//!
//! ```ignore
//! use knowledge_graph_viz::components::force_graph::{ForceGraphCanvas, RawGraph};
//!
//! let (graph, set_graph) = signal(None::<Arc<RawGraph>>);
//! let (repulsion, _) = signal(200.0);
//! let (labels, _) = signal(true);
//! let (entity_only, _) = signal(false);
//!
//! view! {
//!     <ForceGraphCanvas
//!         data=graph
//!         repulsion=repulsion
//!         show_labels=labels
//!         entity_only=entity_only
//!         fullscreen=true
//!     />
//! }
//! ```

mod camera;
mod component;
pub mod layout;
pub mod model;
mod render;
pub mod scale;
mod simulation;
mod state;
pub mod theme;
mod types;

pub use component::ForceGraphCanvas;
pub use layout::REPULSION_RANGE;
pub use theme::Theme;
pub use types::{GraphLink, GraphNode, NodeGroup, Position, RawGraph};
