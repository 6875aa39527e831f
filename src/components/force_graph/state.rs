//! Graph view state and interaction tracking.
//!
//! [`ForceGraphState`] is the single owner of the data model, the layout
//! engine and the camera. The component forwards DOM events and signal
//! changes here; everything it does per frame goes through
//! [`ForceGraphState::frame`].

use std::rc::Rc;
use std::sync::Arc;

use log::{debug, info};

use super::camera::{Camera, CameraConfig};
use super::layout::{CooldownBudget, LayoutEngine, SimulationConfig};
use super::model::{DerivedView, GraphModel};
use super::scale::{ScaleConfig, ScaledValues};
use super::types::{GraphNode, Position, RawGraph};

/// Pointer travel (screen px) below which a press/release counts as a click.
const CLICK_SLOP: f64 = 4.0;

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node_id: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	/// Set once the pointer leaves the click slop.
	pub moved: bool,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub last_x: f64,
	pub last_y: f64,
}

/// Core view state: data model, layout, camera, and pointer tracking.
pub struct ForceGraphState {
	pub model: GraphModel,
	pub layout: LayoutEngine,
	pub camera: Camera,
	pub scale: ScaleConfig,
	pub drag: DragState,
	pub pan: PanState,
	show_labels: bool,
	/// Edge-triggered: set by the layout when it cools, consumed by the next
	/// frame.
	pending_fit: bool,
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64, repulsion: f64, show_labels: bool, entity_only: bool) -> Self {
		Self {
			model: GraphModel::new(entity_only),
			layout: LayoutEngine::new(SimulationConfig::from_repulsion(repulsion), CooldownBudget::default()),
			camera: Camera::new(width, height, CameraConfig::default()),
			scale: ScaleConfig::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			show_labels,
			pending_fit: false,
		}
	}

	/// Replaces the graph and pushes the new view into the layout in one step,
	/// so the reheat always sees the fully loaded model. Loading the graph
	/// that is already shown is a no-op.
	pub fn load(&mut self, raw: Arc<RawGraph>) {
		if self.model.raw().is_some_and(|current| Arc::ptr_eq(current, &raw)) {
			return;
		}
		info!(
			"kg-viz: loading neighborhood of {:?} ({} nodes)",
			raw.focus,
			raw.nodes.len()
		);
		self.release_drag();
		self.model.load(raw);
		self.sync_layout();
	}

	/// Repulsion slider binding.
	pub fn set_repulsion(&mut self, repulsion: f64) {
		self.layout.set_repulsion(repulsion);
	}

	/// Entity-only checkbox binding. The layout reheats only if the view
	/// identity changes.
	pub fn set_entity_only(&mut self, entity_only: bool) {
		if self.model.set_entity_only_filter(entity_only) {
			self.sync_layout();
			let hidden = self.drag.node_id.as_deref().is_some_and(|id| {
				self.view().is_none_or(|view| !view.nodes().any(|(_, n)| n.id == id))
			});
			if hidden {
				self.release_drag();
			}
		}
	}

	/// Drops any node drag and lets the layout cool again.
	fn release_drag(&mut self) {
		if let Some(id) = std::mem::take(&mut self.drag).node_id {
			self.layout.end_drag(&id);
		}
	}

	/// Show-labels checkbox binding. Display only; never touches the layout.
	pub fn set_show_labels(&mut self, show: bool) {
		self.show_labels = show;
	}

	pub fn show_labels(&self) -> bool {
		self.show_labels
	}

	fn sync_layout(&mut self) {
		if let Some(view) = self.model.view() {
			self.layout.sync_view(view);
		}
	}

	/// The view the layout is currently running on.
	pub fn view(&self) -> Option<&Rc<DerivedView>> {
		self.layout.view()
	}

	/// Resolves a node id to its data and live position.
	pub fn lookup(&self, id: &str) -> Option<(&GraphNode, Position)> {
		let view = self.view()?;
		let idx = self.layout.arena_index(id)?;
		let node = view.raw().nodes.get(idx)?;
		Some((node, self.layout.position_at(idx)?))
	}

	/// Advances physics and camera by one frame.
	pub fn frame(&mut self, dt_ms: f64) {
		if self.layout.tick(dt_ms) {
			info!("kg-viz: layout settled");
			self.pending_fit = true;
		}
		if std::mem::take(&mut self.pending_fit) {
			self.fit_visible();
		}
		self.camera.advance(dt_ms);
	}

	/// Frames every visible, positioned node.
	pub fn fit_visible(&mut self) {
		let Some(view) = self.layout.view().cloned() else {
			return;
		};
		let points = view
			.node_indices()
			.iter()
			.filter_map(|&i| self.layout.position_at(i));
		if self.camera.fit(points) {
			debug!("kg-viz: auto-fit {} nodes", view.node_count());
		}
	}

	/// Pans and zooms to the node and marks it selected.
	pub fn on_node_click(&mut self, id: &str) {
		let Some((_, at)) = self.lookup(id) else {
			return;
		};
		let (zoom, duration) = (self.camera.config.focus_zoom, self.camera.config.focus_duration_ms);
		self.camera.pan_to(at, duration);
		self.camera.zoom_to(zoom, duration);
		self.model.select(Some(id.to_string()));
		debug!("kg-viz: focus camera on {:?}", id);
	}

	/// Topmost visible node under a screen position.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let view = self.view()?;
		let world = self.camera.screen_to_world(sx, sy);
		let scaled = ScaledValues::new(&self.scale, self.camera.zoom(), 0.0);
		view.nodes()
			.filter_map(|(idx, node)| {
				let p = self.layout.position_at(idx)?;
				let hit = scaled.hit_radius(&self.scale, self.scale.node_radius(node.size_hint));
				(p.distance(world) < hit).then_some(node)
			})
			.last()
			.map(|n| n.id.clone())
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		if let Some(id) = self.node_at_position(sx, sy) {
			self.drag = DragState {
				node_id: Some(id),
				start_x: sx,
				start_y: sy,
				moved: false,
			};
		} else {
			self.pan = PanState {
				active: true,
				last_x: sx,
				last_y: sy,
			};
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if let Some(id) = self.drag.node_id.clone() {
			let travel = ((sx - self.drag.start_x).powi(2) + (sy - self.drag.start_y).powi(2)).sqrt();
			if self.drag.moved || travel >= CLICK_SLOP {
				self.drag.moved = true;
				let at = self.camera.screen_to_world(sx, sy);
				self.layout.drag_to(&id, at);
			}
		} else if self.pan.active {
			self.camera.pan_by(sx - self.pan.last_x, sy - self.pan.last_y);
			self.pan.last_x = sx;
			self.pan.last_y = sy;
		}
	}

	/// Ends a drag or pan; a press that never moved is a node click.
	pub fn pointer_up(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		if let Some(id) = drag.node_id {
			if drag.moved {
				self.layout.end_drag(&id);
			} else {
				self.on_node_click(&id);
			}
		}
		self.pan.active = false;
	}

	/// Pointer left the canvas: abandon any gesture without clicking.
	pub fn pointer_cancel(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		if let (Some(id), true) = (drag.node_id, drag.moved) {
			self.layout.end_drag(&id);
		}
		self.pan.active = false;
	}

	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		self.camera.zoom_at(sx, sy, factor);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.camera.resize(width, height);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::layout::LayoutState;
	use crate::components::force_graph::model::tests::acme_graph;

	fn state() -> ForceGraphState {
		let mut s = ForceGraphState::new(800.0, 600.0, 200.0, true, false);
		s.load(Arc::new(acme_graph()));
		s
	}

	fn settle(s: &mut ForceGraphState) {
		for _ in 0..2000 {
			if s.layout.state() == LayoutState::Cooled {
				return;
			}
			s.frame(16.0);
		}
		panic!("layout never cooled");
	}

	/// Screen position of a node under the current camera.
	fn on_screen(s: &ForceGraphState, id: &str) -> (f64, f64) {
		let p = s.lookup(id).unwrap().1;
		let t = s.camera.transform();
		(p.x * t.k + t.x, p.y * t.k + t.y)
	}

	#[test]
	fn load_reheats_once() {
		let mut s = state();
		assert_eq!(s.layout.reheat_count(), 1);
		assert_eq!(s.layout.state(), LayoutState::Settling);

		let same = s.model.raw().unwrap().clone();
		s.load(same);
		assert_eq!(s.layout.reheat_count(), 1);
	}

	#[test]
	fn show_labels_never_reheats() {
		let mut s = state();
		s.set_show_labels(false);
		s.set_show_labels(true);
		assert_eq!(s.layout.reheat_count(), 1);
	}

	#[test]
	fn controls_reheat_once_per_change() {
		let mut s = state();
		s.set_repulsion(600.0);
		assert_eq!(s.layout.reheat_count(), 2);
		s.set_repulsion(600.0);
		assert_eq!(s.layout.reheat_count(), 2);
		s.set_entity_only(true);
		assert_eq!(s.layout.reheat_count(), 3);
		s.set_entity_only(true);
		assert_eq!(s.layout.reheat_count(), 3);
		assert_eq!(s.view().unwrap().node_count(), 2);
	}

	#[test]
	fn auto_fit_fires_once_per_settle() {
		let mut s = state();
		settle(&mut s);
		assert!(s.camera.is_animating());
		for _ in 0..100 {
			s.frame(16.0);
		}
		assert!(!s.camera.is_animating());

		// Further cooled frames never re-issue the fit.
		let center = s.camera.center();
		s.camera.pan_by(30.0, 0.0);
		for _ in 0..10 {
			s.frame(16.0);
		}
		assert_ne!(s.camera.center(), center);
		assert!(!s.camera.is_animating());
	}

	#[test]
	fn click_focuses_camera_smoothly() {
		let mut s = state();
		settle(&mut s);
		for _ in 0..100 {
			s.frame(16.0);
		}
		let (sx, sy) = on_screen(&s, "Jane Doe");
		let target = s.lookup("Jane Doe").unwrap().1;

		s.pointer_down(sx, sy);
		s.pointer_up();
		assert_eq!(s.model.selected(), Some("Jane Doe"));
		assert!(s.camera.is_animating());
		assert_ne!(s.camera.center(), target);

		for _ in 0..100 {
			s.frame(16.0);
		}
		let center = s.camera.center();
		assert!(center.distance(target) < 1e-9);
		assert!((s.camera.zoom() - s.camera.config.focus_zoom).abs() < 1e-9);
	}

	#[test]
	fn dragging_is_not_a_click() {
		let mut s = state();
		settle(&mut s);
		let reheats = s.layout.reheat_count();
		let (sx, sy) = on_screen(&s, "Acme Corp");

		s.pointer_down(sx, sy);
		s.pointer_move(sx + 40.0, sy);
		let expected = s.camera.screen_to_world(sx + 40.0, sy);
		s.frame(16.0);
		assert_eq!(s.lookup("Acme Corp").unwrap().1, expected);
		s.pointer_up();

		assert_eq!(s.model.selected(), None);
		assert_eq!(s.layout.reheat_count(), reheats);
	}

	#[test]
	fn filtering_out_the_dragged_node_ends_the_drag() {
		let mut s = state();
		settle(&mut s);
		let (sx, sy) = on_screen(&s, "chunk-1");
		s.pointer_down(sx, sy);
		s.pointer_move(sx + 40.0, sy);
		assert_eq!(s.drag.node_id.as_deref(), Some("chunk-1"));

		s.set_entity_only(true);
		assert!(s.drag.node_id.is_none());
		settle(&mut s);
		assert_eq!(s.layout.state(), LayoutState::Cooled);
	}

	#[test]
	fn background_drag_pans() {
		let mut s = state();
		s.frame(16.0);
		let before = s.camera.center();
		s.pointer_down(5.0, 5.0);
		s.pointer_move(25.0, 5.0);
		s.pointer_up();
		assert!(s.camera.center().x < before.x);
	}

	#[test]
	fn click_on_unknown_node_is_ignored() {
		let mut s = state();
		s.on_node_click("nobody");
		assert!(!s.camera.is_animating());
		assert_eq!(s.model.selected(), None);
	}

	#[test]
	fn reload_replaces_graph_and_clears_selection() {
		let mut s = state();
		s.frame(16.0);
		s.on_node_click("Jane Doe");
		let mut next = acme_graph();
		next.focus = "Jane Doe".into();
		s.load(Arc::new(next));
		assert_eq!(s.model.selected(), None);
		assert_eq!(s.layout.reheat_count(), 2);
		assert_eq!(s.model.raw().unwrap().focus, "Jane Doe");
	}
}
