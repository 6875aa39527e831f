//! Canvas rendering for the neighborhood graph.
//!
//! Rendering uses multiple passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Link lines, then arrowheads (world space)
//! 3. Node circles, selection ring, then labels on top
//!
//! Node drawing is entirely ours; nothing is composited over a default shape.
//! Anything that cannot be positioned is skipped for the frame and counted
//! in [`RenderStats::skipped`].

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::camera::ViewTransform;
use super::scale::{ScaleConfig, ScaledValues};
use super::state::ForceGraphState;
use super::theme::{Color, Theme};
use super::types::Position;

/// The drawing operations the renderer needs. Implemented for the browser
/// canvas and, in tests, for a recorder.
pub trait Surface {
	fn fill_background(&mut self, width: f64, height: f64, background: &super::theme::BackgroundStyle);
	/// Saves state and applies the camera transform.
	fn push_transform(&mut self, t: ViewTransform);
	fn pop_transform(&mut self);
	fn line(&mut self, from: Position, to: Position, color: &str, width: f64);
	fn triangle(&mut self, points: [Position; 3], color: &str);
	fn circle(&mut self, center: Position, radius: f64, color: &str);
	fn ring(&mut self, center: Position, radius: f64, color: &str, width: f64);
	/// Draws `text` horizontally centered with its top edge at `at`.
	fn text_below(&mut self, text: &str, at: Position, font: &str, color: &str);
}

/// What a frame drew.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
	pub nodes_drawn: usize,
	pub links_drawn: usize,
	pub labels_drawn: usize,
	pub skipped: usize,
}

/// Fallback when a node carries no color of its own.
const DEFAULT_NODE_COLOR: Color = Color::rgb(128, 128, 128);

/// Renders the current view to `surface`.
pub fn render<S: Surface>(
	state: &ForceGraphState,
	surface: &mut S,
	config: &ScaleConfig,
	theme: &Theme,
) -> RenderStats {
	let mut stats = RenderStats::default();
	let (width, height) = state.camera.viewport();
	surface.fill_background(width, height, &theme.background);

	let Some(view) = state.view() else {
		return stats;
	};

	let transform = state.camera.transform();
	let scale = ScaledValues::new(
		config,
		transform.k,
		state.layout.config().directional_arrow_length,
	);

	surface.push_transform(transform);

	// Links first so nodes sit on top.
	let line_color = theme.link.color.to_css();
	let arrow_color = theme.link.arrow_color.to_css();
	for link in view.links() {
		let ends = state
			.lookup(&link.source)
			.zip(state.lookup(&link.target));
		let Some(((_, from), (target_node, to))) = ends else {
			stats.skipped += 1;
			continue;
		};
		let target_radius = config.node_radius(target_node.size_hint);
		draw_link(surface, from, to, target_radius, &scale, &line_color, &arrow_color);
		stats.links_drawn += 1;
	}

	let default_color = DEFAULT_NODE_COLOR.to_css();
	let selected = state.model.selected();
	for (arena_idx, node) in view.nodes() {
		let Some(center) = state.layout.position_at(arena_idx) else {
			stats.skipped += 1;
			continue;
		};
		let radius = config.node_radius(node.size_hint);
		let color = node.color.as_deref().unwrap_or(&default_color);
		surface.circle(center, radius, color);
		if selected == Some(node.id.as_str()) {
			surface.ring(
				center,
				radius + scale.ring_width,
				&theme.label.selection_color.to_css(),
				scale.ring_width,
			);
		}
		stats.nodes_drawn += 1;
	}

	if state.show_labels() {
		let font = format!("{}px {}", scale.label_font_px, theme.label.font_family);
		let label_color = theme.label.color.to_css();
		for (arena_idx, node) in view.nodes() {
			let Some(center) = state.layout.position_at(arena_idx) else {
				continue;
			};
			let radius = config.node_radius(node.size_hint);
			let at = Position::new(center.x, center.y + radius + scale.label_gap);
			surface.text_below(&node.label, at, &font, &label_color);
			stats.labels_drawn += 1;
		}
	}

	surface.pop_transform();
	stats
}

/// Line from source center to the arrow base, arrow tip on the target's edge.
fn draw_link<S: Surface>(
	surface: &mut S,
	from: Position,
	to: Position,
	target_radius: f64,
	scale: &ScaledValues,
	line_color: &str,
	arrow_color: &str,
) {
	let (dx, dy) = (to.x - from.x, to.y - from.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);

	let tip = Position::new(to.x - ux * target_radius, to.y - uy * target_radius);
	let len = scale.arrow_length;
	let back = Position::new(tip.x - ux * len, tip.y - uy * len);
	let (px, py) = (-uy * len * 0.5, ux * len * 0.5);

	surface.line(from, back, line_color, scale.link_width);
	surface.triangle(
		[
			tip,
			Position::new(back.x + px, back.y + py),
			Position::new(back.x - px, back.y - py),
		],
		arrow_color,
	);
}

impl Surface for CanvasRenderingContext2d {
	fn fill_background(&mut self, width: f64, height: f64, background: &super::theme::BackgroundStyle) {
		let gradient = background
			.use_gradient
			.then(|| {
				self.create_radial_gradient(
					width / 2.0,
					height / 2.0,
					0.0,
					width / 2.0,
					height / 2.0,
					width.max(height) * 0.8,
				)
				.ok()
			})
			.flatten();

		match gradient {
			Some(gradient) => {
				let _ = gradient.add_color_stop(0.0, &background.color_secondary.to_css());
				let _ = gradient.add_color_stop(1.0, &background.color.to_css());
				#[allow(deprecated)]
				self.set_fill_style(&gradient);
			}
			None => self.set_fill_style_str(&background.color.to_css()),
		}
		self.fill_rect(0.0, 0.0, width, height);
	}

	fn push_transform(&mut self, t: ViewTransform) {
		self.save();
		let _ = self.translate(t.x, t.y);
		let _ = self.scale(t.k, t.k);
	}

	fn pop_transform(&mut self) {
		self.restore();
	}

	fn line(&mut self, from: Position, to: Position, color: &str, width: f64) {
		self.set_stroke_style_str(color);
		self.set_line_width(width);
		self.begin_path();
		self.move_to(from.x, from.y);
		self.line_to(to.x, to.y);
		self.stroke();
	}

	fn triangle(&mut self, [a, b, c]: [Position; 3], color: &str) {
		self.set_fill_style_str(color);
		self.begin_path();
		self.move_to(a.x, a.y);
		self.line_to(b.x, b.y);
		self.line_to(c.x, c.y);
		self.close_path();
		self.fill();
	}

	fn circle(&mut self, center: Position, radius: f64, color: &str) {
		self.begin_path();
		let _ = self.arc(center.x, center.y, radius, 0.0, 2.0 * PI);
		self.set_fill_style_str(color);
		self.fill();
	}

	fn ring(&mut self, center: Position, radius: f64, color: &str, width: f64) {
		self.begin_path();
		let _ = self.arc(center.x, center.y, radius, 0.0, 2.0 * PI);
		self.set_stroke_style_str(color);
		self.set_line_width(width);
		self.stroke();
	}

	fn text_below(&mut self, text: &str, at: Position, font: &str, color: &str) {
		self.set_font(font);
		self.set_text_align("center");
		self.set_text_baseline("top");
		self.set_fill_style_str(color);
		let _ = self.fill_text(text, at.x, at.y);
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::components::force_graph::model::tests::acme_graph;
	use crate::components::force_graph::theme::BackgroundStyle;
	use crate::components::force_graph::types::{GraphLink, RawGraph};

	#[derive(Debug, PartialEq)]
	enum Op {
		Background,
		Push(f64),
		Pop,
		Line(Position, Position),
		Triangle(Position),
		Circle(Position, f64, String),
		Ring,
		Text(String, Position, String),
	}

	#[derive(Default)]
	struct Recorder {
		ops: Vec<Op>,
	}

	impl Surface for Recorder {
		fn fill_background(&mut self, _: f64, _: f64, _: &BackgroundStyle) {
			self.ops.push(Op::Background);
		}
		fn push_transform(&mut self, t: ViewTransform) {
			self.ops.push(Op::Push(t.k));
		}
		fn pop_transform(&mut self) {
			self.ops.push(Op::Pop);
		}
		fn line(&mut self, from: Position, to: Position, _: &str, _: f64) {
			self.ops.push(Op::Line(from, to));
		}
		fn triangle(&mut self, points: [Position; 3], _: &str) {
			self.ops.push(Op::Triangle(points[0]));
		}
		fn circle(&mut self, center: Position, radius: f64, color: &str) {
			self.ops.push(Op::Circle(center, radius, color.to_string()));
		}
		fn ring(&mut self, _: Position, _: f64, _: &str, _: f64) {
			self.ops.push(Op::Ring);
		}
		fn text_below(&mut self, text: &str, at: Position, font: &str, _: &str) {
			self.ops.push(Op::Text(text.to_string(), at, font.to_string()));
		}
	}

	fn loaded(raw: RawGraph) -> ForceGraphState {
		let mut state = ForceGraphState::new(800.0, 600.0, 200.0, true, false);
		state.load(Arc::new(raw));
		state.frame(16.0);
		state
	}

	fn render_once(state: &ForceGraphState) -> (RenderStats, Recorder) {
		let mut rec = Recorder::default();
		let stats = render(state, &mut rec, &ScaleConfig::default(), &Theme::default());
		(stats, rec)
	}

	#[test]
	fn empty_state_only_clears() {
		let state = ForceGraphState::new(800.0, 600.0, 200.0, true, false);
		let (stats, rec) = render_once(&state);
		assert_eq!(stats, RenderStats::default());
		assert_eq!(rec.ops, vec![Op::Background]);
	}

	#[test]
	fn draws_every_node_link_and_label() {
		let state = loaded(acme_graph());
		let (stats, rec) = render_once(&state);
		assert_eq!(stats.nodes_drawn, 3);
		assert_eq!(stats.links_drawn, 3);
		assert_eq!(stats.labels_drawn, 3);
		assert_eq!(stats.skipped, 0);
		let triangles = rec.ops.iter().filter(|op| matches!(op, Op::Triangle(_))).count();
		assert_eq!(triangles, 3);
		assert_eq!(rec.ops.last(), Some(&Op::Pop));
	}

	#[test]
	fn nodes_use_their_color_and_size() {
		let mut raw = acme_graph();
		raw.nodes[0].color = Some("#ff0000".into());
		raw.nodes[0].size_hint = Some(4.0);
		let state = loaded(raw);
		let (_, rec) = render_once(&state);
		let first = rec
			.ops
			.iter()
			.find_map(|op| match op {
				Op::Circle(_, r, c) => Some((*r, c.clone())),
				_ => None,
			})
			.unwrap();
		assert_eq!(first, (8.0, "#ff0000".to_string()));
	}

	#[test]
	fn labels_sit_below_and_scale_with_zoom() {
		let mut state = loaded(acme_graph());
		state.camera.zoom_to(2.0, 0.0);
		state.camera.advance(1.0);
		let (_, rec) = render_once(&state);
		let center = state.layout.position_of("Jane Doe").unwrap();
		let label = rec
			.ops
			.iter()
			.find_map(|op| match op {
				Op::Text(t, at, font) if t == "Jane Doe" => Some((*at, font.clone())),
				_ => None,
			})
			.unwrap();
		assert_eq!(label.0.x, center.x);
		assert!(label.0.y > center.y + 4.0);
		assert_eq!(label.1, "6px sans-serif");
	}

	#[test]
	fn hidden_labels_are_not_drawn() {
		let mut state = loaded(acme_graph());
		state.set_show_labels(false);
		let (stats, rec) = render_once(&state);
		assert_eq!(stats.labels_drawn, 0);
		assert!(!rec.ops.iter().any(|op| matches!(op, Op::Text(..))));
	}

	#[test]
	fn arrow_tip_touches_target_edge() {
		let mut raw = acme_graph();
		raw.links = vec![GraphLink {
			source: "Jane Doe".into(),
			target: "Acme Corp".into(),
			label: String::new(),
		}];
		let state = loaded(raw);
		let (_, rec) = render_once(&state);
		let target = state.layout.position_of("Acme Corp").unwrap();
		let tip = rec
			.ops
			.iter()
			.find_map(|op| match op {
				Op::Triangle(tip) => Some(*tip),
				_ => None,
			})
			.unwrap();
		let radius = ScaleConfig::default().node_radius(None);
		assert!((tip.distance(target) - radius).abs() < 1e-9);
	}

	#[test]
	fn unresolvable_entries_are_skipped_not_fatal() {
		// Loaded but not yet ticked: nothing has a position.
		let mut fresh = ForceGraphState::new(800.0, 600.0, 200.0, true, false);
		fresh.load(Arc::new(acme_graph()));
		let (stats, _) = render_once(&fresh);
		assert_eq!(stats.nodes_drawn, 0);
		assert_eq!(stats.links_drawn, 0);
		assert_eq!(stats.skipped, 6);
	}

	#[test]
	fn selected_node_gets_a_ring() {
		let mut state = loaded(acme_graph());
		state.model.select(Some("Jane Doe".into()));
		let (_, rec) = render_once(&state);
		assert_eq!(rec.ops.iter().filter(|op| matches!(op, Op::Ring)).count(), 1);
	}
}
