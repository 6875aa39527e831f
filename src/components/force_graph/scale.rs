//! Zoom-dependent scaling configuration for graph visuals.
//!
//! # Coordinate Spaces
//!
//! - **World-space**: The coordinate system of the simulation. Values in
//!   world-space scale proportionally with zoom.
//! - **Screen-space**: Pixel coordinates on the canvas. Values in screen-space
//!   remain constant regardless of zoom level.
//!
//! Everything is drawn after the camera transform, so screen-space sizes are
//! divided by the zoom factor `k` before use.

/// Defines how a visual property scales with zoom level.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	/// Constant world-space size. Appears larger when zoomed in.
	World,
	/// Constant screen-space size (pixels). Unaffected by zoom.
	Screen,
	/// World-space scaling, clamped to min/max screen-space bounds.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// Compute the world-space value for a given base value and zoom level.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Configuration for node visual scaling.
#[derive(Clone, Debug)]
pub struct NodeScaleConfig {
	/// Radius in world units for nodes without a size hint.
	pub default_radius: f64,
	/// Radius per square-root unit of size hint.
	pub radius_per_unit: f64,
	/// Extra hit-test slack around the drawn circle.
	pub hit_slack: f64,
	pub hit_behavior: ScaleBehavior,
	/// Label font size in screen pixels.
	pub label_size: f64,
	/// Gap between circle and label in screen pixels.
	pub label_gap: f64,
	/// Selection ring stroke in screen pixels.
	pub ring_width: f64,
}

/// Configuration for link visual scaling.
#[derive(Clone, Debug)]
pub struct LinkScaleConfig {
	/// Line width in screen pixels.
	pub line_width: f64,
	pub width_behavior: ScaleBehavior,
	/// Arrow lengths come from the simulation config in world units.
	pub arrow_behavior: ScaleBehavior,
}

/// Complete scale configuration for all graph elements.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	pub node: NodeScaleConfig,
	pub link: LinkScaleConfig,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node: NodeScaleConfig {
				default_radius: 4.0,
				radius_per_unit: 4.0,
				hit_slack: 2.0,
				hit_behavior: ScaleBehavior::Clamped {
					min_screen: 6.0,
					max_screen: f64::INFINITY,
				},
				label_size: 12.0,
				label_gap: 2.0,
				ring_width: 2.0,
			},
			link: LinkScaleConfig {
				line_width: 1.0,
				width_behavior: ScaleBehavior::Screen,
				arrow_behavior: ScaleBehavior::World,
			},
		}
	}
}

impl ScaleConfig {
	/// World-space radius for a node. Monotonic in `size_hint`.
	pub fn node_radius(&self, size_hint: Option<f64>) -> f64 {
		match size_hint {
			Some(size) if size > 0.0 => size.sqrt() * self.node.radius_per_unit,
			_ => self.node.default_radius,
		}
	}
}

/// Pre-computed scale values for a specific zoom level.
///
/// Create this once per frame and pass it to rendering functions.
/// All sizes are in world-space (ready to use after canvas transform).
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Current zoom level.
	pub k: f64,
	/// Label font size in world units (`label_size / k`).
	pub label_font_px: f64,
	pub label_gap: f64,
	pub link_width: f64,
	pub arrow_length: f64,
	pub ring_width: f64,
}

impl ScaledValues {
	/// Compute scaled values from configuration, zoom, and the arrow length
	/// derived by the layout.
	pub fn new(config: &ScaleConfig, k: f64, arrow_length: f64) -> Self {
		Self {
			k,
			label_font_px: config.node.label_size / k,
			label_gap: config.node.label_gap / k,
			link_width: config.link.width_behavior.apply(config.link.line_width, k),
			arrow_length: config.link.arrow_behavior.apply(arrow_length, k),
			ring_width: config.node.ring_width / k,
		}
	}

	/// World-space radius used for picking, never smaller than the clamp.
	pub fn hit_radius(&self, config: &ScaleConfig, radius: f64) -> f64 {
		config
			.node
			.hit_behavior
			.apply(radius + config.node.hit_slack, self.k)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn radius_grows_with_size_hint() {
		let config = ScaleConfig::default();
		assert_eq!(config.node_radius(None), 4.0);
		assert_eq!(config.node_radius(Some(0.0)), 4.0);
		assert_eq!(config.node_radius(Some(4.0)), 8.0);
		assert!(config.node_radius(Some(9.0)) > config.node_radius(Some(4.0)));
	}

	#[test]
	fn label_font_shrinks_in_world_units_when_zoomed_in() {
		let config = ScaleConfig::default();
		assert_eq!(ScaledValues::new(&config, 1.0, 3.0).label_font_px, 12.0);
		assert_eq!(ScaledValues::new(&config, 4.0, 3.0).label_font_px, 3.0);
		assert_eq!(ScaledValues::new(&config, 0.5, 3.0).label_font_px, 24.0);
	}

	#[test]
	fn arrow_length_is_world_space() {
		let config = ScaleConfig::default();
		assert_eq!(ScaledValues::new(&config, 3.0, 5.0).arrow_length, 5.0);
		assert_eq!(ScaledValues::new(&config, 2.0, 5.0).link_width, 0.5);
	}

	#[test]
	fn hit_radius_has_screen_minimum() {
		let config = ScaleConfig::default();
		let zoomed_out = ScaledValues::new(&config, 0.25, 3.0);
		assert_eq!(zoomed_out.hit_radius(&config, 4.0), 24.0);
		let zoomed_in = ScaledValues::new(&config, 10.0, 3.0);
		assert_eq!(zoomed_in.hit_radius(&config, 4.0), 6.0);
	}
}
