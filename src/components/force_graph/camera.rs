//! Pan/zoom camera with time-based transitions.
//!
//! The camera is stored as the world point at the viewport center plus a zoom
//! factor. Pan and zoom tween independently; issuing a new target for either
//! replaces the running tween, starting from wherever the camera is now.

use super::types::Position;

/// Pan and zoom transform applied to the entire graph view.
/// `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%).
	pub k: f64,
}

/// Camera command tuning.
#[derive(Clone, Debug)]
pub struct CameraConfig {
	/// Zoom level applied when a node is clicked.
	pub focus_zoom: f64,
	pub focus_duration_ms: f64,
	pub fit_duration_ms: f64,
	/// Screen-space margin kept around fitted nodes.
	pub fit_padding: f64,
	pub min_zoom: f64,
	pub max_zoom: f64,
}

impl Default for CameraConfig {
	fn default() -> Self {
		Self {
			focus_zoom: 3.0,
			focus_duration_ms: 800.0,
			fit_duration_ms: 400.0,
			fit_padding: 40.0,
			min_zoom: 0.05,
			max_zoom: 20.0,
		}
	}
}

trait Lerp: Copy {
	fn lerp(self, to: Self, t: f64) -> Self;
}

impl Lerp for f64 {
	fn lerp(self, to: Self, t: f64) -> Self {
		self + (to - self) * t
	}
}

impl Lerp for Position {
	fn lerp(self, to: Self, t: f64) -> Self {
		Position::new(self.x.lerp(to.x, t), self.y.lerp(to.y, t))
	}
}

#[derive(Clone, Copy, Debug)]
struct Tween<T> {
	from: T,
	to: T,
	elapsed_ms: f64,
	duration_ms: f64,
}

impl<T: Lerp> Tween<T> {
	fn new(from: T, to: T, duration_ms: f64) -> Self {
		Self {
			from,
			to,
			elapsed_ms: 0.0,
			duration_ms,
		}
	}

	/// Advances and returns the current value plus whether the tween finished.
	fn advance(&mut self, dt_ms: f64) -> (T, bool) {
		self.elapsed_ms += dt_ms;
		if self.duration_ms <= 0.0 || self.elapsed_ms >= self.duration_ms {
			return (self.to, true);
		}
		let t = self.elapsed_ms / self.duration_ms;
		// Quadratic ease-out.
		(self.from.lerp(self.to, t * (2.0 - t)), false)
	}
}

/// Viewport camera.
#[derive(Clone, Debug)]
pub struct Camera {
	pub config: CameraConfig,
	center: Position,
	k: f64,
	width: f64,
	height: f64,
	pan: Option<Tween<Position>>,
	zoom: Option<Tween<f64>>,
}

impl Camera {
	pub fn new(width: f64, height: f64, config: CameraConfig) -> Self {
		Self {
			config,
			center: Position::default(),
			k: 1.0,
			width,
			height,
			pan: None,
			zoom: None,
		}
	}

	pub fn transform(&self) -> ViewTransform {
		ViewTransform {
			x: self.width / 2.0 - self.center.x * self.k,
			y: self.height / 2.0 - self.center.y * self.k,
			k: self.k,
		}
	}

	pub fn center(&self) -> Position {
		self.center
	}

	pub fn zoom(&self) -> f64 {
		self.k
	}

	pub fn viewport(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	pub fn screen_to_world(&self, sx: f64, sy: f64) -> Position {
		let t = self.transform();
		Position::new((sx - t.x) / t.k, (sy - t.y) / t.k)
	}

	pub fn is_animating(&self) -> bool {
		self.pan.is_some() || self.zoom.is_some()
	}

	/// Smoothly moves the viewport center to `target`.
	pub fn pan_to(&mut self, target: Position, duration_ms: f64) {
		self.pan = Some(Tween::new(self.center, target, duration_ms));
	}

	/// Smoothly changes the zoom level.
	pub fn zoom_to(&mut self, k: f64, duration_ms: f64) {
		let k = k.clamp(self.config.min_zoom, self.config.max_zoom);
		self.zoom = Some(Tween::new(self.k, k, duration_ms));
	}

	/// Frames every point in the viewport. Returns `false` when there is
	/// nothing to frame.
	pub fn fit(&mut self, points: impl IntoIterator<Item = Position>) -> bool {
		let mut bounds: Option<(Position, Position)> = None;
		for p in points {
			bounds = Some(match bounds {
				None => (p, p),
				Some((lo, hi)) => (
					Position::new(lo.x.min(p.x), lo.y.min(p.y)),
					Position::new(hi.x.max(p.x), hi.y.max(p.y)),
				),
			});
		}
		let Some((lo, hi)) = bounds else {
			return false;
		};

		let pad = self.config.fit_padding;
		let avail_w = (self.width - 2.0 * pad).max(1.0);
		let avail_h = (self.height - 2.0 * pad).max(1.0);
		let span_w = (hi.x - lo.x).max(1e-6);
		let span_h = (hi.y - lo.y).max(1e-6);
		let k = (avail_w / span_w).min(avail_h / span_h);

		let duration = self.config.fit_duration_ms;
		self.pan_to(Position::new((lo.x + hi.x) / 2.0, (lo.y + hi.y) / 2.0), duration);
		self.zoom_to(k, duration);
		true
	}

	/// Evaluates running tweens.
	pub fn advance(&mut self, dt_ms: f64) {
		if let Some(tween) = self.pan.as_mut() {
			let (center, done) = tween.advance(dt_ms);
			self.center = center;
			if done {
				self.pan = None;
			}
		}
		if let Some(tween) = self.zoom.as_mut() {
			let (k, done) = tween.advance(dt_ms);
			self.k = k;
			if done {
				self.zoom = None;
			}
		}
	}

	/// Drags the view by a screen-space delta, cancelling transitions.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.cancel();
		self.center.x -= dx / self.k;
		self.center.y -= dy / self.k;
	}

	/// Zooms by `factor`, keeping the world point under `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		self.cancel();
		let anchor = self.screen_to_world(sx, sy);
		self.k = (self.k * factor).clamp(self.config.min_zoom, self.config.max_zoom);
		self.center = Position::new(
			anchor.x - (sx - self.width / 2.0) / self.k,
			anchor.y - (sy - self.height / 2.0) / self.k,
		);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn cancel(&mut self) {
		self.pan = None;
		self.zoom = None;
	}
}
