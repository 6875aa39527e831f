//! Velocity-Verlet style force simulation with alpha cooling.
//!
//! Bodies live in an arena aligned with the raw graph's node list, so a body
//! keeps its position while its node is filtered out and picks up where it
//! left off when it comes back. Only the `active` subset is integrated.
//!
//! Each tick:
//! 1. `alpha` moves towards `alpha_target` by `alpha_decay`.
//! 2. Every registered force adds to body velocities, scaled by `alpha`.
//! 3. Velocities decay by `velocity_decay`, then move the bodies.

use std::f64::consts::PI;

use super::types::Position;

/// Per-node physics state.
#[derive(Clone, Copy, Debug, Default)]
pub struct Body {
	/// `None` until the body is first placed.
	pub position: Option<Position>,
	pub vx: f64,
	pub vy: f64,
	/// Fixed position while dragged.
	pub pinned: Option<Position>,
}

/// Many-body repulsion (negative strength) or attraction (positive).
#[derive(Clone, Debug)]
pub struct ChargeForce {
	pub strength: f64,
	/// Pairs farther apart than this do not interact.
	pub distance_max: f64,
	/// Distances below this are clamped to avoid exploding forces.
	pub distance_min: f64,
}

/// Spring along each link pulling the endpoints towards `distance`.
#[derive(Clone, Debug)]
pub struct LinkForce {
	pub distance: f64,
	/// Resolved `(source, target)` body indices.
	links: Vec<(usize, usize)>,
	/// `1 / min(degree(source), degree(target))` per link.
	strengths: Vec<f64>,
	/// Share of the correction applied to the target.
	biases: Vec<f64>,
}

impl LinkForce {
	/// Builds spring constants from node degrees, one entry per link.
	pub fn new(distance: f64, links: Vec<(usize, usize)>, arena_len: usize) -> Self {
		let mut degree = vec![0usize; arena_len];
		for &(s, t) in &links {
			degree[s] += 1;
			degree[t] += 1;
		}
		let strengths = links
			.iter()
			.map(|&(s, t)| 1.0 / degree[s].min(degree[t]).max(1) as f64)
			.collect();
		let biases = links
			.iter()
			.map(|&(s, t)| degree[s] as f64 / (degree[s] + degree[t]).max(1) as f64)
			.collect();
		Self {
			distance,
			links,
			strengths,
			biases,
		}
	}

	pub fn len(&self) -> usize {
		self.links.len()
	}

	pub fn is_empty(&self) -> bool {
		self.links.is_empty()
	}
}

/// Tuning for the integrator itself.
#[derive(Clone, Debug)]
pub struct SimulationParameters {
	pub alpha_min: f64,
	pub alpha_decay: f64,
	pub velocity_decay: f64,
}

impl Default for SimulationParameters {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			alpha_min,
			// Reaches alpha_min from 1.0 in ~300 ticks.
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.4,
		}
	}
}

/// The force simulation. Forces are optional: with no active bodies nothing is
/// registered and any attempt to reconfigure a force is silently skipped.
#[derive(Clone, Debug)]
pub struct Simulation {
	pub params: SimulationParameters,
	pub alpha: f64,
	pub alpha_target: f64,
	bodies: Vec<Body>,
	active: Vec<usize>,
	charge: Option<ChargeForce>,
	link: Option<LinkForce>,
	center: bool,
}

impl Default for Simulation {
	fn default() -> Self {
		Self::new(SimulationParameters::default())
	}
}

impl Simulation {
	pub fn new(params: SimulationParameters) -> Self {
		Self {
			params,
			alpha: 1.0,
			alpha_target: 0.0,
			bodies: Vec::new(),
			active: Vec::new(),
			charge: None,
			link: None,
			center: false,
		}
	}

	/// Resizes the arena for a new raw graph, forgetting every previous body.
	pub fn reset_arena(&mut self, len: usize) {
		self.bodies = vec![Body::default(); len];
		self.active.clear();
		self.charge = None;
		self.link = None;
		self.center = false;
	}

	/// Swaps the integrated subset. Bodies keep whatever position they had;
	/// unplaced ones are positioned by the next [`Simulation::step`].
	pub fn set_active(&mut self, active: Vec<usize>, charge: ChargeForce, link: LinkForce) {
		let has_bodies = !active.is_empty();
		self.active = active;
		self.charge = has_bodies.then_some(charge);
		self.link = has_bodies.then_some(link);
		self.center = has_bodies;
	}

	pub fn charge_mut(&mut self) -> Option<&mut ChargeForce> {
		self.charge.as_mut()
	}

	pub fn link_mut(&mut self) -> Option<&mut LinkForce> {
		self.link.as_mut()
	}

	pub fn body(&self, arena_idx: usize) -> Option<&Body> {
		self.bodies.get(arena_idx)
	}

	pub fn position(&self, arena_idx: usize) -> Option<Position> {
		self.body(arena_idx).and_then(|b| b.position)
	}

	pub fn active(&self) -> &[usize] {
		&self.active
	}

	/// Holds a body at `at` until [`Simulation::unpin`].
	pub fn pin(&mut self, arena_idx: usize, at: Position) {
		if let Some(body) = self.bodies.get_mut(arena_idx) {
			body.pinned = Some(at);
			body.position = Some(at);
		}
	}

	pub fn unpin(&mut self, arena_idx: usize) {
		if let Some(body) = self.bodies.get_mut(arena_idx) {
			body.pinned = None;
		}
	}

	/// Advances one iteration. Bodies that were never placed first get the
	/// phyllotaxis starting position.
	pub fn step(&mut self) {
		for (seq, &i) in self.active.iter().enumerate() {
			let body = &mut self.bodies[i];
			if body.position.is_none() {
				body.position = Some(initial_position(seq));
			}
		}

		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		let alpha = self.alpha;

		if let Some(link) = &self.link {
			apply_links(&mut self.bodies, link, alpha);
		}
		if let Some(charge) = &self.charge {
			apply_charge(&mut self.bodies, &self.active, charge, alpha);
		}
		if self.center {
			apply_center(&mut self.bodies, &self.active);
		}

		let keep = 1.0 - self.params.velocity_decay;
		for &i in &self.active {
			let body = &mut self.bodies[i];
			if let Some(pin) = body.pinned {
				body.position = Some(pin);
				body.vx = 0.0;
				body.vy = 0.0;
				continue;
			}
			body.vx *= keep;
			body.vy *= keep;
			if let Some(p) = body.position.as_mut() {
				p.x += body.vx;
				p.y += body.vy;
			}
		}
	}

	pub fn is_converged(&self) -> bool {
		self.alpha < self.params.alpha_min
	}
}

/// Phyllotaxis spiral, spreads new nodes evenly around the origin.
fn initial_position(seq: usize) -> Position {
	let radius = 10.0 * (0.5 + seq as f64).sqrt();
	let angle = seq as f64 * PI * (3.0 - 5f64.sqrt());
	Position::new(radius * angle.cos(), radius * angle.sin())
}

/// Deterministic tiny offset for coincident points.
fn jiggle(seed: usize) -> f64 {
	(((seed as f64) * 12.9898).sin() * 43758.5453).fract() * 1e-6 + 1e-6
}

fn apply_links(bodies: &mut [Body], link: &LinkForce, alpha: f64) {
	for (k, &(s, t)) in link.links.iter().enumerate() {
		let (Some(ps), Some(pt)) = (bodies[s].position, bodies[t].position) else {
			continue;
		};
		let mut x = pt.x + bodies[t].vx - ps.x - bodies[s].vx;
		let mut y = pt.y + bodies[t].vy - ps.y - bodies[s].vy;
		if x == 0.0 {
			x = jiggle(k);
		}
		if y == 0.0 {
			y = jiggle(k + 1);
		}
		let len = (x * x + y * y).sqrt();
		let l = (len - link.distance) / len * alpha * link.strengths[k];
		let (x, y) = (x * l, y * l);
		let bias = link.biases[k];
		bodies[t].vx -= x * bias;
		bodies[t].vy -= y * bias;
		bodies[s].vx += x * (1.0 - bias);
		bodies[s].vy += y * (1.0 - bias);
	}
}

fn apply_charge(bodies: &mut [Body], active: &[usize], charge: &ChargeForce, alpha: f64) {
	let max_sq = charge.distance_max * charge.distance_max;
	let min_sq = charge.distance_min * charge.distance_min;
	for (a, &i) in active.iter().enumerate() {
		for &j in &active[a + 1..] {
			let (Some(pi), Some(pj)) = (bodies[i].position, bodies[j].position) else {
				continue;
			};
			let mut x = pj.x - pi.x;
			let mut y = pj.y - pi.y;
			let mut l2 = x * x + y * y;
			if l2 >= max_sq {
				continue;
			}
			if x == 0.0 {
				x = jiggle(i);
				l2 += x * x;
			}
			if y == 0.0 {
				y = jiggle(j);
				l2 += y * y;
			}
			if l2 < min_sq {
				l2 = (min_sq * l2).sqrt();
			}
			let w = charge.strength * alpha / l2;
			// Negative strength pushes i away from j and j away from i.
			bodies[i].vx += x * w;
			bodies[i].vy += y * w;
			bodies[j].vx -= x * w;
			bodies[j].vy -= y * w;
		}
	}
}

/// Shifts the active set so its centroid sits at the origin.
fn apply_center(bodies: &mut [Body], active: &[usize]) {
	let (mut sx, mut sy, mut n) = (0.0, 0.0, 0usize);
	for &i in active {
		if let Some(p) = bodies[i].position {
			sx += p.x;
			sy += p.y;
			n += 1;
		}
	}
	if n == 0 {
		return;
	}
	let (cx, cy) = (sx / n as f64, sy / n as f64);
	for &i in active {
		if bodies[i].pinned.is_some() {
			continue;
		}
		if let Some(p) = bodies[i].position.as_mut() {
			p.x -= cx;
			p.y -= cy;
		}
	}
}
