//! Layout controller wrapping the [`Simulation`] in an explicit state machine.
//!
//! ```text
//!  Idle ──first view──▶ Settling ──budget spent / alpha < min──▶ Cooled
//!                          ▲                                      │
//!                          └──── reheat (view or config change) ◀─┘
//! ```
//!
//! Every transition back into `Settling` goes through [`LayoutEngine::reheat`],
//! which is counted so callers can verify that a change produced exactly one.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use log::debug;

use super::model::DerivedView;
use super::simulation::{ChargeForce, LinkForce, Simulation};
use super::types::{Position, RawGraph};

/// Lowest and highest values of the operator's repulsion control.
pub const REPULSION_RANGE: (f64, f64) = (80.0, 1000.0);

/// Physics and arrow sizing, all derived from the single repulsion control.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
	/// Charge strength; negative repels.
	pub repulsion_strength: f64,
	pub max_repulsion_distance: f64,
	pub link_distance: f64,
	/// World-space length of link arrowheads.
	pub directional_arrow_length: f64,
}

impl SimulationConfig {
	/// Derives every field together so the layout scale stays proportionate.
	pub fn from_repulsion(repulsion: f64) -> Self {
		Self {
			repulsion_strength: -repulsion,
			max_repulsion_distance: repulsion * 2.0,
			link_distance: (repulsion / 4.0).max(20.0),
			directional_arrow_length: (repulsion / 100.0).max(3.0),
		}
	}
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self::from_repulsion(200.0)
	}
}

/// How long a simulation may iterate before it is forced to cool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CooldownBudget {
	/// `None` = unbounded.
	pub ticks: Option<u32>,
	/// `None` = unbounded.
	pub time_ms: Option<f64>,
}

impl CooldownBudget {
	pub const UNBOUNDED: Self = Self {
		ticks: None,
		time_ms: None,
	};

	fn exhausted(&self, ticks: u32, elapsed_ms: f64) -> bool {
		self.ticks.is_some_and(|max| ticks >= max)
			|| self.time_ms.is_some_and(|max| elapsed_ms >= max)
	}
}

impl Default for CooldownBudget {
	fn default() -> Self {
		Self {
			ticks: Some(400),
			time_ms: Some(15_000.0),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutState {
	/// No view loaded.
	Idle,
	Settling,
	/// Budget spent; positions are stable and ticks are no-ops.
	Cooled,
}

/// Alpha target while a node is being dragged.
const DRAG_ALPHA_TARGET: f64 = 0.3;

/// Owns the simulation and decides when it runs.
pub struct LayoutEngine {
	sim: Simulation,
	config: SimulationConfig,
	state: LayoutState,
	budget: CooldownBudget,
	/// Normal budget parked while a reheat runs unbounded; restored on the
	/// first tick after the reheat.
	parked_budget: Option<CooldownBudget>,
	ticks: u32,
	elapsed_ms: f64,
	raw: Option<Arc<RawGraph>>,
	view: Option<Rc<DerivedView>>,
	/// id -> arena index for the current raw graph.
	index: HashMap<String, usize>,
	reheats: u64,
}

impl LayoutEngine {
	pub fn new(config: SimulationConfig, budget: CooldownBudget) -> Self {
		Self {
			sim: Simulation::default(),
			config,
			state: LayoutState::Idle,
			budget,
			parked_budget: None,
			ticks: 0,
			elapsed_ms: 0.0,
			raw: None,
			view: None,
			index: HashMap::new(),
			reheats: 0,
		}
	}

	pub fn state(&self) -> LayoutState {
		self.state
	}

	pub fn config(&self) -> SimulationConfig {
		self.config
	}

	/// Number of reheats issued so far.
	pub fn reheat_count(&self) -> u64 {
		self.reheats
	}

	/// Current simulation energy.
	pub fn alpha(&self) -> f64 {
		self.sim.alpha
	}

	pub fn view(&self) -> Option<&Rc<DerivedView>> {
		self.view.as_ref()
	}

	/// Live position of a node by id.
	pub fn position_of(&self, id: &str) -> Option<Position> {
		self.index.get(id).and_then(|&i| self.sim.position(i))
	}

	/// Arena index of a node in the current raw graph.
	pub fn arena_index(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Live position of a node by raw-graph arena index.
	pub fn position_at(&self, arena_idx: usize) -> Option<Position> {
		self.sim.position(arena_idx)
	}

	/// Adopts a derived view. Reheats when its identity differs from the
	/// current one; the same `Rc` again is a no-op. Returns whether a reheat
	/// was issued.
	pub fn sync_view(&mut self, view: Rc<DerivedView>) -> bool {
		if self.view.as_ref().is_some_and(|v| Rc::ptr_eq(v, &view)) {
			return false;
		}

		let same_raw = self.raw.as_ref().is_some_and(|r| Arc::ptr_eq(r, view.raw()));
		if !same_raw {
			let raw = view.raw().clone();
			self.index = raw
				.index_by_id()
				.into_iter()
				.map(|(id, i)| (id.to_string(), i))
				.collect();
			self.sim.reset_arena(raw.nodes.len());
			self.raw = Some(raw);
		}

		let links = view
			.links()
			.filter_map(|l| Some((*self.index.get(&l.source)?, *self.index.get(&l.target)?)))
			.collect();
		let arena_len = view.raw().nodes.len();
		self.sim.set_active(
			view.node_indices().to_vec(),
			ChargeForce {
				strength: self.config.repulsion_strength,
				distance_max: self.config.max_repulsion_distance,
				distance_min: 1.0,
			},
			LinkForce::new(self.config.link_distance, links, arena_len),
		);
		self.view = Some(view);
		self.reheat();
		true
	}

	/// Applies a new repulsion value. Reheats only when the derived config
	/// actually differs.
	pub fn set_repulsion(&mut self, repulsion: f64) -> bool {
		let repulsion = repulsion.clamp(REPULSION_RANGE.0, REPULSION_RANGE.1);
		let next = SimulationConfig::from_repulsion(repulsion);
		if next == self.config {
			return false;
		}
		self.config = next;
		if self.view.is_some() {
			self.reheat();
		}
		true
	}

	/// Pushes the config into the registered forces and restarts iteration
	/// from full energy, even if the simulation had already cooled.
	///
	/// The cooldown budget is parked as unbounded so the stale tick/time
	/// counters cannot cool the simulation again before it iterates; the first
	/// tick afterwards restores the normal budget with fresh counters.
	pub fn reheat(&mut self) {
		if let Some(charge) = self.sim.charge_mut() {
			charge.strength = self.config.repulsion_strength;
			charge.distance_max = self.config.max_repulsion_distance;
		}
		if let Some(link) = self.sim.link_mut() {
			link.distance = self.config.link_distance;
		}

		if self.parked_budget.is_none() {
			self.parked_budget = Some(self.budget);
		}
		self.budget = CooldownBudget::UNBOUNDED;
		self.sim.alpha = 1.0;
		self.state = LayoutState::Settling;
		self.reheats += 1;
		debug!(
			"kg-viz: reheat #{} ({} bodies, {} springs, strength {}, link distance {})",
			self.reheats,
			self.sim.active().len(),
			self.sim.link_mut().map_or(0, |l| l.len()),
			self.config.repulsion_strength,
			self.config.link_distance
		);
	}

	/// Advances the layout by one frame. Returns `true` exactly once, on the
	/// frame the simulation cools.
	pub fn tick(&mut self, dt_ms: f64) -> bool {
		if self.state != LayoutState::Settling {
			return false;
		}

		self.sim.step();

		if let Some(budget) = self.parked_budget.take() {
			self.budget = budget;
			self.ticks = 0;
			self.elapsed_ms = 0.0;
		}
		self.ticks += 1;
		self.elapsed_ms += dt_ms;

		let nothing_to_move = self.sim.active().is_empty();
		let spent = self.sim.is_converged() || self.budget.exhausted(self.ticks, self.elapsed_ms);
		if nothing_to_move || (self.sim.alpha_target == 0.0 && spent) {
			self.state = LayoutState::Cooled;
			return true;
		}
		false
	}

	/// Pins a node under the cursor and keeps the simulation warm while dragged.
	pub fn drag_to(&mut self, id: &str, at: Position) {
		let Some(&idx) = self.index.get(id) else {
			return;
		};
		self.sim.pin(idx, at);
		self.sim.alpha_target = DRAG_ALPHA_TARGET;
		if self.state == LayoutState::Cooled {
			self.ticks = 0;
			self.elapsed_ms = 0.0;
			self.state = LayoutState::Settling;
		}
	}

	/// Releases a dragged node and lets the simulation cool again.
	pub fn end_drag(&mut self, id: &str) {
		if let Some(&idx) = self.index.get(id) {
			self.sim.unpin(idx);
		}
		self.sim.alpha_target = 0.0;
	}
}

impl Default for LayoutEngine {
	fn default() -> Self {
		Self::new(SimulationConfig::default(), CooldownBudget::default())
	}
}
