//! The encounter sequence controller.
//!
//! [`SequenceController`] owns every piece of mutable simulation state: the
//! pre-allocated encounters, the vehicle, the speed model, and the
//! append-only decision history. Collaborators (input gateway, session,
//! presentation) only read through accessors or submit through
//! [`submit_decision`](SequenceController::submit_decision) and
//! [`request_lane_change`](SequenceController::request_lane_change).
//!
//! # Tick order
//!
//! Each [`tick`](SequenceController::tick) runs these steps in order, and
//! the active encounter makes at most one phase transition per tick:
//!
//! 1. Ease the vehicle toward its target lane.
//! 2. Advance elapsed distance and road scroll by the effective speed.
//! 3. Drift the previously finalized encounter out of view.
//! 4. Act on the active encounter's phase:
//!    - **Dormant**: activate once the previous encounter's delay has
//!      elapsed on the [`TimeSource`].
//!    - **Approaching**: advance; open the window on entering the band.
//!    - **`WindowOpen`**: advance; auto-finalize on exit (or timeout).

use crosswalk_types::{Choice, DecisionRecord, EncounterPhase, Resolution, Signal};
use tracing::{debug, info};

use crate::clock::TimeSource;
use crate::config::{AutoDecisionPolicy, ScenarioConfig, SimulationConfig, SpeedConfig};
use crate::encounter::Encounter;
use crate::events::SequenceEvent;
use crate::vehicle::Vehicle;

/// Speed multiplier outside decision windows.
const NOMINAL_SPEED_SCALE: f64 = 1.0;

/// Errors that can occur when building a sequence.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    /// No encounters were configured.
    #[error("a sequence needs at least one encounter")]
    Empty,

    /// More encounters than can be numbered.
    #[error("too many encounters: {count}")]
    TooManyEncounters {
        /// The number of encounters that were configured.
        count: usize,
    },
}

/// Drives a chain of encounters over time.
#[derive(Debug)]
pub struct SequenceController<T: TimeSource> {
    /// Every encounter, pre-allocated in play order.
    encounters: Vec<Encounter>,

    /// Index of the live encounter; `encounters.len()` once complete.
    active: usize,

    /// Whether the live encounter is waiting for input.
    window_open: bool,

    /// The player's choice for the live encounter.
    pending: Signal,

    /// The player's vehicle.
    vehicle: Vehicle,

    /// Speed model parameters.
    speed: SpeedConfig,

    /// Current speed multiplier.
    speed_scale: f64,

    /// Total distance travelled.
    distance: f64,

    /// Road scroll offset.
    road_offset: f64,

    /// How far past its band a finalized encounter keeps drifting.
    exit_margin: f64,

    /// When unanswered windows resolve.
    policy: AutoDecisionPolicy,

    /// Indices of finalized encounters still drifting out of view, oldest
    /// first.
    retiring: Vec<usize>,

    /// Append-only decision log.
    history: Vec<DecisionRecord>,

    /// Transitions not yet drained by the caller.
    events: Vec<SequenceEvent>,

    /// Wall-clock source for activation delays.
    time: T,
}

impl<T: TimeSource> SequenceController<T> {
    /// Build a controller for the configured (or built-in) scenarios.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError`] if the scenario list cannot be numbered.
    pub fn new(config: &SimulationConfig, time: T) -> Result<Self, SequenceError> {
        Self::from_scenarios(config, &config.effective_scenarios(), time)
    }

    /// Build a controller for an explicit scenario list.
    ///
    /// The first encounter is activated immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Empty`] for an empty list, or
    /// [`SequenceError::TooManyEncounters`] if the list cannot be numbered
    /// with `u32`.
    pub fn from_scenarios(
        config: &SimulationConfig,
        scenarios: &[ScenarioConfig],
        time: T,
    ) -> Result<Self, SequenceError> {
        if scenarios.is_empty() {
            return Err(SequenceError::Empty);
        }
        let too_many = || SequenceError::TooManyEncounters {
            count: scenarios.len(),
        };
        // Reserve u32::MAX for the "complete" active number.
        let _ = u32::try_from(scenarios.len())
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(too_many)?;

        let mut encounters = Vec::with_capacity(scenarios.len());
        let mut number: u32 = 0;
        for scenario in scenarios {
            number = number.checked_add(1).ok_or_else(too_many)?;
            let default_position = if number == 1 {
                config.sequence.first_initial_position
            } else {
                config.sequence.initial_position
            };
            encounters.push(Encounter::new(
                number,
                scenario,
                scenario.initial_position.unwrap_or(default_position),
                scenario.trigger_extent.unwrap_or(config.road.viewport_extent),
                scenario
                    .activation_delay_ms
                    .unwrap_or(config.sequence.activation_delay_ms),
            ));
        }

        let mut controller = Self {
            encounters,
            active: 0,
            window_open: false,
            pending: Signal::None,
            vehicle: Vehicle::new(&config.vehicle, &config.road),
            speed: config.speed.clone(),
            speed_scale: NOMINAL_SPEED_SCALE,
            distance: 0.0,
            road_offset: 0.0,
            exit_margin: config.road.exit_margin,
            policy: config.sequence.auto_decision,
            retiring: Vec::new(),
            history: Vec::new(),
            events: Vec::new(),
            time,
        };
        controller.activate_active();
        Ok(controller)
    }

    /// Advance the simulation by `tick_scale` nominal frames.
    ///
    /// Negative or non-finite scales are treated as 0.
    pub fn tick(&mut self, tick_scale: f64) {
        let scale = sanitize_tick_scale(tick_scale);

        self.vehicle.update(scale);
        let travel = self.effective_speed() * scale;
        self.distance += travel;
        self.road_offset += travel;
        self.drift_retiring(travel);

        let Some(phase) = self.current_encounter().map(Encounter::phase) else {
            return;
        };
        let now = self.time.now_ms();
        match phase {
            EncounterPhase::Dormant => {
                if self.previous_delay_elapsed(now) {
                    self.activate_active();
                }
            }
            EncounterPhase::Approaching => self.approach(travel, now),
            EncounterPhase::WindowOpen => self.await_decision(travel, now),
            EncounterPhase::Finalized => {}
        }
    }

    /// Record the player's choice for the live encounter.
    ///
    /// Accepted only while a window is open for an encounter that has no
    /// record yet; anything else is a no-op returning `None`.
    pub fn submit_decision(&mut self, choice: Choice) -> Option<DecisionRecord> {
        if !self.window_open {
            debug!(choice = %choice, "Decision dropped: no window open");
            return None;
        }
        let decidable = self.current_encounter().is_some_and(|encounter| {
            !encounter.is_finalized() && !self.has_record(encounter.number())
        });
        if !decidable {
            debug!(choice = %choice, "Decision dropped: encounter already decided");
            return None;
        }

        self.pending = Signal::from(choice);
        self.vehicle.steer(choice);
        let now = self.time.now_ms();
        self.finalize_active(choice, Resolution::Explicit, now)
    }

    /// Steer toward `choice` outside a decision window.
    ///
    /// Returns `false` (and does nothing) while a window is open, since
    /// directional input then means a decision.
    pub fn request_lane_change(&mut self, choice: Choice) -> bool {
        if self.window_open {
            return false;
        }
        self.vehicle.steer(choice);
        debug!(target_lane = choice.lane().index(), "Lane change requested");
        true
    }

    /// Return the live encounter, or `None` once the sequence is complete.
    pub fn current_encounter(&self) -> Option<&Encounter> {
        self.encounters.get(self.active)
    }

    /// Return the finalized encounters still drifting out of view, oldest
    /// first.
    pub fn retiring(&self) -> impl Iterator<Item = &Encounter> + '_ {
        self.retiring
            .iter()
            .filter_map(|&idx| self.encounters.get(idx))
    }

    /// Return every encounter in play order.
    pub fn encounters(&self) -> &[Encounter] {
        &self.encounters
    }

    /// Return the number of configured encounters.
    pub fn encounter_count(&self) -> u32 {
        u32::try_from(self.encounters.len()).unwrap_or(u32::MAX)
    }

    /// Return the 1-based number of the live encounter
    /// (`encounter_count() + 1` once complete).
    pub fn active_number(&self) -> u32 {
        u32::try_from(self.active).map_or(u32::MAX, |n| n.saturating_add(1))
    }

    /// Whether the live encounter is waiting for input.
    pub const fn window_open(&self) -> bool {
        self.window_open
    }

    /// Return the player's choice for the live encounter.
    pub const fn pending(&self) -> Signal {
        self.pending
    }

    /// Return the vehicle.
    pub const fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    /// Return the current speed multiplier.
    pub const fn speed_scale(&self) -> f64 {
        self.speed_scale
    }

    /// Return the effective speed in units per nominal frame.
    pub const fn effective_speed(&self) -> f64 {
        (self.speed.base_speed * self.speed_scale).clamp(self.speed.min_speed, self.speed.max_speed)
    }

    /// Return the total distance travelled.
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Return the road scroll offset.
    pub const fn road_offset(&self) -> f64 {
        self.road_offset
    }

    /// Return the decision log in finalization order.
    pub fn history(&self) -> &[DecisionRecord] {
        &self.history
    }

    /// Whether every encounter has been finalized.
    pub fn is_complete(&self) -> bool {
        self.active >= self.encounters.len()
    }

    /// Whether the last encounter's activation delay has elapsed since the
    /// sequence completed. Gates the finish line.
    pub fn finish_released(&self) -> bool {
        if !self.is_complete() {
            return false;
        }
        let now = self.time.now_ms();
        self.encounters.last().is_some_and(|last| delay_elapsed(last, now))
    }

    /// Return the current time source reading.
    pub fn now_ms(&self) -> u64 {
        self.time.now_ms()
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<SequenceEvent> {
        std::mem::take(&mut self.events)
    }

    fn has_record(&self, number: u32) -> bool {
        self.history.iter().any(|record| record.number == number)
    }

    fn previous_delay_elapsed(&self, now: u64) -> bool {
        self.active
            .checked_sub(1)
            .and_then(|idx| self.encounters.get(idx))
            .is_none_or(|previous| delay_elapsed(previous, now))
    }

    fn activate_active(&mut self) {
        let Some(encounter) = self.encounters.get_mut(self.active) else {
            return;
        };
        if encounter.activate() {
            let number = encounter.number();
            self.pending = Signal::None;
            info!(
                number,
                position = encounter.approach_position(),
                "Encounter activated"
            );
            self.events.push(SequenceEvent::EncounterActivated { number });
        }
    }

    fn approach(&mut self, travel: f64, now: u64) {
        let lane = self.vehicle.lane();
        let Some(encounter) = self.encounters.get_mut(self.active) else {
            return;
        };
        encounter.advance(travel);
        // An encounter that overshoots the band in one tick still opens its
        // window; the exit check on the next tick then resolves it.
        if (encounter.in_trigger_band() || encounter.has_exited())
            && encounter.open_window(lane, now)
        {
            let number = encounter.number();
            self.window_open = true;
            self.speed_scale = self.speed.slow_factor;
            info!(number, lane = lane.index(), "Decision window opened");
            self.events.push(SequenceEvent::WindowOpened { number, lane });
        }
    }

    fn await_decision(&mut self, travel: f64, now: u64) {
        let policy = self.policy;
        let Some(encounter) = self.encounters.get_mut(self.active) else {
            return;
        };
        encounter.advance(travel);
        let timed_out = match policy {
            AutoDecisionPolicy::OnExit => false,
            AutoDecisionPolicy::OnWindowTimeout { timeout_ms } => encounter
                .window_open_for_ms(now)
                .is_some_and(|open_for| open_for >= timeout_ms),
        };
        if encounter.has_exited() || timed_out {
            let choice = self.vehicle.lane().as_choice();
            let _ = self.finalize_active(choice, Resolution::Auto, now);
        }
    }

    fn finalize_active(
        &mut self,
        choice: Choice,
        resolution: Resolution,
        now: u64,
    ) -> Option<DecisionRecord> {
        let fallback_lane = self.vehicle.lane();
        let encounter = self.encounters.get_mut(self.active)?;
        let number = encounter.number();
        let lane = encounter.lane_at_open().unwrap_or(fallback_lane);
        if self.history.iter().any(|record| record.number == number) || !encounter.finalize(now) {
            return None;
        }

        let record = DecisionRecord {
            number,
            lane,
            decision: choice,
        };
        self.history.push(record);
        self.window_open = false;
        self.speed_scale = NOMINAL_SPEED_SCALE;
        self.retiring.push(self.active);
        info!(
            number,
            lane = lane.index(),
            decision = %choice,
            resolution = ?resolution,
            "Decision recorded"
        );
        self.events
            .push(SequenceEvent::DecisionRecorded { record, resolution });

        self.active = self.active.saturating_add(1);
        if self.is_complete() {
            let decisions = u32::try_from(self.history.len()).unwrap_or(u32::MAX);
            info!(decisions, "Encounter sequence complete");
            self.events
                .push(SequenceEvent::SequenceCompleted { decisions });
        }
        Some(record)
    }

    fn drift_retiring(&mut self, travel: f64) {
        let margin = self.exit_margin;
        let encounters = &mut self.encounters;
        self.retiring.retain(|&idx| {
            encounters
                .get_mut(idx)
                .is_some_and(|encounter| encounter.drift(travel, margin))
        });
    }
}

/// Whether `encounter` finalized at least its activation delay before `now`.
fn delay_elapsed(encounter: &Encounter, now: u64) -> bool {
    encounter
        .finalized_at_ms()
        .is_some_and(|at| now.saturating_sub(at) >= encounter.activation_delay_ms())
}

/// Clamp a tick scale to a finite non-negative value.
const fn sanitize_tick_scale(tick_scale: f64) -> f64 {
    if tick_scale.is_finite() && tick_scale > 0.0 {
        tick_scale
    } else {
        0.0
    }
}
