//! A single crosswalk encounter and its lifecycle.
//!
//! Every encounter is driven by the same code; what distinguishes one
//! crosswalk from another is only its [`ScenarioConfig`] (groups, delay,
//! trigger band, starting position).
//!
//! ```text
//! Dormant --activate--> Approaching --enters band--> WindowOpen
//!                            |                           |
//!                            +------- finalize ----------+--> Finalized
//! ```
//!
//! Transitions are one-way. Methods that would move backwards, or act on
//! the wrong phase, return `false` and leave the encounter unchanged.

use crosswalk_types::{
    CharacterGroup, EncounterPhase, EncounterView, Lane, ReferenceSplit,
};

use crate::config::ScenarioConfig;

/// One crosswalk in the sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Encounter {
    /// 1-based ordinal position in the sequence. Immutable.
    number: u32,

    /// Short title of the dilemma.
    title: String,

    /// Group on the left side.
    left: CharacterGroup,

    /// Group on the right side.
    right: CharacterGroup,

    /// Reference population split, if known.
    reference: Option<ReferenceSplit>,

    /// Distance-to-player coordinate. Negative while out of view.
    approach_position: f64,

    /// Upper bound of the trigger band `[0, trigger_extent)`.
    trigger_extent: f64,

    /// Gap after this encounter finalizes before the next one activates.
    activation_delay_ms: u64,

    /// Current lifecycle phase.
    phase: EncounterPhase,

    /// Set once the position enters the trigger band. One-way.
    triggered: bool,

    /// Vehicle lane captured when the window opened.
    lane_at_open: Option<Lane>,

    /// Time source reading when the window opened.
    window_opened_at_ms: Option<u64>,

    /// Time source reading when the encounter finalized.
    finalized_at_ms: Option<u64>,
}

impl Encounter {
    /// Create a dormant encounter.
    pub fn new(
        number: u32,
        scenario: &ScenarioConfig,
        initial_position: f64,
        trigger_extent: f64,
        activation_delay_ms: u64,
    ) -> Self {
        Self {
            number,
            title: scenario.title.clone(),
            left: scenario.left.clone(),
            right: scenario.right.clone(),
            reference: scenario.reference,
            approach_position: initial_position,
            trigger_extent,
            activation_delay_ms,
            phase: EncounterPhase::Dormant,
            triggered: false,
            lane_at_open: None,
            window_opened_at_ms: None,
            finalized_at_ms: None,
        }
    }

    /// Return the 1-based encounter number.
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Return the scenario title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Return the left-side group.
    pub const fn left(&self) -> &CharacterGroup {
        &self.left
    }

    /// Return the right-side group.
    pub const fn right(&self) -> &CharacterGroup {
        &self.right
    }

    /// Return the reference population split, if any.
    pub const fn reference(&self) -> Option<ReferenceSplit> {
        self.reference
    }

    /// Return the current approach position.
    pub const fn approach_position(&self) -> f64 {
        self.approach_position
    }

    /// Return the upper bound of the trigger band.
    pub const fn trigger_extent(&self) -> f64 {
        self.trigger_extent
    }

    /// Return the delay before the next encounter activates.
    pub const fn activation_delay_ms(&self) -> u64 {
        self.activation_delay_ms
    }

    /// Return the current lifecycle phase.
    pub const fn phase(&self) -> EncounterPhase {
        self.phase
    }

    /// Whether the encounter has entered the trigger band.
    pub const fn triggered(&self) -> bool {
        self.triggered
    }

    /// Whether a decision record has been written for this encounter.
    pub const fn is_finalized(&self) -> bool {
        matches!(self.phase, EncounterPhase::Finalized)
    }

    /// Return the vehicle lane captured when the window opened.
    pub const fn lane_at_open(&self) -> Option<Lane> {
        self.lane_at_open
    }

    /// Return when the encounter finalized.
    pub const fn finalized_at_ms(&self) -> Option<u64> {
        self.finalized_at_ms
    }

    /// Whether the position lies in the trigger band `[0, trigger_extent)`.
    pub const fn in_trigger_band(&self) -> bool {
        self.approach_position >= 0.0 && self.approach_position < self.trigger_extent
    }

    /// Whether the position has crossed the far edge of the band.
    pub const fn has_exited(&self) -> bool {
        self.approach_position >= self.trigger_extent
    }

    /// Return how long the window has been open at `now_ms`.
    pub fn window_open_for_ms(&self, now_ms: u64) -> Option<u64> {
        match self.phase {
            EncounterPhase::WindowOpen => self
                .window_opened_at_ms
                .map(|opened| now_ms.saturating_sub(opened)),
            _ => None,
        }
    }

    /// Dormant -> Approaching.
    pub const fn activate(&mut self) -> bool {
        if matches!(self.phase, EncounterPhase::Dormant) {
            self.phase = EncounterPhase::Approaching;
            true
        } else {
            false
        }
    }

    /// Move toward the vehicle by `delta`. Only moving phases advance.
    pub const fn advance(&mut self, delta: f64) {
        if self.phase.is_moving() {
            self.approach_position += delta;
        }
    }

    /// Drift a finalized encounter with the road until it is `margin` past
    /// the far edge. Returns `true` while it is still in view.
    pub const fn drift(&mut self, delta: f64, margin: f64) -> bool {
        if !self.is_finalized() {
            return false;
        }
        let limit = self.trigger_extent + margin;
        if self.approach_position >= limit {
            return false;
        }
        self.approach_position += delta;
        self.approach_position < limit
    }

    /// Approaching -> `WindowOpen`, capturing the vehicle lane.
    pub const fn open_window(&mut self, lane: Lane, now_ms: u64) -> bool {
        if !matches!(self.phase, EncounterPhase::Approaching) {
            return false;
        }
        self.phase = EncounterPhase::WindowOpen;
        self.triggered = true;
        self.lane_at_open = Some(lane);
        self.window_opened_at_ms = Some(now_ms);
        true
    }

    /// Approaching or `WindowOpen` -> Finalized. Idempotent.
    pub const fn finalize(&mut self, now_ms: u64) -> bool {
        if !self.phase.is_moving() {
            return false;
        }
        self.phase = EncounterPhase::Finalized;
        self.finalized_at_ms = Some(now_ms);
        true
    }

    /// Build the read-only view handed to the presentation layer.
    pub fn view(&self) -> EncounterView {
        EncounterView {
            number: self.number,
            title: self.title.clone(),
            phase: self.phase,
            approach_position: self.approach_position,
            triggered: self.triggered,
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::scenario::default_catalog;

    fn make_encounter(initial_position: f64) -> Encounter {
        let scenario = default_catalog().into_iter().next().unwrap();
        Encounter::new(1, &scenario, initial_position, 800.0, 3000)
    }

    #[test]
    fn starts_dormant_and_does_not_move() {
        let mut e = make_encounter(-800.0);
        assert_eq!(e.phase(), EncounterPhase::Dormant);
        e.advance(100.0);
        assert!((e.approach_position() - -800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn activation_is_one_way() {
        let mut e = make_encounter(-800.0);
        assert!(e.activate());
        assert!(!e.activate());
        assert_eq!(e.phase(), EncounterPhase::Approaching);
    }

    #[test]
    fn trigger_band_is_half_open() {
        let mut e = make_encounter(-1.0);
        assert!(e.activate());
        assert!(!e.in_trigger_band());
        e.advance(1.0);
        assert!(e.in_trigger_band());
        e.advance(799.0);
        assert!(!e.in_trigger_band());
        assert!(e.has_exited());
    }

    #[test]
    fn open_window_captures_lane_and_time() {
        let mut e = make_encounter(0.0);
        assert!(!e.open_window(Lane::Left, 5), "dormant encounter cannot open");
        assert!(e.activate());
        assert!(e.open_window(Lane::Left, 5));
        assert!(e.triggered());
        assert_eq!(e.lane_at_open(), Some(Lane::Left));
        assert_eq!(e.window_open_for_ms(105), Some(100));
        assert!(!e.open_window(Lane::Right, 10), "window opens only once");
        assert_eq!(e.lane_at_open(), Some(Lane::Left));
    }

    #[test]
    fn finalize_is_idempotent_and_terminal() {
        let mut e = make_encounter(0.0);
        assert!(e.activate());
        assert!(e.finalize(42));
        assert!(!e.finalize(99));
        assert_eq!(e.finalized_at_ms(), Some(42));
        assert!(!e.activate());
        assert!(!e.open_window(Lane::Left, 100));
        assert_eq!(e.window_open_for_ms(100), None);
    }

    #[test]
    fn finalized_encounter_ignores_advance_but_drifts() {
        let mut e = make_encounter(790.0);
        assert!(e.activate());
        assert!(e.finalize(0));
        e.advance(5.0);
        assert!((e.approach_position() - 790.0).abs() < f64::EPSILON);
        assert!(e.drift(20.0, 50.0));
        assert!((e.approach_position() - 810.0).abs() < f64::EPSILON);
        assert!(!e.drift(40.0, 50.0));
        assert!(!e.drift(40.0, 50.0));
        assert!((e.approach_position() - 850.0).abs() < f64::EPSILON);
    }

    #[test]
    fn view_reflects_state() {
        let mut e = make_encounter(-100.0);
        assert!(e.activate());
        let view = e.view();
        assert_eq!(view.number, 1);
        assert_eq!(view.phase, EncounterPhase::Approaching);
        assert!(!view.triggered);
        assert_eq!(view.left, *e.left());
    }
}
