//! Decision input gateway.
//!
//! Normalizes key presses, swipe gestures, and taps into a single
//! [`Signal`] and routes it to the [`SequenceController`]. The gateway keeps
//! no history; each raw input is classified on its own when it arrives.
//!
//! Routing rules:
//!
//! - Window open: a left/right signal is submitted as the decision.
//! - Window closed: keys and swipes become lane-change requests (when
//!   enabled), taps are dropped.
//! - Noise (sub-threshold or near-vertical gestures) is always dropped.

use crosswalk_types::{Choice, DecisionRecord, Signal};
use tracing::debug;

use crate::clock::TimeSource;
use crate::config::InputConfig;
use crate::sequence::SequenceController;

/// A point on the touch surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    /// Horizontal coordinate, growing to the right.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// One raw input event from any device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    /// A directional key press.
    Key(Choice),

    /// A swipe gesture, as displacement from touch start to touch end.
    Swipe {
        /// Horizontal displacement; negative is leftward.
        dx: f64,
        /// Vertical displacement.
        dy: f64,
    },

    /// A tap at a point on the touch surface.
    Tap {
        /// Horizontal coordinate of the tap.
        x: f64,
        /// Vertical coordinate of the tap.
        y: f64,
    },
}

impl RawInput {
    /// Turn a touch start/end pair into a tap or a swipe.
    ///
    /// A touch that moved no more than `tap_threshold` on both axes is a tap
    /// at the release point; anything else is a swipe.
    pub const fn from_touch(start: TouchPoint, end: TouchPoint, tap_threshold: f64) -> Self {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        if dx.abs() <= tap_threshold && dy.abs() <= tap_threshold {
            Self::Tap { x: end.x, y: end.y }
        } else {
            Self::Swipe { dx, dy }
        }
    }

    /// Whether this input came from a tap.
    pub const fn is_tap(&self) -> bool {
        matches!(self, Self::Tap { .. })
    }
}

/// What the gateway did with an input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GatewayOutcome {
    /// The input was submitted as the decision and recorded.
    Decided(DecisionRecord),
    /// The input steered the vehicle outside a decision window.
    LaneChange(Choice),
    /// The input was noise, or not acceptable in the current state.
    Dropped,
}

/// Classifies raw inputs and forwards them to the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct InputGateway {
    swipe_threshold: f64,
    tap_threshold: f64,
    viewport_width: f64,
    lane_change_when_closed: bool,
}

impl InputGateway {
    /// Create a gateway from configuration.
    pub const fn new(config: &InputConfig) -> Self {
        Self {
            swipe_threshold: config.swipe_threshold,
            tap_threshold: config.tap_threshold,
            viewport_width: config.viewport_width,
            lane_change_when_closed: config.lane_change_when_closed,
        }
    }

    /// Update the touch surface width after a resize.
    ///
    /// Non-positive or non-finite widths are ignored.
    pub fn resize(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.viewport_width = width;
        } else {
            debug!(width, "Ignoring invalid viewport width");
        }
    }

    /// Return the current touch surface width.
    pub const fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    /// Return the maximum travel for a touch to count as a tap.
    pub const fn tap_threshold(&self) -> f64 {
        self.tap_threshold
    }

    /// Classify one raw input into a ternary signal.
    pub fn classify(&self, input: &RawInput) -> Signal {
        match *input {
            RawInput::Key(choice) => Signal::from(choice),
            RawInput::Swipe { dx, dy } => {
                if dx.abs() > self.swipe_threshold && dx.abs() >= dy.abs() {
                    if dx < 0.0 { Signal::Left } else { Signal::Right }
                } else {
                    Signal::None
                }
            }
            RawInput::Tap { x, .. } if !x.is_finite() => Signal::None,
            RawInput::Tap { x, .. } => {
                if x < self.viewport_width / 2.0 {
                    Signal::Left
                } else {
                    Signal::Right
                }
            }
        }
    }

    /// Classify `input` and apply it to the controller.
    pub fn route<T: TimeSource>(
        &self,
        input: &RawInput,
        controller: &mut SequenceController<T>,
    ) -> GatewayOutcome {
        let Some(choice) = self.classify(input).choice() else {
            debug!(?input, "Input discarded as noise");
            return GatewayOutcome::Dropped;
        };

        if controller.window_open() {
            return controller
                .submit_decision(choice)
                .map_or(GatewayOutcome::Dropped, GatewayOutcome::Decided);
        }

        if input.is_tap() || !self.lane_change_when_closed {
            debug!(?input, "Input dropped: no window open");
            return GatewayOutcome::Dropped;
        }
        if controller.request_lane_change(choice) {
            GatewayOutcome::LaneChange(choice)
        } else {
            GatewayOutcome::Dropped
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crosswalk_types::Lane;

    use super::*;
    use crate::clock::ManualTimeSource;
    use crate::config::SimulationConfig;

    fn make_gateway() -> InputGateway {
        InputGateway::new(&InputConfig::default())
    }

    fn make_controller() -> SequenceController<ManualTimeSource> {
        SequenceController::new(&SimulationConfig::default(), ManualTimeSource::new()).unwrap()
    }

    fn open_window(controller: &mut SequenceController<ManualTimeSource>) {
        for _ in 0..1000 {
            if controller.window_open() {
                break;
            }
            controller.tick(1.0);
        }
        assert!(controller.window_open());
    }

    #[test]
    fn swipes_need_dominant_horizontal_travel() {
        let gateway = make_gateway();
        assert_eq!(gateway.classify(&RawInput::Swipe { dx: -60.0, dy: 10.0 }), Signal::Left);
        assert_eq!(gateway.classify(&RawInput::Swipe { dx: 60.0, dy: -10.0 }), Signal::Right);
        assert_eq!(gateway.classify(&RawInput::Swipe { dx: 50.0, dy: 0.0 }), Signal::None);
        assert_eq!(gateway.classify(&RawInput::Swipe { dx: 60.0, dy: 200.0 }), Signal::None);
    }

    #[test]
    fn taps_split_by_viewport_half() {
        let mut gateway = make_gateway();
        assert_eq!(gateway.classify(&RawInput::Tap { x: 399.0, y: 0.0 }), Signal::Left);
        assert_eq!(gateway.classify(&RawInput::Tap { x: 400.0, y: 0.0 }), Signal::Right);
        gateway.resize(390.0);
        assert_eq!(gateway.classify(&RawInput::Tap { x: 200.0, y: 0.0 }), Signal::Right);
        gateway.resize(-1.0);
        assert!((gateway.viewport_width() - 390.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_coordinates_are_noise() {
        let gateway = make_gateway();
        assert_eq!(gateway.classify(&RawInput::Tap { x: f64::NAN, y: 0.0 }), Signal::None);
        assert_eq!(
            gateway.classify(&RawInput::Tap { x: f64::INFINITY, y: 0.0 }),
            Signal::None
        );
        assert_eq!(
            gateway.classify(&RawInput::Swipe { dx: f64::NAN, dy: 0.0 }),
            Signal::None
        );
        assert_eq!(
            gateway.classify(&RawInput::Swipe { dx: 80.0, dy: f64::NAN }),
            Signal::None
        );
    }

    #[test]
    fn touch_pairs_become_taps_or_swipes() {
        let start = TouchPoint { x: 100.0, y: 100.0 };
        let tap = RawInput::from_touch(start, TouchPoint { x: 120.0, y: 90.0 }, 30.0);
        assert_eq!(tap, RawInput::Tap { x: 120.0, y: 90.0 });
        let swipe = RawInput::from_touch(start, TouchPoint { x: 20.0, y: 100.0 }, 30.0);
        assert_eq!(swipe, RawInput::Swipe { dx: -80.0, dy: 0.0 });
    }

    #[test]
    fn closed_window_keys_change_lanes_and_taps_drop() {
        let gateway = make_gateway();
        let mut controller = make_controller();
        assert_eq!(
            gateway.route(&RawInput::Key(Choice::Left), &mut controller),
            GatewayOutcome::LaneChange(Choice::Left)
        );
        assert_eq!(controller.vehicle().target_lane(), Lane::Left);
        assert_eq!(
            gateway.route(&RawInput::Tap { x: 700.0, y: 0.0 }, &mut controller),
            GatewayOutcome::Dropped
        );
        assert_eq!(controller.vehicle().target_lane(), Lane::Left);
        assert!(controller.history().is_empty());
    }

    #[test]
    fn lane_changes_can_be_disabled() {
        let config = InputConfig {
            lane_change_when_closed: false,
            ..InputConfig::default()
        };
        let gateway = InputGateway::new(&config);
        let mut controller = make_controller();
        assert_eq!(
            gateway.route(&RawInput::Key(Choice::Left), &mut controller),
            GatewayOutcome::Dropped
        );
        assert_eq!(controller.vehicle().target_lane(), Lane::Right);
    }

    #[test]
    fn open_window_tap_submits_decision() {
        let gateway = make_gateway();
        let mut controller = make_controller();
        open_window(&mut controller);
        let outcome = gateway.route(&RawInput::Tap { x: 10.0, y: 300.0 }, &mut controller);
        assert!(
            matches!(outcome, GatewayOutcome::Decided(record) if record.decision == Choice::Left),
            "expected a left decision, got {outcome:?}"
        );
        assert_eq!(
            gateway.route(&RawInput::Key(Choice::Right), &mut controller),
            GatewayOutcome::LaneChange(Choice::Right),
            "window closed after the decision"
        );
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn noise_is_dropped_even_with_window_open() {
        let gateway = make_gateway();
        let mut controller = make_controller();
        open_window(&mut controller);
        assert_eq!(
            gateway.route(&RawInput::Swipe { dx: 5.0, dy: 5.0 }, &mut controller),
            GatewayOutcome::Dropped
        );
        assert!(controller.window_open());
        assert!(controller.history().is_empty());
    }
}
