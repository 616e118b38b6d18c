//! The finish line that ends a session.
//!
//! Sits outside the sequence controller: the session releases it once the
//! sequence is complete and the last encounter's delay has elapsed. From
//! then on it approaches at road speed until it reaches the vehicle row.

use tracing::info;

use crate::config::{FinishConfig, RoadConfig};

/// The finish line.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishLine {
    /// Position the line starts from once released.
    initial_position: f64,

    /// Approach coordinate of the vehicle.
    vehicle_row: f64,

    /// Current approach coordinate; `None` until released.
    position: Option<f64>,

    /// Whether the vehicle has crossed the line.
    reached: bool,
}

impl FinishLine {
    /// Create an unreleased finish line.
    pub fn new(finish: &FinishConfig, road: &RoadConfig) -> Self {
        Self {
            initial_position: finish.initial_position,
            vehicle_row: road.vehicle_row(),
            position: None,
            reached: false,
        }
    }

    /// Start the line moving from its initial position. Idempotent.
    pub fn release(&mut self) {
        if self.position.is_none() {
            info!(position = self.initial_position, "Finish line released");
            self.position = Some(self.initial_position);
        }
    }

    /// Move the line toward the vehicle by `delta`.
    ///
    /// Returns `true` on the call that reaches the vehicle row.
    pub fn advance(&mut self, delta: f64) -> bool {
        if self.reached {
            return false;
        }
        let Some(position) = self.position.as_mut() else {
            return false;
        };
        *position += delta;
        // Reached at the vehicle row, not when the line first comes into view.
        if *position > 0.0 && *position >= self.vehicle_row {
            self.reached = true;
            info!(position = *position, "Finish line reached");
            return true;
        }
        false
    }

    /// Return the line's approach coordinate, if released.
    pub const fn position(&self) -> Option<f64> {
        self.position
    }

    /// Whether the line has been released.
    pub const fn is_released(&self) -> bool {
        self.position.is_some()
    }

    /// Whether the vehicle has reached the line.
    pub const fn is_reached(&self) -> bool {
        self.reached
    }
}
