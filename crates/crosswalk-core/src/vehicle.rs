//! The vehicle: a discrete lane plus an eased lateral position.
//!
//! The controller only ever reasons about the discrete lane. The lateral
//! offset exists so the presentation layer can draw a smooth lane change;
//! the discrete lane flips only once the vehicle has arrived.

use crosswalk_types::{Choice, Lane};

use crate::config::{RoadConfig, VehicleConfig};

/// Distance from the lane centre at which the vehicle snaps into the lane.
const ARRIVAL_TOLERANCE: f64 = 1.0;

/// The player's vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// Lane the vehicle currently occupies.
    lane: Lane,

    /// Lane the vehicle is steering toward.
    target_lane: Lane,

    /// Offset from the left edge of the road.
    lateral: f64,

    /// Width of one lane.
    lane_width: f64,

    /// Lateral units per nominal frame.
    lane_change_speed: f64,
}

impl Vehicle {
    /// Create a vehicle centred in its initial lane.
    pub fn new(vehicle: &VehicleConfig, road: &RoadConfig) -> Self {
        let lane = vehicle.initial_lane;
        Self {
            lane,
            target_lane: lane,
            lateral: lane_centre(lane, road.lane_width),
            lane_width: road.lane_width,
            lane_change_speed: vehicle.lane_change_speed,
        }
    }

    /// Return the lane the vehicle occupies.
    pub const fn lane(&self) -> Lane {
        self.lane
    }

    /// Return the lane the vehicle is steering toward.
    pub const fn target_lane(&self) -> Lane {
        self.target_lane
    }

    /// Return the offset from the left edge of the road.
    pub const fn lateral(&self) -> f64 {
        self.lateral
    }

    /// Whether the vehicle is between lanes.
    pub fn is_changing_lanes(&self) -> bool {
        self.lane != self.target_lane
    }

    /// Steer toward the lane for `choice`.
    pub const fn steer(&mut self, choice: Choice) {
        self.target_lane = choice.lane();
    }

    /// Ease toward the target lane centre without overshooting.
    pub const fn update(&mut self, tick_scale: f64) {
        let target = lane_centre(self.target_lane, self.lane_width);
        let gap = target - self.lateral;
        if gap.abs() <= ARRIVAL_TOLERANCE {
            self.lateral = target;
            self.lane = self.target_lane;
            return;
        }
        let step = (self.lane_change_speed * tick_scale).min(gap.abs());
        self.lateral += step.copysign(gap);
        if (target - self.lateral).abs() <= ARRIVAL_TOLERANCE {
            self.lateral = target;
            self.lane = self.target_lane;
        }
    }
}

/// Lateral coordinate of a lane's centre line.
const fn lane_centre(lane: Lane, lane_width: f64) -> f64 {
    match lane {
        Lane::Left => lane_width * 0.5,
        Lane::Right => lane_width * 1.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_vehicle() -> Vehicle {
        Vehicle::new(&VehicleConfig::default(), &RoadConfig::default())
    }

    #[test]
    fn starts_centred_in_right_lane() {
        let v = make_vehicle();
        assert_eq!(v.lane(), Lane::Right);
        assert_eq!(v.target_lane(), Lane::Right);
        assert!((v.lateral() - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn lane_flips_only_on_arrival() {
        let mut v = make_vehicle();
        v.steer(Choice::Left);
        assert!(v.is_changing_lanes());

        // 100 units at 3 per nominal frame: 33 frames leaves the vehicle
        // just short of the left lane.
        for _ in 0..32 {
            v.update(1.0);
        }
        assert_eq!(v.lane(), Lane::Right);

        for _ in 0..2 {
            v.update(1.0);
        }
        assert_eq!(v.lane(), Lane::Left);
        assert!((v.lateral() - 50.0).abs() < f64::EPSILON);
        assert!(!v.is_changing_lanes());
    }

    #[test]
    fn large_tick_scale_does_not_overshoot() {
        let mut v = make_vehicle();
        v.steer(Choice::Left);
        v.update(1000.0);
        assert_eq!(v.lane(), Lane::Left);
        assert!((v.lateral() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_tick_scale_does_not_move() {
        let mut v = make_vehicle();
        v.steer(Choice::Left);
        v.update(0.0);
        assert!((v.lateral() - 150.0).abs() < f64::EPSILON);
        assert_eq!(v.lane(), Lane::Right);
    }

    #[test]
    fn steering_back_mid_change_returns_to_origin() {
        let mut v = make_vehicle();
        v.steer(Choice::Left);
        for _ in 0..10 {
            v.update(1.0);
        }
        v.steer(Choice::Right);
        for _ in 0..20 {
            v.update(1.0);
        }
        assert_eq!(v.lane(), Lane::Right);
        assert!((v.lateral() - 150.0).abs() < f64::EPSILON);
    }
}
