//! Enumeration types for the Crosswalk dilemma simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Lanes
// ---------------------------------------------------------------------------

/// One of the two lanes of the road.
///
/// Serialized as the integer `0` (left) or `1` (right), which is the lane
/// encoding of the exported decision log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Lane {
    /// The left lane (index 0).
    Left,
    /// The right lane (index 1).
    Right,
}

impl Lane {
    /// Return the integer index of this lane (0 = left, 1 = right).
    pub const fn index(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    /// Return the lane a vehicle occupying this lane would "choose" if it
    /// simply held its course.
    pub const fn as_choice(self) -> Choice {
        match self {
            Self::Left => Choice::Left,
            Self::Right => Choice::Right,
        }
    }
}

impl From<Lane> for u8 {
    fn from(lane: Lane) -> Self {
        lane.index()
    }
}

impl TryFrom<u8> for Lane {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Left),
            1 => Ok(Self::Right),
            other => Err(format!("invalid lane index {other}: expected 0 or 1")),
        }
    }
}

// ---------------------------------------------------------------------------
// Choices and signals
// ---------------------------------------------------------------------------

/// The outcome of an encounter: which side of the crosswalk the vehicle
/// steers toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Choice {
    /// Steer into the left lane.
    Left,
    /// Steer into the right lane.
    Right,
}

impl Choice {
    /// Return the lane this choice steers the vehicle into.
    pub const fn lane(self) -> Lane {
        match self {
            Self::Left => Lane::Left,
            Self::Right => Lane::Right,
        }
    }

    /// Return the lowercase wire name of this choice.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl core::fmt::Display for Choice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ternary directional signal produced by the input gateway and held as
/// the pending outcome of the active encounter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Signal {
    /// A leftward choice.
    Left,
    /// A rightward choice.
    Right,
    /// No choice.
    #[default]
    None,
}

impl Signal {
    /// Return the directional choice carried by this signal, if any.
    pub const fn choice(self) -> Option<Choice> {
        match self {
            Self::Left => Some(Choice::Left),
            Self::Right => Some(Choice::Right),
            Self::None => None,
        }
    }
}

impl From<Choice> for Signal {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::Left => Self::Left,
            Choice::Right => Self::Right,
        }
    }
}

// ---------------------------------------------------------------------------
// Encounter lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle phase of a single encounter.
///
/// Recording a decision and finalizing happen in one step, so there is no
/// separate "decided" phase: an encounter goes straight from
/// [`WindowOpen`](Self::WindowOpen) (or [`Approaching`](Self::Approaching))
/// to [`Finalized`](Self::Finalized).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EncounterPhase {
    /// Pre-allocated, not yet moving.
    #[default]
    Dormant,
    /// Moving toward the vehicle, outside the trigger band.
    Approaching,
    /// Inside the trigger band, awaiting a decision.
    WindowOpen,
    /// A decision record has been written. Terminal.
    Finalized,
}

impl EncounterPhase {
    /// Whether the encounter's position advances each tick.
    pub const fn is_moving(self) -> bool {
        matches!(self, Self::Approaching | Self::WindowOpen)
    }
}

/// How a decision record came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Resolution {
    /// The player submitted a choice while the window was open.
    Explicit,
    /// The player never answered; the engine derived the choice from the
    /// lane the vehicle occupied.
    Auto,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn lane_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Lane::Left).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Lane::Right).unwrap(), "1");
        let lane: Lane = serde_json::from_str("1").unwrap();
        assert_eq!(lane, Lane::Right);
    }

    #[test]
    fn lane_rejects_out_of_range_index() {
        let result: Result<Lane, _> = serde_json::from_str("2");
        assert!(result.is_err());
    }

    #[test]
    fn choice_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Choice::Left).unwrap(), "\"left\"");
        assert_eq!(serde_json::to_string(&Choice::Right).unwrap(), "\"right\"");
        assert_eq!(Choice::Right.to_string(), "right");
    }

    #[test]
    fn choice_and_lane_agree() {
        assert_eq!(Choice::Left.lane(), Lane::Left);
        assert_eq!(Choice::Right.lane(), Lane::Right);
        assert_eq!(Lane::Left.as_choice(), Choice::Left);
        assert_eq!(Lane::Right.as_choice(), Choice::Right);
    }

    #[test]
    fn signal_carries_choice() {
        assert_eq!(Signal::Left.choice(), Some(Choice::Left));
        assert_eq!(Signal::None.choice(), None);
        assert_eq!(Signal::from(Choice::Right), Signal::Right);
        assert_eq!(Signal::default(), Signal::None);
    }

    #[test]
    fn only_approaching_and_open_phases_move() {
        assert!(!EncounterPhase::Dormant.is_moving());
        assert!(EncounterPhase::Approaching.is_moving());
        assert!(EncounterPhase::WindowOpen.is_moving());
        assert!(!EncounterPhase::Finalized.is_moving());
    }
}
