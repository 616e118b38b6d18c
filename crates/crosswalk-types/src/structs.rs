//! Core data structs shared between the engine and its collaborators.
//!
//! [`DecisionRecord`] is the exported result format and must stay stable:
//! `{"number": 1, "lane": 0, "decision": "left"}`. The remaining structs
//! are read-only views built once per frame for the presentation layer.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Choice, EncounterPhase, Lane, Signal};
use crate::ids::SessionId;

// ---------------------------------------------------------------------------
// Encounter payload
// ---------------------------------------------------------------------------

/// One side of a crosswalk dilemma: who is standing there.
///
/// Opaque to the engine; only the presentation and results layers read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CharacterGroup {
    /// Short heading, e.g. "Left side".
    pub label: String,
    /// One-line description of the group, e.g. "Elderly pedestrians".
    pub subtitle: String,
    /// Human-readable member lines, e.g. "2 elderly men".
    #[serde(default)]
    pub members: Vec<String>,
}

/// How a reference population answered the same dilemma, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReferenceSplit {
    /// Share of respondents who chose the left side.
    pub left_percent: f64,
    /// Share of respondents who chose the right side.
    pub right_percent: f64,
}

impl ReferenceSplit {
    /// Return the side the majority chose, or `None` on an exact tie.
    pub const fn majority(&self) -> Option<Choice> {
        if self.left_percent > self.right_percent {
            Some(Choice::Left)
        } else if self.right_percent > self.left_percent {
            Some(Choice::Right)
        } else {
            None
        }
    }

    /// Return the share of respondents who made the given choice.
    pub const fn share_of(&self, choice: Choice) -> f64 {
        match choice {
            Choice::Left => self.left_percent,
            Choice::Right => self.right_percent,
        }
    }
}

// ---------------------------------------------------------------------------
// Decision log
// ---------------------------------------------------------------------------

/// A finalized decision for one encounter.
///
/// Appended at most once per encounter number. `lane` is the lane the vehicle
/// occupied when the decision window opened, independent of `decision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DecisionRecord {
    /// 1-based encounter number.
    pub number: u32,
    /// Vehicle lane (0 or 1) when the decision window opened.
    #[ts(type = "number")]
    pub lane: Lane,
    /// The side the vehicle steered toward.
    pub decision: Choice,
}

// ---------------------------------------------------------------------------
// Render snapshot
// ---------------------------------------------------------------------------

/// Read-only view of one encounter for drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EncounterView {
    /// 1-based encounter number.
    pub number: u32,
    /// Scenario title.
    pub title: String,
    /// Current lifecycle phase.
    pub phase: EncounterPhase,
    /// Distance-to-player coordinate (negative while out of view).
    pub approach_position: f64,
    /// Whether the encounter has entered the trigger band at least once.
    pub triggered: bool,
    /// Group standing on the left side of the crosswalk.
    pub left: CharacterGroup,
    /// Group standing on the right side of the crosswalk.
    pub right: CharacterGroup,
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RenderSnapshot {
    /// The session this frame belongs to.
    pub session_id: SessionId,
    /// 1-based number of the live encounter; `encounter_count + 1` once the
    /// sequence is complete.
    pub active_number: u32,
    /// Total number of configured encounters.
    pub encounter_count: u32,
    /// Whether every encounter has been finalized.
    pub sequence_complete: bool,
    /// Whether the live encounter is waiting for player input.
    pub window_open: bool,
    /// The player's choice for the live encounter, if any.
    pub pending: Signal,
    /// The live encounter, if the sequence is not complete.
    pub encounter: Option<EncounterView>,
    /// Finalized encounters still drifting out of view, oldest first.
    pub retiring: Vec<EncounterView>,
    /// Discrete lane the vehicle occupies.
    #[ts(type = "number")]
    pub vehicle_lane: Lane,
    /// Lane the vehicle is steering toward.
    #[ts(type = "number")]
    pub target_lane: Lane,
    /// Lateral offset of the vehicle from the left edge of the road.
    pub vehicle_lateral: f64,
    /// Fixed approach coordinate at which the vehicle is drawn.
    pub vehicle_row: f64,
    /// Current simulation speed multiplier.
    pub speed_scale: f64,
    /// Current effective speed in units per nominal frame.
    pub speed: f64,
    /// Total distance travelled.
    pub distance: f64,
    /// Road scroll offset for lane markings.
    pub road_offset: f64,
    /// Finish-line approach coordinate once it is moving.
    pub finish_position: Option<f64>,
    /// Whether the vehicle has reached the finish line.
    pub finished: bool,
    /// Number of decision records written so far.
    pub decisions_recorded: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decision_record_wire_format_is_stable() {
        let record = DecisionRecord {
            number: 1,
            lane: Lane::Right,
            decision: Choice::Left,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"number":1,"lane":1,"decision":"left"}"#);

        let back: DecisionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn character_group_members_default_to_empty() {
        let group: CharacterGroup =
            serde_json::from_str(r#"{"label":"Left side","subtitle":"Nobody"}"#).unwrap();
        assert!(group.members.is_empty());
    }

    #[test]
    fn reference_split_majority() {
        let split = ReferenceSplit {
            left_percent: 16.0,
            right_percent: 84.0,
        };
        assert_eq!(split.majority(), Some(Choice::Right));

        let tie = ReferenceSplit {
            left_percent: 50.0,
            right_percent: 50.0,
        };
        assert_eq!(tie.majority(), None);
    }

    #[test]
    fn reference_split_share_of_choice() {
        let split = ReferenceSplit {
            left_percent: 92.5,
            right_percent: 7.5,
        };
        assert!((split.share_of(Choice::Left) - 92.5).abs() < f64::EPSILON);
        assert!((split.share_of(Choice::Right) - 7.5).abs() < f64::EPSILON);
    }
}
