//! Events emitted by the sequence controller.
//!
//! The controller queues one [`SequenceEvent`] per state transition. Callers
//! drain the queue after each frame to drive sound cues, analytics, or the
//! results page; nothing inside the core depends on the queue being read.

use crosswalk_types::{DecisionRecord, Lane, Resolution};

/// A state transition observed during a tick or a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceEvent {
    /// An encounter started approaching the vehicle.
    EncounterActivated {
        /// 1-based encounter number.
        number: u32,
    },

    /// An encounter entered its trigger band and opened a decision window.
    WindowOpened {
        /// 1-based encounter number.
        number: u32,
        /// Vehicle lane at the moment the window opened.
        lane: Lane,
    },

    /// A decision record was appended to the history.
    DecisionRecorded {
        /// The record that was written.
        record: DecisionRecord,
        /// Whether the player chose or the fallback resolved it.
        resolution: Resolution,
    },

    /// The last encounter finalized; no further encounters will activate.
    SequenceCompleted {
        /// Number of records in the history.
        decisions: u32,
    },
}

impl SequenceEvent {
    /// Return the encounter number this event concerns, if any.
    pub const fn number(&self) -> Option<u32> {
        match self {
            Self::EncounterActivated { number } | Self::WindowOpened { number, .. } => {
                Some(*number)
            }
            Self::DecisionRecorded { record, .. } => Some(record.number),
            Self::SequenceCompleted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crosswalk_types::Choice;

    use super::*;

    #[test]
    fn number_is_extracted_from_each_variant() {
        assert_eq!(SequenceEvent::EncounterActivated { number: 2 }.number(), Some(2));
        assert_eq!(
            SequenceEvent::WindowOpened {
                number: 3,
                lane: Lane::Left
            }
            .number(),
            Some(3)
        );
        let record = DecisionRecord {
            number: 4,
            lane: Lane::Right,
            decision: Choice::Left,
        };
        assert_eq!(
            SequenceEvent::DecisionRecorded {
                record,
                resolution: Resolution::Explicit
            }
            .number(),
            Some(4)
        );
        assert_eq!(SequenceEvent::SequenceCompleted { decisions: 6 }.number(), None);
    }
}
