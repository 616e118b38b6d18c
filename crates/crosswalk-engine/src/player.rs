//! Player selection and the seeded random player.

use std::str::FromStr;

use crosswalk_core::gateway::RawInput;
use crosswalk_core::player::{IdlePlayer, PlayerSource, ScriptedPlayer};
use crosswalk_types::{Choice, RenderSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::EngineError;

/// Frames a scripted player waits before answering (half a second at 60 fps).
const SCRIPTED_REACTION_FRAMES: u64 = 30;

/// Longest a random player hesitates, in frames.
const MAX_RANDOM_REACTION_FRAMES: u64 = 240;

/// Which player drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    /// Never answers.
    Idle,
    /// Always answers left.
    Left,
    /// Always answers right.
    Right,
    /// Answers at random, sometimes not at all.
    Random,
}

impl FromStr for PlayerKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Ok(Self::Idle),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "random" => Ok(Self::Random),
            other => Err(EngineError::Player {
                message: format!("unknown player '{other}': expected idle, left, right or random"),
            }),
        }
    }
}

impl PlayerKind {
    /// Build the player for a sequence of `encounters` encounters.
    pub fn build(self, encounters: u32, seed: u64) -> Box<dyn PlayerSource> {
        match self {
            Self::Idle => Box::new(IdlePlayer::new()),
            Self::Left => Box::new(always(Choice::Left, encounters)),
            Self::Right => Box::new(always(Choice::Right, encounters)),
            Self::Random => Box::new(RandomPlayer::new(seed)),
        }
    }
}

fn always(choice: Choice, encounters: u32) -> ScriptedPlayer {
    ScriptedPlayer::new(
        (1..=encounters).map(|number| (number, choice)),
        SCRIPTED_REACTION_FRAMES,
    )
}

/// A player with a random reaction time and a random answer.
///
/// About one encounter in four is left unanswered so the auto-decision
/// fallback gets exercised too.
#[derive(Debug)]
pub struct RandomPlayer {
    rng: StdRng,
    /// Encounter being watched, frames until answering, and whether to
    /// answer at all.
    plan: Option<(u32, u64, bool)>,
}

impl RandomPlayer {
    /// Create a player from a seed. Equal seeds replay equal runs.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            plan: None,
        }
    }
}

impl PlayerSource for RandomPlayer {
    fn poll(&mut self, snapshot: &RenderSnapshot) -> Vec<RawInput> {
        if !snapshot.window_open {
            self.plan = None;
            return Vec::new();
        }
        let number = snapshot.active_number;
        let (remaining, answers) = match self.plan {
            Some((watched, remaining, answers)) if watched == number => (remaining, answers),
            _ => (
                self.rng.random_range(0..=MAX_RANDOM_REACTION_FRAMES),
                self.rng.random_bool(0.75),
            ),
        };
        if remaining > 0 {
            self.plan = Some((number, remaining.saturating_sub(1), answers));
            return Vec::new();
        }
        self.plan = Some((number, 0, false));
        if !answers {
            return Vec::new();
        }
        let choice = if self.rng.random_bool(0.5) {
            Choice::Left
        } else {
            Choice::Right
        };
        vec![RawInput::Key(choice)]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crosswalk_types::{Lane, SessionId, Signal};

    use super::*;

    fn snapshot(active_number: u32, window_open: bool) -> RenderSnapshot {
        RenderSnapshot {
            session_id: SessionId::new(),
            active_number,
            encounter_count: 6,
            sequence_complete: false,
            window_open,
            pending: Signal::None,
            encounter: None,
            retiring: Vec::new(),
            vehicle_lane: Lane::Right,
            target_lane: Lane::Right,
            vehicle_lateral: 150.0,
            vehicle_row: 600.0,
            speed_scale: 0.3,
            speed: 0.6,
            distance: 0.0,
            road_offset: 0.0,
            finish_position: None,
            finished: false,
            decisions_recorded: 0,
        }
    }

    fn answers(player: &mut RandomPlayer, number: u32) -> Vec<RawInput> {
        let mut inputs = Vec::new();
        for _ in 0..=MAX_RANDOM_REACTION_FRAMES {
            inputs.extend(player.poll(&snapshot(number, true)));
        }
        inputs
    }

    #[test]
    fn player_kind_parses_case_insensitively() {
        assert_eq!("Random".parse::<PlayerKind>().unwrap(), PlayerKind::Random);
        assert_eq!(" idle ".parse::<PlayerKind>().unwrap(), PlayerKind::Idle);
        assert!("sideways".parse::<PlayerKind>().is_err());
    }

    #[test]
    fn random_player_answers_at_most_once_per_encounter() {
        let mut player = RandomPlayer::new(7);
        for number in 1..=20 {
            assert!(answers(&mut player, number).len() <= 1);
        }
    }

    #[test]
    fn equal_seeds_replay_equal_answers() {
        let mut a = RandomPlayer::new(42);
        let mut b = RandomPlayer::new(42);
        for number in 1..=6 {
            assert_eq!(answers(&mut a, number), answers(&mut b, number));
        }
    }

    #[test]
    fn closed_window_produces_nothing() {
        let mut player = RandomPlayer::new(1);
        assert!(player.poll(&snapshot(1, false)).is_empty());
    }
}
