//! Player sources that produce raw input for headless runs.
//!
//! In a browser the player is a human pressing keys; everywhere else a
//! [`PlayerSource`] stands in. The runner polls it once per frame with the
//! current snapshot and feeds whatever it returns through the gateway.

use std::collections::BTreeMap;

use crosswalk_types::{Choice, RenderSnapshot};

use crate::gateway::RawInput;

/// A source of player input.
pub trait PlayerSource: Send {
    /// Return the inputs the player produces on this frame.
    fn poll(&mut self, snapshot: &RenderSnapshot) -> Vec<RawInput>;
}

/// A player that never responds. Every encounter auto-resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdlePlayer;

impl IdlePlayer {
    /// Create a new idle player.
    pub const fn new() -> Self {
        Self
    }
}

impl PlayerSource for IdlePlayer {
    fn poll(&mut self, _snapshot: &RenderSnapshot) -> Vec<RawInput> {
        Vec::new()
    }
}

/// A player that answers each encounter with a predetermined choice after
/// a fixed reaction time.
///
/// Encounters without a scripted choice are left to auto-resolve.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPlayer {
    /// Choice per 1-based encounter number.
    choices: BTreeMap<u32, Choice>,

    /// Frames the window must be open before the player answers.
    reaction_frames: u64,

    /// Encounter currently being watched and frames seen with its window
    /// open.
    watching: Option<(u32, u64)>,
}

impl ScriptedPlayer {
    /// Create a player from `(encounter number, choice)` pairs.
    pub fn new(choices: impl IntoIterator<Item = (u32, Choice)>, reaction_frames: u64) -> Self {
        Self {
            choices: choices.into_iter().collect(),
            reaction_frames,
            watching: None,
        }
    }

    /// Create a player that answers encounters 1, 2, ... in order.
    pub fn in_order(choices: &[Choice], reaction_frames: u64) -> Self {
        Self::new((1_u32..).zip(choices.iter().copied()), reaction_frames)
    }

    /// Return the scripted choice for an encounter, if any.
    pub fn choice_for(&self, number: u32) -> Option<Choice> {
        self.choices.get(&number).copied()
    }
}

impl PlayerSource for ScriptedPlayer {
    fn poll(&mut self, snapshot: &RenderSnapshot) -> Vec<RawInput> {
        if !snapshot.window_open {
            self.watching = None;
            return Vec::new();
        }
        let number = snapshot.active_number;
        let seen = match self.watching {
            Some((watched, seen)) if watched == number => seen.saturating_add(1),
            _ => 1,
        };
        self.watching = Some((number, seen));

        match self.choice_for(number) {
            Some(choice) if seen > self.reaction_frames => vec![RawInput::Key(choice)],
            _ => Vec::new(),
        }
    }
}
