//! One play-through: clock, controller, and finish line behind a single
//! per-frame entry point.
//!
//! [`Session::advance_frame`] is what a host loop calls once per rendering
//! callback (a browser animation frame, a tokio interval, or a test loop).
//! It is the only place the frame clock is read, so the controller itself
//! never depends on any scheduling primitive.

use crosswalk_types::{DecisionRecord, RenderSnapshot, SessionId};
use tracing::{debug, info};

use crate::clock::{ClockError, FrameClock, TimeSource};
use crate::config::SimulationConfig;
use crate::encounter::Encounter;
use crate::events::SequenceEvent;
use crate::finish::FinishLine;
use crate::gateway::{GatewayOutcome, InputGateway, RawInput};
use crate::sequence::{SequenceController, SequenceError};

/// Errors that can occur when building a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The frame clock configuration is invalid.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The encounter sequence could not be built.
    #[error("sequence error: {source}")]
    Sequence {
        /// The underlying sequence error.
        #[from]
        source: SequenceError,
    },
}

/// What happened during one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// 1-based frame counter.
    pub frame: u64,
    /// Tick scale derived from the frame timestamp.
    pub tick_scale: f64,
    /// Controller transitions during this frame.
    pub events: Vec<SequenceEvent>,
    /// Whether the vehicle reached the finish line on this frame.
    pub finish_reached: bool,
}

/// A single run of the encounter sequence.
#[derive(Debug)]
pub struct Session<T: TimeSource> {
    id: SessionId,
    clock: FrameClock,
    controller: SequenceController<T>,
    finish: FinishLine,
    vehicle_row: f64,
    frames: u64,
    finished: bool,
}

impl<T: TimeSource> Session<T> {
    /// Build a session from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the clock or the sequence cannot be
    /// built.
    pub fn new(config: &SimulationConfig, time: T) -> Result<Self, SessionError> {
        let clock = FrameClock::new(&config.clock)?;
        let controller = SequenceController::new(config, time)?;
        let id = SessionId::new();
        info!(
            session_id = %id,
            encounters = controller.encounter_count(),
            "Session created"
        );
        Ok(Self {
            id,
            clock,
            controller,
            finish: FinishLine::new(&config.finish, &config.road),
            vehicle_row: config.road.vehicle_row(),
            frames: 0,
            finished: false,
        })
    }

    /// Advance one frame stamped `timestamp_ms` by the host.
    ///
    /// Once the finish line is reached every later frame is a no-op.
    pub fn advance_frame(&mut self, timestamp_ms: f64) -> FrameReport {
        if self.finished {
            return FrameReport {
                frame: self.frames,
                tick_scale: 0.0,
                events: Vec::new(),
                finish_reached: false,
            };
        }

        let tick_scale = self.clock.advance(timestamp_ms);
        self.controller.tick(tick_scale);

        if self.controller.finish_released() {
            self.finish.release();
        }
        let finish_reached = self
            .finish
            .advance(self.controller.effective_speed() * tick_scale);
        if finish_reached {
            self.finished = true;
            info!(
                session_id = %self.id,
                decisions = self.controller.history().len(),
                distance = self.controller.distance(),
                "Session finished"
            );
        }

        self.frames = self.frames.saturating_add(1);
        FrameReport {
            frame: self.frames,
            tick_scale,
            events: self.controller.drain_events(),
            finish_reached,
        }
    }

    /// Classify a raw input and apply it. Inputs after the finish are
    /// dropped.
    pub fn handle_input(&mut self, gateway: &InputGateway, input: &RawInput) -> GatewayOutcome {
        if self.finished {
            debug!(?input, "Input dropped: session finished");
            return GatewayOutcome::Dropped;
        }
        gateway.route(input, &mut self.controller)
    }

    /// Forget the previous frame timestamp, e.g. after the host was
    /// suspended.
    pub const fn resume(&mut self) {
        self.clock.reset();
    }

    /// Build the read-only view for the presentation layer.
    pub fn snapshot(&self) -> RenderSnapshot {
        let controller = &self.controller;
        let vehicle = controller.vehicle();
        RenderSnapshot {
            session_id: self.id,
            active_number: controller.active_number(),
            encounter_count: controller.encounter_count(),
            sequence_complete: controller.is_complete(),
            window_open: controller.window_open(),
            pending: controller.pending(),
            encounter: controller.current_encounter().map(Encounter::view),
            retiring: controller.retiring().map(Encounter::view).collect(),
            vehicle_lane: vehicle.lane(),
            target_lane: vehicle.target_lane(),
            vehicle_lateral: vehicle.lateral(),
            vehicle_row: self.vehicle_row,
            speed_scale: controller.speed_scale(),
            speed: if self.finished {
                0.0
            } else {
                controller.effective_speed()
            },
            distance: controller.distance(),
            road_offset: controller.road_offset(),
            finish_position: self.finish.position(),
            finished: self.finished,
            decisions_recorded: u32::try_from(controller.history().len()).unwrap_or(u32::MAX),
        }
    }

    /// Return the session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Return the number of frames advanced.
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Whether the vehicle reached the finish line.
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Return the decision log.
    pub fn history(&self) -> &[DecisionRecord] {
        self.controller.history()
    }

    /// Return the sequence controller.
    pub const fn controller(&self) -> &SequenceController<T> {
        &self.controller
    }

    /// Return the finish line.
    pub const fn finish(&self) -> &FinishLine {
        &self.finish
    }
}
