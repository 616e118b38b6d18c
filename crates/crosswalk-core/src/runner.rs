//! Async frame loop for headless and server-side runs.
//!
//! [`run_session`] plays the role of the browser's animation scheduler: it
//! polls a [`PlayerSource`], routes its input through the gateway, stamps
//! each frame from a tokio [`Instant`], and sleeps one frame interval. When
//! the finish line is reached the decision log goes to the exporter.
//!
//! - **Bounded runs**: stop after `max_frames` (0 = until finished)
//! - **Best-effort export**: a failed export is logged, never fatal

use std::time::Duration;

use crosswalk_types::{DecisionRecord, RenderSnapshot};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::clock::TimeSource;
use crate::config::SimulationConfig;
use crate::export::ResultsExporter;
use crate::gateway::InputGateway;
use crate::player::PlayerSource;
use crate::session::{FrameReport, Session};

/// Errors that can occur before the loop starts.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The run bounds cannot drive a loop.
    #[error("invalid run bounds: {reason}")]
    InvalidBounds {
        /// Explanation of what is wrong with the bounds.
        reason: String,
    },
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    /// The vehicle reached the finish line.
    Finished,
    /// The frame budget ran out first.
    FrameLimitReached,
}

/// Limits for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBounds {
    /// Stop after this many frames (0 = unlimited).
    pub max_frames: u64,
    /// Sleep between frames.
    pub frame_interval: Duration,
}

impl RunBounds {
    /// Derive bounds from configuration: the nominal frame rate and the
    /// session frame budget.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let fps = config.clock.target_fps.max(1);
        Self {
            max_frames: config.session.max_frames,
            frame_interval: Duration::from_secs_f64(1.0 / f64::from(fps)),
        }
    }
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    /// Why the run stopped.
    pub end_reason: SessionEndReason,
    /// Number of frames advanced.
    pub frames: u64,
    /// The decision log at the end of the run.
    pub history: Vec<DecisionRecord>,
    /// Whether the exporter accepted the log.
    pub exported: bool,
}

/// Callback invoked after every frame.
///
/// Hosts use it to push snapshots to a renderer or websocket.
pub trait FrameCallback: Send {
    /// Called after a frame has been advanced.
    fn on_frame(&mut self, report: &FrameReport, snapshot: &RenderSnapshot);
}

/// A frame callback that does nothing.
pub struct NoOpCallback;

impl FrameCallback for NoOpCallback {
    fn on_frame(&mut self, _report: &FrameReport, _snapshot: &RenderSnapshot) {}
}

/// Run `session` until it finishes or the frame budget runs out.
///
/// # Errors
///
/// Returns [`RunnerError::InvalidBounds`] if `bounds` has a zero frame
/// interval and no frame limit, which would spin forever without yielding
/// time to the frame clock.
pub async fn run_session<T: TimeSource>(
    session: &mut Session<T>,
    gateway: &InputGateway,
    player: &mut dyn PlayerSource,
    exporter: &mut dyn ResultsExporter,
    callback: &mut dyn FrameCallback,
    bounds: &RunBounds,
) -> Result<SessionResult, RunnerError> {
    if bounds.frame_interval.is_zero() && bounds.max_frames == 0 {
        return Err(RunnerError::InvalidBounds {
            reason: "frame_interval is zero and max_frames is unlimited".to_owned(),
        });
    }

    info!(
        session_id = %session.id(),
        max_frames = bounds.max_frames,
        frame_interval_ms = bounds.frame_interval.as_secs_f64() * 1000.0,
        "Session starting"
    );

    let start = Instant::now();
    loop {
        let snapshot = session.snapshot();
        for input in player.poll(&snapshot) {
            let _ = session.handle_input(gateway, &input);
        }

        let timestamp_ms = start.elapsed().as_secs_f64() * 1000.0;
        let report = session.advance_frame(timestamp_ms);
        callback.on_frame(&report, &session.snapshot());

        if session.is_finished() {
            let exported = match exporter.export(session.history()) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Failed to export decision log, continuing");
                    false
                }
            };
            return Ok(SessionResult {
                end_reason: SessionEndReason::Finished,
                frames: session.frames(),
                history: session.history().to_vec(),
                exported,
            });
        }

        if bounds.max_frames > 0 && session.frames() >= bounds.max_frames {
            info!(
                frames = session.frames(),
                max_frames = bounds.max_frames,
                "Frame limit reached"
            );
            return Ok(SessionResult {
                end_reason: SessionEndReason::FrameLimitReached,
                frames: session.frames(),
                history: session.history().to_vec(),
                exported: false,
            });
        }

        if !bounds.frame_interval.is_zero() {
            tokio::time::sleep(bounds.frame_interval).await;
        }
    }
}

/// Log how a run ended.
pub fn log_session_end(result: &SessionResult) {
    info!(
        reason = ?result.end_reason,
        frames = result.frames,
        decisions = result.history.len(),
        exported = result.exported,
        "Session ended"
    );
    for record in &result.history {
        info!(
            number = record.number,
            lane = record.lane.index(),
            decision = %record.decision,
            "Decision"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crosswalk_types::{Choice, Lane};

    use super::*;
    use crate::clock::ManualTimeSource;
    use crate::export::{ExportError, MemoryExporter};
    use crate::player::{IdlePlayer, ScriptedPlayer};

    /// Keeps the activation-delay clock in step with the frame loop.
    struct AdvanceTime {
        time: ManualTimeSource,
        step_ms: u64,
        frames: u64,
    }

    impl FrameCallback for AdvanceTime {
        fn on_frame(&mut self, _report: &FrameReport, _snapshot: &RenderSnapshot) {
            self.time.advance_ms(self.step_ms);
            self.frames = self.frames.saturating_add(1);
        }
    }

    struct FailingExporter;

    impl ResultsExporter for FailingExporter {
        fn export(&mut self, _records: &[DecisionRecord]) -> Result<(), ExportError> {
            Err(ExportError::Io {
                source: std::io::Error::other("disk full"),
            })
        }
    }

    fn setup() -> (Session<ManualTimeSource>, InputGateway, AdvanceTime, RunBounds) {
        let config = SimulationConfig::default();
        let time = ManualTimeSource::new();
        let session = Session::new(&config, time.clone()).unwrap();
        let gateway = InputGateway::new(&config.input);
        let callback = AdvanceTime {
            time,
            step_ms: 17,
            frames: 0,
        };
        (session, gateway, callback, RunBounds::from_config(&config))
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_by_max_frames() {
        let (mut session, gateway, mut callback, mut bounds) = setup();
        bounds.max_frames = 5;
        let mut exporter = MemoryExporter::new();

        let result = run_session(
            &mut session,
            &gateway,
            &mut IdlePlayer::new(),
            &mut exporter,
            &mut callback,
            &bounds,
        )
        .await
        .unwrap();

        assert_eq!(result.end_reason, SessionEndReason::FrameLimitReached);
        assert_eq!(result.frames, 5);
        assert_eq!(callback.frames, 5);
        assert!(!result.exported);
        assert!(exporter.exports().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_run_finishes_and_exports() {
        let (mut session, gateway, mut callback, bounds) = setup();
        let mut exporter = MemoryExporter::new();

        let result = run_session(
            &mut session,
            &gateway,
            &mut IdlePlayer::new(),
            &mut exporter,
            &mut callback,
            &bounds,
        )
        .await
        .unwrap();

        assert_eq!(result.end_reason, SessionEndReason::Finished);
        assert!(result.exported);
        assert_eq!(result.history.len(), 6);
        assert_eq!(exporter.last(), Some(result.history.as_slice()));
        assert_eq!(callback.frames, result.frames);
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_run_records_scripted_choices() {
        let (mut session, gateway, mut callback, bounds) = setup();
        let script = [
            Choice::Left,
            Choice::Left,
            Choice::Right,
            Choice::Left,
            Choice::Right,
            Choice::Left,
        ];
        let mut player = ScriptedPlayer::in_order(&script, 30);
        let mut exporter = MemoryExporter::new();

        let result = run_session(
            &mut session,
            &gateway,
            &mut player,
            &mut exporter,
            &mut callback,
            &bounds,
        )
        .await
        .unwrap();

        assert_eq!(result.end_reason, SessionEndReason::Finished);
        let decisions: Vec<Choice> = result.history.iter().map(|r| r.decision).collect();
        assert_eq!(decisions, script.to_vec());
        let numbers: Vec<u32> = result.history.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        // The vehicle starts right and follows each choice before the next
        // window opens.
        assert_eq!(result.history.first().map(|r| r.lane), Some(Lane::Right));
        assert_eq!(result.history.get(1).map(|r| r.lane), Some(Lane::Left));
    }

    #[tokio::test(start_paused = true)]
    async fn export_failure_is_not_fatal() {
        let (mut session, gateway, mut callback, bounds) = setup();

        let result = run_session(
            &mut session,
            &gateway,
            &mut IdlePlayer::new(),
            &mut FailingExporter,
            &mut callback,
            &bounds,
        )
        .await
        .unwrap();

        assert_eq!(result.end_reason, SessionEndReason::Finished);
        assert!(!result.exported);
        assert_eq!(result.history.len(), 6);
    }

    #[tokio::test]
    async fn zero_interval_without_limit_is_rejected() {
        let (mut session, gateway, mut callback, _) = setup();
        let bounds = RunBounds {
            max_frames: 0,
            frame_interval: Duration::ZERO,
        };
        let result = run_session(
            &mut session,
            &gateway,
            &mut IdlePlayer::new(),
            &mut MemoryExporter::new(),
            &mut callback,
            &bounds,
        )
        .await;
        assert!(matches!(result, Err(RunnerError::InvalidBounds { .. })));
    }

    #[test]
    fn bounds_follow_frame_rate() {
        let mut config = SimulationConfig::default();
        config.clock.target_fps = 50;
        config.session.max_frames = 42;
        let bounds = RunBounds::from_config(&config);
        assert_eq!(bounds.max_frames, 42);
        assert_eq!(bounds.frame_interval, Duration::from_millis(20));
    }
}
