//! Frame callback that reports progress through `tracing`.

use crosswalk_core::events::SequenceEvent;
use crosswalk_core::runner::FrameCallback;
use crosswalk_core::session::FrameReport;
use crosswalk_types::RenderSnapshot;
use tracing::debug;

/// Logs controller events and a periodic position line.
pub struct ProgressCallback {
    /// Frames between periodic position lines (0 = never).
    every: u64,
    /// Decision windows opened so far.
    windows_opened: u32,
}

impl ProgressCallback {
    /// Create a callback logging a position line every `every` frames.
    pub const fn new(every: u64) -> Self {
        Self {
            every,
            windows_opened: 0,
        }
    }

    /// Return how many decision windows opened during the run.
    pub const fn windows_opened(&self) -> u32 {
        self.windows_opened
    }
}

impl FrameCallback for ProgressCallback {
    fn on_frame(&mut self, report: &FrameReport, snapshot: &RenderSnapshot) {
        for event in &report.events {
            if matches!(event, SequenceEvent::WindowOpened { .. }) {
                self.windows_opened = self.windows_opened.saturating_add(1);
            }
            debug!(frame = report.frame, ?event, "Sequence event");
        }

        if self.every > 0 && report.frame.checked_rem(self.every) == Some(0) {
            debug!(
                frame = report.frame,
                active = snapshot.active_number,
                position = snapshot.encounter.as_ref().map(|e| e.approach_position),
                lane = snapshot.vehicle_lane.index(),
                distance = snapshot.distance,
                speed = snapshot.speed,
                "Progress"
            );
        }
    }
}
