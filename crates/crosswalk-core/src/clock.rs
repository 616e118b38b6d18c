//! Frame clock and wall-clock time sources.
//!
//! Two kinds of time drive the simulation, and they are deliberately kept
//! apart:
//!
//! - **Tick scale** ([`FrameClock`]) -- a dimensionless multiplier derived
//!   from the gap between consecutive frame timestamps. Every position and
//!   distance advance is multiplied by it, so the road moves at the same
//!   speed at 30, 60, or 144 Hz.
//! - **Wall-clock milliseconds** ([`TimeSource`]) -- used only for the
//!   inter-encounter activation delays, which are measured against a
//!   captured start instant rather than counted in frames.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::config::ClockConfig;

/// Milliseconds in one second, as a float for interval math.
const MS_PER_SECOND: f64 = 1000.0;

/// Errors that can occur when building a clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Invalid clock configuration (e.g. zero frame rate).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Converts per-frame timestamps into a normalized tick scale.
///
/// `tick_scale = (current - previous) / target_frame_interval`, clamped to
/// `[0, max_tick_scale]`. A tick scale of 1.0 means "exactly one nominal
/// frame elapsed".
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    /// Duration of one nominal frame in milliseconds.
    target_frame_interval_ms: f64,

    /// Upper clamp for a single tick scale (tab-resume protection).
    max_tick_scale: f64,

    /// Timestamp of the previous frame, if any frame has been seen.
    previous_ms: Option<f64>,
}

impl FrameClock {
    /// Create a frame clock from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: &ClockConfig) -> Result<Self, ClockError> {
        Self::from_parts(config.target_fps, config.max_tick_scale)
    }

    /// Create a frame clock from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `target_fps` is 0 or
    /// `max_tick_scale` is not a positive finite number.
    pub fn from_parts(target_fps: u32, max_tick_scale: f64) -> Result<Self, ClockError> {
        if target_fps == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "target_fps must be at least 1".to_owned(),
            });
        }
        if !max_tick_scale.is_finite() || max_tick_scale <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("max_tick_scale must be positive and finite, got {max_tick_scale}"),
            });
        }
        Ok(Self {
            target_frame_interval_ms: MS_PER_SECOND / f64::from(target_fps),
            max_tick_scale,
            previous_ms: None,
        })
    }

    /// Feed the timestamp of the current frame and return its tick scale.
    ///
    /// The first call returns 0 because there is nothing to diff against.
    /// A timestamp that is not finite, or that goes backwards, also yields
    /// 0 and does not replace the stored previous timestamp.
    pub const fn advance(&mut self, timestamp_ms: f64) -> f64 {
        if !timestamp_ms.is_finite() {
            return 0.0;
        }
        let Some(previous) = self.previous_ms else {
            self.previous_ms = Some(timestamp_ms);
            return 0.0;
        };
        if timestamp_ms < previous {
            return 0.0;
        }
        self.previous_ms = Some(timestamp_ms);
        let scale = (timestamp_ms - previous) / self.target_frame_interval_ms;
        scale.clamp(0.0, self.max_tick_scale)
    }

    /// Forget the previous timestamp so the next frame yields 0.
    ///
    /// Hosts call this when rendering resumes after a long suspension.
    pub const fn reset(&mut self) {
        self.previous_ms = None;
    }

    /// Return the duration of one nominal frame in milliseconds.
    pub const fn target_frame_interval_ms(&self) -> f64 {
        self.target_frame_interval_ms
    }

    /// Return the configured tick-scale clamp.
    pub const fn max_tick_scale(&self) -> f64 {
        self.max_tick_scale
    }
}

/// A source of wall-clock milliseconds for activation delays.
pub trait TimeSource {
    /// Return the current time in milliseconds.
    ///
    /// Only differences between two readings are meaningful.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time from the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    /// Create a new system time source.
    pub const fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        // Timestamps before the epoch are treated as 0.
        u64::try_from(Utc::now().timestamp_millis().max(0)).unwrap_or(0)
    }
}

/// A manually advanced time source for tests and deterministic replays.
///
/// Clones share the same underlying counter, so a test can keep one handle
/// and hand another to the controller.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now_ms: Arc<AtomicU64>,
}

impl ManualTimeSource {
    /// Create a manual time source starting at 0 ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manual time source starting at the given instant.
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(now_ms)),
        }
    }

    /// Move time forward by `ms` milliseconds (saturating).
    pub fn advance_ms(&self, ms: u64) {
        let now = self.now_ms.load(Ordering::Acquire);
        self.now_ms.store(now.saturating_add(ms), Ordering::Release);
    }

    /// Set the current time.
    pub fn set_ms(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::Release);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn make_clock() -> FrameClock {
        FrameClock::new(&ClockConfig::default()).unwrap()
    }

    #[test]
    fn first_frame_yields_zero() {
        let mut clock = make_clock();
        assert!(approx(clock.advance(12_345.0), 0.0));
    }

    #[test]
    fn one_nominal_frame_yields_one() {
        let mut clock = make_clock();
        let _ = clock.advance(1000.0);
        let scale = clock.advance(1000.0 + clock.target_frame_interval_ms());
        assert!(approx(scale, 1.0));
    }

    #[test]
    fn scale_is_frame_rate_independent() {
        // One second of frames sums to 60 nominal ticks at any refresh rate.
        for hz in [30_u32, 60, 144] {
            let mut clock = make_clock();
            let step = 1000.0 / f64::from(hz);
            let mut t = 0.0;
            let _ = clock.advance(t);
            let mut total = 0.0;
            for _ in 0..hz {
                t += step;
                total += clock.advance(t);
            }
            assert!((total - 60.0).abs() < 1e-6, "{hz} Hz summed to {total}");
        }
    }

    #[test]
    fn long_gap_is_clamped() {
        let mut clock = make_clock();
        let _ = clock.advance(0.0);
        let scale = clock.advance(60_000.0);
        assert!(approx(scale, 5.0));
    }

    #[test]
    fn backwards_timestamp_yields_zero_and_keeps_previous() {
        let mut clock = make_clock();
        let _ = clock.advance(1000.0);
        assert!(approx(clock.advance(900.0), 0.0));
        let scale = clock.advance(1000.0 + clock.target_frame_interval_ms() * 2.0);
        assert!(approx(scale, 2.0));
    }

    #[test]
    fn non_finite_timestamp_yields_zero() {
        let mut clock = make_clock();
        let _ = clock.advance(0.0);
        assert!(approx(clock.advance(f64::NAN), 0.0));
        assert!(approx(clock.advance(f64::INFINITY), 0.0));
    }

    #[test]
    fn reset_forgets_previous_frame() {
        let mut clock = make_clock();
        let _ = clock.advance(0.0);
        clock.reset();
        assert!(approx(clock.advance(10_000.0), 0.0));
    }

    #[test]
    fn invalid_config_zero_fps() {
        assert!(FrameClock::from_parts(0, 5.0).is_err());
    }

    #[test]
    fn invalid_config_bad_clamp() {
        assert!(FrameClock::from_parts(60, 0.0).is_err());
        assert!(FrameClock::from_parts(60, -1.0).is_err());
        assert!(FrameClock::from_parts(60, f64::NAN).is_err());
    }

    #[test]
    fn manual_time_source_clones_share_time() {
        let time = ManualTimeSource::starting_at(100);
        let handle = time.clone();
        handle.advance_ms(250);
        assert_eq!(time.now_ms(), 350);
        time.set_ms(10);
        assert_eq!(handle.now_ms(), 10);
    }

    #[test]
    fn system_time_source_is_positive() {
        assert!(SystemTimeSource::new().now_ms() > 0);
    }
}
