//! Configuration loading and typed config structures for the Crosswalk
//! simulation.
//!
//! The canonical configuration lives in `crosswalk-config.yaml` at the
//! project root. Every section is optional; missing fields fall back to the
//! values the game is tuned with (800-unit viewport, speed 2,
//! 0.3x slow approach, 3 s between encounters).

use std::path::Path;

use crosswalk_types::{CharacterGroup, Lane, ReferenceSplit};
use serde::{Deserialize, Serialize};

use crate::scenario;

/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "CROSSWALK_LOG_LEVEL";

/// Environment variable overriding `export.path`.
pub const ENV_EXPORT_PATH: &str = "CROSSWALK_EXPORT_PATH";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but a value is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `crosswalk-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Frame clock settings.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Road and viewport geometry.
    #[serde(default)]
    pub road: RoadConfig,

    /// Vehicle lane behaviour.
    #[serde(default)]
    pub vehicle: VehicleConfig,

    /// Speed model.
    #[serde(default)]
    pub speed: SpeedConfig,

    /// Encounter sequencing.
    #[serde(default)]
    pub sequence: SequenceConfig,

    /// Input gateway thresholds.
    #[serde(default)]
    pub input: InputConfig,

    /// Finish line.
    #[serde(default)]
    pub finish: FinishConfig,

    /// Session run bounds.
    #[serde(default)]
    pub session: SessionBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Results export.
    #[serde(default)]
    pub export: ExportConfig,

    /// Ordered list of encounters. Empty means "use the built-in catalog".
    #[serde(default)]
    pub scenarios: Vec<ScenarioConfig>,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `CROSSWALK_LOG_LEVEL` overrides `logging.level`
    /// - `CROSSWALK_EXPORT_PATH` overrides `export.path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment overrides,
    /// and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(path) = lookup(ENV_EXPORT_PATH) {
            self.export.path = path;
        }
    }

    /// Return the configured scenarios, or the built-in catalog if none
    /// are configured.
    pub fn effective_scenarios(&self) -> Vec<ScenarioConfig> {
        if self.scenarios.is_empty() {
            scenario::default_catalog()
        } else {
            self.scenarios.clone()
        }
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("road.viewport_extent", self.road.viewport_extent)?;
        require_positive("road.lane_width", self.road.lane_width)?;
        require_finite("road.exit_margin", self.road.exit_margin)?;
        if self.road.vehicle_row_ratio <= 0.0 || self.road.vehicle_row_ratio > 1.0 {
            return Err(invalid(format!(
                "road.vehicle_row_ratio must be in (0, 1], got {}",
                self.road.vehicle_row_ratio
            )));
        }
        require_positive("vehicle.lane_change_speed", self.vehicle.lane_change_speed)?;
        require_positive("speed.base_speed", self.speed.base_speed)?;
        require_positive("speed.min_speed", self.speed.min_speed)?;
        require_positive("speed.max_speed", self.speed.max_speed)?;
        if self.speed.min_speed > self.speed.max_speed {
            return Err(invalid(format!(
                "speed.min_speed ({}) exceeds speed.max_speed ({})",
                self.speed.min_speed, self.speed.max_speed
            )));
        }
        if self.speed.slow_factor <= 0.0 || self.speed.slow_factor > 1.0 {
            return Err(invalid(format!(
                "speed.slow_factor must be in (0, 1], got {}",
                self.speed.slow_factor
            )));
        }
        require_finite("sequence.first_initial_position", self.sequence.first_initial_position)?;
        require_finite("sequence.initial_position", self.sequence.initial_position)?;
        require_finite("finish.initial_position", self.finish.initial_position)?;
        require_non_negative("input.swipe_threshold", self.input.swipe_threshold)?;
        require_non_negative("input.tap_threshold", self.input.tap_threshold)?;
        require_positive("input.viewport_width", self.input.viewport_width)?;

        for (idx, scenario) in self.scenarios.iter().enumerate() {
            if let Some(extent) = scenario.trigger_extent {
                require_positive(&format!("scenarios[{idx}].trigger_extent"), extent)?;
            }
            if let Some(position) = scenario.initial_position {
                require_finite(&format!("scenarios[{idx}].initial_position"), position)?;
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

fn require_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be finite, got {value}")))
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be positive, got {value}")))
    }
}

fn require_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be non-negative, got {value}")))
    }
}

/// Frame clock configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClockConfig {
    /// Nominal frame rate that a tick scale of 1.0 corresponds to.
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// Upper clamp for a single frame's tick scale.
    #[serde(default = "default_max_tick_scale")]
    pub max_tick_scale: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            max_tick_scale: default_max_tick_scale(),
        }
    }
}

/// Road and viewport geometry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoadConfig {
    /// Length of the visible road; also the default trigger band extent.
    #[serde(default = "default_viewport_extent")]
    pub viewport_extent: f64,

    /// Where the vehicle sits along the viewport (fraction of the extent).
    #[serde(default = "default_vehicle_row_ratio")]
    pub vehicle_row_ratio: f64,

    /// Width of one lane.
    #[serde(default = "default_lane_width")]
    pub lane_width: f64,

    /// How far past the far edge a finalized encounter keeps drifting.
    #[serde(default = "default_exit_margin")]
    pub exit_margin: f64,
}

impl RoadConfig {
    /// Approach coordinate of the vehicle.
    pub fn vehicle_row(&self) -> f64 {
        self.viewport_extent * self.vehicle_row_ratio
    }
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            viewport_extent: default_viewport_extent(),
            vehicle_row_ratio: default_vehicle_row_ratio(),
            lane_width: default_lane_width(),
            exit_margin: default_exit_margin(),
        }
    }
}

/// Vehicle lane behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VehicleConfig {
    /// Lane the vehicle starts in (0 = left, 1 = right).
    #[serde(default = "default_initial_lane")]
    pub initial_lane: Lane,

    /// Lateral units per nominal frame while changing lanes.
    #[serde(default = "default_lane_change_speed")]
    pub lane_change_speed: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            initial_lane: default_initial_lane(),
            lane_change_speed: default_lane_change_speed(),
        }
    }
}

/// Speed model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpeedConfig {
    /// Nominal speed in units per nominal frame.
    #[serde(default = "default_base_speed")]
    pub base_speed: f64,

    /// Lower clamp for the effective speed.
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    /// Upper clamp for the effective speed.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Speed multiplier while a decision window is open and undecided.
    #[serde(default = "default_slow_factor")]
    pub slow_factor: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            base_speed: default_base_speed(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            slow_factor: default_slow_factor(),
        }
    }
}

/// When an unanswered decision window resolves on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AutoDecisionPolicy {
    /// Resolve when the encounter passes the far edge of the viewport.
    #[default]
    OnExit,
    /// Resolve once the window has been open for `timeout_ms`, or on exit,
    /// whichever comes first.
    OnWindowTimeout {
        /// Wall-clock milliseconds the window stays open.
        timeout_ms: u64,
    },
}

/// Encounter sequencing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SequenceConfig {
    /// Starting approach position of the first encounter.
    #[serde(default = "default_first_initial_position")]
    pub first_initial_position: f64,

    /// Starting approach position of every later encounter.
    #[serde(default = "default_initial_position")]
    pub initial_position: f64,

    /// Default gap between an encounter finalizing and the next activating.
    #[serde(default = "default_activation_delay_ms")]
    pub activation_delay_ms: u64,

    /// Auto-decision policy for unanswered windows.
    #[serde(default)]
    pub auto_decision: AutoDecisionPolicy,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            first_initial_position: default_first_initial_position(),
            initial_position: default_initial_position(),
            activation_delay_ms: default_activation_delay_ms(),
            auto_decision: AutoDecisionPolicy::default(),
        }
    }
}

/// Input gateway thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputConfig {
    /// Minimum horizontal travel for a swipe to count.
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: f64,

    /// Maximum travel on either axis for a touch to count as a tap.
    #[serde(default = "default_tap_threshold")]
    pub tap_threshold: f64,

    /// Width of the touch surface, used to split taps into halves.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,

    /// Whether keys and swipes change lanes while no window is open.
    #[serde(default = "default_true")]
    pub lane_change_when_closed: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: default_swipe_threshold(),
            tap_threshold: default_tap_threshold(),
            viewport_width: default_viewport_width(),
            lane_change_when_closed: true,
        }
    }
}

/// Finish line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FinishConfig {
    /// Starting approach position of the finish line.
    #[serde(default = "default_initial_position")]
    pub initial_position: f64,
}

impl Default for FinishConfig {
    fn default() -> Self {
        Self {
            initial_position: default_initial_position(),
        }
    }
}

/// Session run bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionBoundsConfig {
    /// Maximum number of frames before the run stops (0 = unlimited).
    #[serde(default)]
    pub max_frames: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Results export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportConfig {
    /// File the decision log is written to when a session finishes.
    #[serde(default = "default_export_path")]
    pub path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: default_export_path(),
        }
    }
}

/// One configured encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Short title of the dilemma.
    pub title: String,

    /// Group on the left side of the crosswalk.
    pub left: CharacterGroup,

    /// Group on the right side of the crosswalk.
    pub right: CharacterGroup,

    /// Gap after this encounter finalizes before the next one activates.
    /// Falls back to `sequence.activation_delay_ms`.
    #[serde(default)]
    pub activation_delay_ms: Option<u64>,

    /// Starting approach position. Falls back to the sequence defaults.
    #[serde(default)]
    pub initial_position: Option<f64>,

    /// Upper bound of the trigger band. Falls back to
    /// `road.viewport_extent`.
    #[serde(default)]
    pub trigger_extent: Option<f64>,

    /// How a reference population answered this dilemma.
    #[serde(default)]
    pub reference: Option<ReferenceSplit>,
}

const fn default_target_fps() -> u32 {
    60
}

const fn default_max_tick_scale() -> f64 {
    5.0
}

const fn default_viewport_extent() -> f64 {
    800.0
}

const fn default_vehicle_row_ratio() -> f64 {
    0.75
}

const fn default_lane_width() -> f64 {
    100.0
}

const fn default_exit_margin() -> f64 {
    50.0
}

const fn default_initial_lane() -> Lane {
    Lane::Right
}

const fn default_lane_change_speed() -> f64 {
    3.0
}

const fn default_base_speed() -> f64 {
    2.0
}

const fn default_min_speed() -> f64 {
    0.2
}

const fn default_max_speed() -> f64 {
    3.0
}

const fn default_slow_factor() -> f64 {
    0.3
}

const fn default_first_initial_position() -> f64 {
    -800.0
}

const fn default_initial_position() -> f64 {
    -100.0
}

const fn default_activation_delay_ms() -> u64 {
    3000
}

const fn default_swipe_threshold() -> f64 {
    50.0
}

const fn default_tap_threshold() -> f64 {
    30.0
}

const fn default_viewport_width() -> f64 {
    800.0
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_export_path() -> String {
    "results/decisions.json".to_owned()
}

const fn default_true() -> bool {
    true
}
