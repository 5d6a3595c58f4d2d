//! Tracker configuration.
//!
//! Every threshold the state machine consults lives here; the config is
//! injected at construction and swappable via `TripTracker::apply_config`,
//! never read from ambient global state inside core logic.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::geo::mph_to_mps;

/// Policy thresholds and feature toggles for the trip tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Auto-start/auto-stop trips from observed speed
    pub auto_detect_enabled: bool,
    /// Automatically pause auto-started trips when stationary
    pub smart_pause_enabled: bool,
    /// Raise the round-trip advisory
    pub round_trip_detection_enabled: bool,

    /// Speed at/above which an idle tracker auto-starts a trip (m/s)
    pub auto_start_speed_mps: f64,
    /// Speed below which the vehicle counts as stationary (m/s)
    pub stationary_speed_mps: f64,
    /// Continuous stationary time before smart-pause kicks in (seconds)
    pub smart_pause_delay_secs: i64,
    /// Continuous below-threshold time before an auto-started trip ends (seconds)
    pub auto_stop_delay_secs: i64,

    /// Minimum interval between snapshot writes (seconds)
    pub snapshot_interval_secs: i64,
    /// No snapshots until this much distance has accumulated (miles)
    pub snapshot_min_distance_miles: f64,

    /// Recovered snapshots below this distance are discarded as noise (miles)
    pub recovery_min_distance_miles: f64,
    /// Adjacent-fix jumps longer than this are GPS glitches (miles)
    pub glitch_segment_miles: f64,
    /// Recovered-trip start times within this window count as duplicates (seconds)
    pub recovery_dedup_window_secs: i64,

    /// Radius around the start point for round-trip detection (meters)
    pub round_trip_radius_meters: f64,
    /// Minimum accumulated distance before the advisory can fire (miles)
    pub round_trip_min_distance_miles: f64,

    /// Category applied when a trip is finalized with an empty reason
    pub default_reason: String,

    /// Data directory for the file-backed store (binary only)
    pub data_dir: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            auto_detect_enabled: false,
            smart_pause_enabled: true,
            round_trip_detection_enabled: true,
            auto_start_speed_mps: mph_to_mps(20.0),
            stationary_speed_mps: 0.5,
            smart_pause_delay_secs: 120,
            auto_stop_delay_secs: 180,
            snapshot_interval_secs: 10,
            snapshot_min_distance_miles: 0.05,
            recovery_min_distance_miles: 0.1,
            glitch_segment_miles: 50.0,
            recovery_dedup_window_secs: 60,
            round_trip_radius_meters: 100.0,
            round_trip_min_distance_miles: 0.5,
            default_reason: "Business".to_string(),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults above for anything unset or unparseable.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();
        Self {
            auto_detect_enabled: env_or("ROADLOG_AUTO_DETECT", defaults.auto_detect_enabled),
            smart_pause_enabled: env_or("ROADLOG_SMART_PAUSE", defaults.smart_pause_enabled),
            round_trip_detection_enabled: env_or(
                "ROADLOG_ROUND_TRIP_DETECTION",
                defaults.round_trip_detection_enabled,
            ),
            auto_start_speed_mps: env_or("ROADLOG_AUTO_START_MPS", defaults.auto_start_speed_mps),
            stationary_speed_mps: env_or("ROADLOG_STATIONARY_MPS", defaults.stationary_speed_mps),
            smart_pause_delay_secs: env_or(
                "ROADLOG_SMART_PAUSE_SECS",
                defaults.smart_pause_delay_secs,
            ),
            auto_stop_delay_secs: env_or("ROADLOG_AUTO_STOP_SECS", defaults.auto_stop_delay_secs),
            snapshot_interval_secs: env_or(
                "ROADLOG_SNAPSHOT_INTERVAL_SECS",
                defaults.snapshot_interval_secs,
            ),
            snapshot_min_distance_miles: env_or(
                "ROADLOG_SNAPSHOT_MIN_MILES",
                defaults.snapshot_min_distance_miles,
            ),
            recovery_min_distance_miles: env_or(
                "ROADLOG_RECOVERY_MIN_MILES",
                defaults.recovery_min_distance_miles,
            ),
            glitch_segment_miles: env_or("ROADLOG_GLITCH_MILES", defaults.glitch_segment_miles),
            recovery_dedup_window_secs: env_or(
                "ROADLOG_RECOVERY_DEDUP_SECS",
                defaults.recovery_dedup_window_secs,
            ),
            round_trip_radius_meters: env_or(
                "ROADLOG_ROUND_TRIP_RADIUS_M",
                defaults.round_trip_radius_meters,
            ),
            round_trip_min_distance_miles: env_or(
                "ROADLOG_ROUND_TRIP_MIN_MILES",
                defaults.round_trip_min_distance_miles,
            ),
            default_reason: env::var("ROADLOG_DEFAULT_REASON").unwrap_or(defaults.default_reason),
            data_dir: env::var("ROADLOG_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        }
    }
}

/// Parse an environment variable, keeping the default on absence or a bad value.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(name, raw = %raw, "Ignoring unparseable config override");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-wide; tests that set them must not
    // overlap with anything else reading `from_env`.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_match_documented_thresholds() {
        let config = TrackerConfig::default();
        assert_eq!(config.snapshot_interval_secs, 10);
        assert_eq!(config.recovery_min_distance_miles, 0.1);
        assert_eq!(config.glitch_segment_miles, 50.0);
        assert_eq!(config.round_trip_radius_meters, 100.0);
        // 20 mph expressed in m/s.
        assert!((config.auto_start_speed_mps - 8.9408).abs() < 1e-3);
    }

    #[test]
    fn test_env_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("ROADLOG_GLITCH_MILES", "25.0");
        env::set_var("ROADLOG_SMART_PAUSE_SECS", "not-a-number");

        let config = TrackerConfig::from_env();

        env::remove_var("ROADLOG_GLITCH_MILES");
        env::remove_var("ROADLOG_SMART_PAUSE_SECS");

        assert_eq!(config.glitch_segment_miles, 25.0);
        // Bad values fall back to the default.
        assert_eq!(config.smart_pause_delay_secs, 120);
    }
}
