// src/config.rs

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{JunctionError, JunctionResult};
use crate::global_variables::*;

/// How the ingestion adapter treats a lane number other than 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneRouting {
    /// Any lane that is not 1 or 2 is routed to lane 3.
    #[default]
    FoldToThird,
    /// Lanes outside 1..=3 are rejected as malformed.
    Strict,
}

/// Settings for one junction process. Loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JunctionConfig {
    pub queue_capacity: usize,
    pub high_priority_threshold: usize,
    pub normal_priority_threshold: usize,
    pub emergency_threshold: usize,
    pub priority_cooldown: u32,
    pub time_per_vehicle_secs: f64,
    pub scheduler_tick_ms: u64,
    pub ingestion_poll_ms: u64,
    pub observer_refresh_ms: u64,
    pub snapshot_export_ms: u64,
    pub generator_interval_ms: u64,
    pub generator_retry_ms: u64,
    pub vehicle_file: PathBuf,
    pub served_log_file: PathBuf,
    pub snapshot_file: PathBuf,
    pub lane_routing: LaneRouting,
}

impl Default for JunctionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: MAX_QUEUE_SIZE,
            high_priority_threshold: HIGH_PRIORITY_THRESHOLD,
            normal_priority_threshold: NORMAL_PRIORITY_THRESHOLD,
            emergency_threshold: EMERGENCY_THRESHOLD,
            priority_cooldown: PRIORITY_COOLDOWN,
            time_per_vehicle_secs: TIME_PER_VEHICLE_SECS,
            scheduler_tick_ms: SCHEDULER_TICK_MS,
            ingestion_poll_ms: INGESTION_POLL_MS,
            observer_refresh_ms: OBSERVER_REFRESH_MS,
            snapshot_export_ms: SNAPSHOT_EXPORT_MS,
            generator_interval_ms: GENERATOR_INTERVAL_MS,
            generator_retry_ms: GENERATOR_RETRY_MS,
            vehicle_file: PathBuf::from(VEHICLE_FILE),
            served_log_file: PathBuf::from(SERVED_LOG_FILE),
            snapshot_file: PathBuf::from(SNAPSHOT_FILE),
            lane_routing: LaneRouting::default(),
        }
    }
}

impl JunctionConfig {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> JunctionResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: JunctionConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by `JUNCTION_CONFIG`, or the defaults when unset.
    pub fn from_env() -> JunctionResult<Self> {
        match env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                log::info!("Loading junction config from {:?}", path);
                JunctionConfig::load(Path::new(&path))
            }
            None => Ok(JunctionConfig::default()),
        }
    }

    pub fn validate(&self) -> JunctionResult<()> {
        if self.queue_capacity == 0 {
            return Err(JunctionError::Config("queue_capacity must be positive".into()));
        }
        if self.normal_priority_threshold >= self.high_priority_threshold {
            return Err(JunctionError::Config(format!(
                "normal_priority_threshold ({}) must be below high_priority_threshold ({})",
                self.normal_priority_threshold, self.high_priority_threshold
            )));
        }
        if Duration::try_from_secs_f64(self.time_per_vehicle_secs).is_err() {
            return Err(JunctionError::Config(format!(
                "time_per_vehicle_secs ({}) must be a non-negative number of seconds that fits a Duration",
                self.time_per_vehicle_secs
            )));
        }
        let cadences = [
            ("scheduler_tick_ms", self.scheduler_tick_ms),
            ("ingestion_poll_ms", self.ingestion_poll_ms),
            ("observer_refresh_ms", self.observer_refresh_ms),
            ("snapshot_export_ms", self.snapshot_export_ms),
            ("generator_interval_ms", self.generator_interval_ms),
            ("generator_retry_ms", self.generator_retry_ms),
        ];
        for (name, value) in cadences {
            if value == 0 {
                return Err(JunctionError::Config(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }

    /// Values a `Duration` cannot hold mean "never"; `validate` rejects them.
    pub fn time_per_vehicle(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_per_vehicle_secs).unwrap_or(Duration::MAX)
    }

    pub fn scheduler_tick(&self) -> Duration {
        Duration::from_millis(self.scheduler_tick_ms)
    }

    pub fn ingestion_poll(&self) -> Duration {
        Duration::from_millis(self.ingestion_poll_ms)
    }

    pub fn observer_refresh(&self) -> Duration {
        Duration::from_millis(self.observer_refresh_ms)
    }

    pub fn snapshot_export(&self) -> Duration {
        Duration::from_millis(self.snapshot_export_ms)
    }

    pub fn generator_interval(&self) -> Duration {
        Duration::from_millis(self.generator_interval_ms)
    }

    pub fn generator_retry(&self) -> Duration {
        Duration::from_millis(self.generator_retry_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "emergency_threshold": 20, "lane_routing": "strict" }}"#).unwrap();

        let config = JunctionConfig::load(file.path()).unwrap();
        assert_eq!(config.emergency_threshold, 20);
        assert_eq!(config.lane_routing, LaneRouting::Strict);
        assert_eq!(config.queue_capacity, MAX_QUEUE_SIZE);
        assert_eq!(config.scheduler_tick(), Duration::from_millis(200));
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let config = JunctionConfig {
            normal_priority_threshold: 10,
            high_priority_threshold: 10,
            ..JunctionConfig::default()
        };
        assert!(matches!(config.validate(), Err(JunctionError::Config(_))));
    }

    #[test]
    fn unrepresentable_time_per_vehicle_is_rejected() {
        for secs in [1e20, f64::INFINITY, -1.0] {
            let config = JunctionConfig {
                time_per_vehicle_secs: secs,
                ..JunctionConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(JunctionError::Config(_))),
                "{} should be rejected",
                secs
            );
            assert_eq!(config.time_per_vehicle(), Duration::MAX);
        }
    }
}
