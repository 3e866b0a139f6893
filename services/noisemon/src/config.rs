//! Monitor configuration
//!
//! Defaults, then the optional config file, then `NOISEMON_*` environment variables
//! (`NOISEMON_MONITOR__TICK_MS=500`, `NOISEMON_GENAI__API_KEY=...`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use common::load_config;
use errors::{NoiseError, NoiseResult};
use noise_clients::{AudioConfig, GenAiConfig, ImageConfig, LocationConfig};
use noise_core::simulator::{DEFAULT_MAX_STEP_DB, MAX_DB, MIN_DB};
use noise_core::{Environment, SessionConfig, ThresholdTable};

pub const ENV_PREFIX: &str = "NOISEMON_";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoisemonConfig {
    pub monitor: MonitorConfig,
    pub genai: GenAiConfig,
    pub location: LocationConfig,
    pub audio: AudioConfig,
    pub images: ImageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Decibel tick
    pub tick_ms: u64,
    pub threshold_refresh_secs: u64,
    pub classify_interval_secs: u64,
    /// Length of each audio clip sent to the classifier
    pub capture_secs: u64,
    pub environment: Environment,
    pub thresholds: ThresholdTable,
    /// Fixed seed for a reproducible walk
    pub seed: Option<u64>,
    pub max_step_db: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1_500,
            threshold_refresh_secs: 60,
            classify_interval_secs: 20,
            capture_secs: 3,
            environment: Environment::default(),
            thresholds: ThresholdTable::default(),
            seed: None,
            max_step_db: DEFAULT_MAX_STEP_DB,
        }
    }
}

impl MonitorConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn threshold_refresh(&self) -> Duration {
        Duration::from_secs(self.threshold_refresh_secs)
    }

    pub fn classify_interval(&self) -> Duration {
        Duration::from_secs(self.classify_interval_secs)
    }

    pub fn capture(&self) -> Duration {
        Duration::from_secs(self.capture_secs)
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            environment: self.environment,
            thresholds: self.thresholds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// JSON lines in the log file
    pub json: bool,
    /// Daily rolling log files go here; console only when unset
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            dir: None,
        }
    }
}

impl NoisemonConfig {
    /// Load and validate
    pub fn load(path: Option<&Path>) -> NoiseResult<Self> {
        let config: Self = load_config(path, ENV_PREFIX)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> NoiseResult<()> {
        let monitor = &self.monitor;
        let intervals = [
            ("monitor.tick_ms", monitor.tick_ms),
            ("monitor.threshold_refresh_secs", monitor.threshold_refresh_secs),
            ("monitor.classify_interval_secs", monitor.classify_interval_secs),
            ("monitor.capture_secs", monitor.capture_secs),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(NoiseError::invalid_config(field, "must be greater than zero"));
            }
        }

        if monitor.max_step_db.is_nan() || monitor.max_step_db < 0.0 {
            return Err(NoiseError::invalid_config(
                "monitor.max_step_db",
                "must not be negative",
            ));
        }

        for environment in Environment::ALL {
            let limits = monitor.thresholds.get(environment);
            let field = format!("monitor.thresholds.{}", environment.as_str().to_lowercase());
            for value in [limits.day, limits.night] {
                if !(MIN_DB..=MAX_DB).contains(&value) {
                    return Err(NoiseError::invalid_config(
                        field,
                        format!("{}dB outside {}..={}dB", value, MIN_DB, MAX_DB),
                    ));
                }
            }
            if limits.night > limits.day {
                return Err(NoiseError::invalid_config(
                    field,
                    format!(
                        "night limit {}dB above day limit {}dB",
                        limits.night, limits.day
                    ),
                ));
            }
        }

        let urls = [
            ("genai.base_url", &self.genai.base_url),
            ("genai.model", &self.genai.model),
            ("location.nominatim_url", &self.location.nominatim_url),
            ("location.user_agent", &self.location.user_agent),
            ("images.placeholder_url", &self.images.placeholder_url),
        ];
        for (field, value) in urls {
            if value.trim().is_empty() {
                return Err(NoiseError::invalid_config(field, "must not be empty"));
            }
        }

        if self.location.latitude.is_some() != self.location.longitude.is_some() {
            return Err(NoiseError::invalid_config(
                "location",
                "latitude and longitude must be set together",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use noise_clients::AudioSourceKind;
    use noise_core::Threshold;

    #[test]
    fn test_defaults_are_valid() {
        let config = NoisemonConfig::default();
        config.validate().unwrap();
        assert_eq!(config.monitor.tick(), Duration::from_millis(1_500));
        assert_eq!(config.monitor.classify_interval(), Duration::from_secs(20));
        assert_eq!(config.monitor.thresholds.residential.day, 55);
    }

    #[test]
    fn test_yaml_and_env_layering() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "noisemon.yaml",
                r#"
monitor:
  tick_ms: 500
  environment: Commercial
  thresholds:
    industrial:
      day: 80
      night: 70
audio:
  source: file
  path: /tmp/clip.wav
location:
  latitude: 45.76
  longitude: 4.84
"#,
            )?;
            jail.set_env("NOISEMON_MONITOR__SEED", "7");
            jail.set_env("NOISEMON_GENAI__API_KEY", "secret");

            let config = NoisemonConfig::load(Some(Path::new("noisemon.yaml"))).unwrap();
            assert_eq!(config.monitor.tick_ms, 500);
            assert_eq!(config.monitor.environment, Environment::Commercial);
            assert_eq!(config.monitor.thresholds.industrial, Threshold::new(80, 70));
            assert_eq!(config.monitor.thresholds.residential, Threshold::new(55, 45));
            assert_eq!(config.monitor.seed, Some(7));
            assert_eq!(config.genai.api_key.as_deref(), Some("secret"));
            assert_eq!(config.audio.source, AudioSourceKind::File);
            assert!(config.location.coordinates().is_some());
            Ok(())
        });
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = NoisemonConfig::default();
        config.monitor.classify_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("monitor.classify_interval_secs"));
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut config = NoisemonConfig::default();
        config.monitor.thresholds.commercial = Threshold::new(50, 60);
        assert!(matches!(
            config.validate(),
            Err(NoiseError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_url() {
        let mut config = NoisemonConfig::default();
        config.genai.base_url = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("genai.base_url"));
    }

    #[test]
    fn test_rejects_half_coordinates() {
        let mut config = NoisemonConfig::default();
        config.location.latitude = Some(1.0);
        assert!(config.validate().is_err());
    }
}
