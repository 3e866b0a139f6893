//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

use noise_core::Environment;

use crate::config::NoisemonConfig;

/// Noise monitor startup arguments
///
/// Every flag overrides the matching value from the config file and `NOISEMON_*`
/// environment variables.
#[derive(Debug, Clone, Default, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, value_name = "FILE", env = "NOISEMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    pub log_level: Option<String>,

    /// Starting environment (residential, commercial, industrial)
    #[arg(short, long)]
    pub environment: Option<Environment>,

    /// Seed for a reproducible decibel walk
    #[arg(long)]
    pub seed: Option<u64>,

    /// Disable colored output and screen redraws
    #[arg(long)]
    pub no_color: bool,

    /// Only validate configuration without starting the monitor
    #[arg(long)]
    pub validate: bool,
}

impl Args {
    pub fn apply(&self, config: &mut NoisemonConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(environment) = self.environment {
            config.monitor.environment = environment;
        }
        if let Some(seed) = self.seed {
            config.monitor.seed = Some(seed);
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "noisemon",
            "-e",
            "industrial",
            "--seed",
            "42",
            "-l",
            "debug",
        ])
        .unwrap();

        let mut config = NoisemonConfig::default();
        args.apply(&mut config);
        assert_eq!(config.monitor.environment, Environment::Industrial);
        assert_eq!(config.monitor.seed, Some(42));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_rejects_unknown_environment() {
        assert!(Args::try_parse_from(["noisemon", "-e", "rural"]).is_err());
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = NoisemonConfig::default();
        Args::default().apply(&mut config);
        assert_eq!(config, NoisemonConfig::default());
    }
}
