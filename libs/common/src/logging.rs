//! Unified logging module for the noise monitor
//!
//! Console output goes to stderr (stdout belongs to the dashboard), with an optional daily
//! rolling file sink and a reloadable level filter.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use errors::{NoiseError, NoiseResult};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Bracketed label and ANSI color per level
fn level_style(level: Level) -> (&'static str, &'static str) {
    match level {
        Level::TRACE => ("[TRACE]", "\x1b[35m"),
        Level::DEBUG => ("[DEBUG]", "\x1b[34m"),
        Level::INFO => ("[INFO]", "\x1b[32m"),
        Level::WARN => ("[WARN]", "\x1b[33m"),
        Level::ERROR => ("[ERROR]", "\x1b[31m"),
    }
}

/// `2025-12-02T00:50:44.809Z [INFO] Monitor started`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let stamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        let (label, color) = level_style(*event.metadata().level());
        if writer.has_ansi_escapes() {
            write!(writer, "{} {}{}\x1b[0m ", stamp, color, label)?;
        } else {
            write!(writer, "{} {} ", stamp, label)?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// Keeps the non-blocking file writer alive for the life of the process
static GUARDS: OnceLock<Mutex<Vec<WorkerGuard>>> = OnceLock::new();

// Dynamic log level reload support
type EnvFilterReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;
static LOG_FILTER_HANDLE: OnceLock<EnvFilterReloadHandle> = OnceLock::new();
static CURRENT_LOG_LEVEL: OnceLock<Mutex<String>> = OnceLock::new();

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Service name, used as file prefix and per-crate filter target
    pub service_name: String,
    /// Base level or full filter spec (e.g. "info" or "info,noise_core=debug")
    pub level: String,
    /// Write JSON lines to the log file instead of the bracketed format
    pub enable_json: bool,
    /// Colored console output
    pub ansi: bool,
    /// Directory for daily rolling log files; console only when `None`
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "noisemon".to_string(),
            level: "info".to_string(),
            enable_json: false,
            ansi: true,
            log_dir: None,
        }
    }
}

/// Build the filter spec: `RUST_LOG` wins, otherwise the configured level
fn resolve_filter(config: &LogConfig, rust_log: Option<String>) -> String {
    match rust_log {
        Some(env_str) if !env_str.trim().is_empty() => env_str,
        _ => config.level.clone(),
    }
}

/// Initialize logging system with configuration
pub fn init_with_config(config: LogConfig) -> NoiseResult<()> {
    let filter_str = resolve_filter(&config, std::env::var("RUST_LOG").ok());
    let env_filter = EnvFilter::try_new(&filter_str)
        .map_err(|e| NoiseError::invalid_config("logging.level", e.to_string()))?;

    // Wrap EnvFilter with reload::Layer for dynamic level changes
    let (reload_filter, reload_handle) = reload::Layer::new(env_filter);
    let _ = LOG_FILTER_HANDLE.set(reload_handle);
    let _ = CURRENT_LOG_LEVEL.set(Mutex::new(filter_str));

    let registry = tracing_subscriber::registry().with(reload_filter);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi)
        .event_format(BracketedLevelFormat)
        .boxed();

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender =
                tracing_appender::rolling::daily(dir, format!("{}.log", config.service_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            let guards = GUARDS.get_or_init(|| Mutex::new(Vec::new()));
            match guards.lock() {
                Ok(mut guards) => guards.push(guard),
                Err(poisoned) => poisoned.into_inner().push(guard),
            }

            let layer = if config.enable_json {
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_level(true)
                    .with_target(true)
                    .boxed()
            } else {
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .event_format(BracketedLevelFormat)
                    .boxed()
            };
            Some(layer)
        },
        None => None,
    };

    registry
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| NoiseError::Internal(format!("Failed to install logger: {}", e)))?;

    match &config.log_dir {
        Some(dir) => tracing::info!("Logging: {} @ {:?}", config.service_name, dir),
        None => tracing::debug!("Logging: {} (console only)", config.service_name),
    }

    Ok(())
}

/// Shorthand initialization with only a level
pub fn init(level: &str) -> NoiseResult<()> {
    init_with_config(LogConfig {
        level: level.to_string(),
        ..Default::default()
    })
}

/// Dynamically set log filter level at runtime
///
/// Accepts a bare level ("debug") or a full filter spec ("info,noise_core=debug").
pub fn set_log_level(level: &str) -> Result<(), String> {
    let handle = LOG_FILTER_HANDLE
        .get()
        .ok_or("Logging not initialized with reload support")?;

    let new_filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    handle
        .reload(new_filter)
        .map_err(|e| format!("Failed to reload log filter: {}", e))?;

    if let Some(current) = CURRENT_LOG_LEVEL.get() {
        if let Ok(mut guard) = current.lock() {
            *guard = level.to_string();
        }
    }

    tracing::info!("Log level changed to: {}", level);
    Ok(())
}

/// Get current log filter level
pub fn get_log_level() -> String {
    CURRENT_LOG_LEVEL
        .get()
        .and_then(|m| m.lock().ok())
        .map(|guard| guard.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_labels() {
        assert_eq!(level_style(Level::INFO).0, "[INFO]");
        assert_eq!(level_style(Level::WARN).0, "[WARN]");
        assert_eq!(level_style(Level::ERROR), ("[ERROR]", "\x1b[31m"));
    }

    #[test]
    fn test_rust_log_overrides_configured_level() {
        let config = LogConfig {
            level: "warn".to_string(),
            ..Default::default()
        };
        assert_eq!(resolve_filter(&config, None), "warn");
        assert_eq!(resolve_filter(&config, Some("  ".to_string())), "warn");
        assert_eq!(
            resolve_filter(&config, Some("debug,hyper=off".to_string())),
            "debug,hyper=off"
        );
    }

    #[test]
    fn test_set_log_level_requires_init() {
        // No subscriber is installed in unit tests
        if LOG_FILTER_HANDLE.get().is_none() {
            assert!(set_log_level("debug").is_err());
            assert_eq!(get_log_level(), "unknown");
        }
    }
}
