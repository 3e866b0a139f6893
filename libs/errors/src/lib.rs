//! Unified error handling for the noise monitor crates
//!
//! Every library crate in the workspace returns [`NoiseResult`]. The binary wraps these in
//! `anyhow` at the top level only.

use thiserror::Error;

// ============================================================================
// NoiseError - Main error type
// ============================================================================

/// Main error type for the noise monitor
#[derive(Debug, Error)]
pub enum NoiseError {
    // ======================================
    // Configuration Errors
    // ======================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // ======================================
    // Sensor & Permission Errors
    // ======================================
    #[error("Microphone unavailable: {0}")]
    Microphone(String),

    #[error("Geolocation unavailable: {0}")]
    Geolocation(String),

    // ======================================
    // External Service Errors
    // ======================================
    #[error("Reverse geocoding failed for ({latitude}, {longitude}): {reason}")]
    ReverseGeocoding {
        latitude: f64,
        longitude: f64,
        reason: String,
    },

    #[error("External service error: {service}: {message}")]
    ExternalService { service: String, message: String },

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse { service: String, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Timeout waiting for response from {0}")]
    Timeout(String),

    // ======================================
    // Validation Errors
    // ======================================
    #[error("Out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        value: String,
        min: String,
        max: String,
    },

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    // ======================================
    // File & Encoding Errors
    // ======================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio encoding error: {0}")]
    AudioEncoding(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // ======================================
    // Runtime Errors
    // ======================================
    #[error("Monitor stopped: {0}")]
    MonitorStopped(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using NoiseError
pub type NoiseResult<T> = Result<T, NoiseError>;

/// Error category enum - used for degradation decisions and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    /// Device or permission failure; surfaced persistently, never retried
    Sensor,
    Network,
    Timeout,
    Validation,
    Internal,
    Unknown,
}

impl NoiseError {
    /// Create an external service error
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Get error code (for logs)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::Microphone(_) => "MICROPHONE_UNAVAILABLE",
            Self::Geolocation(_) => "GEOLOCATION_UNAVAILABLE",
            Self::ReverseGeocoding { .. } => "REVERSE_GEOCODING_FAILED",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::InvalidResponse { .. } => "INVALID_RESPONSE",
            Self::HttpClient(_) => "HTTP_CLIENT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::UnknownEnvironment(_) => "UNKNOWN_ENVIRONMENT",
            Self::Io(_) => "IO_ERROR",
            Self::AudioEncoding(_) => "AUDIO_ENCODING_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::MonitorStopped(_) => "MONITOR_STOPPED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Other(_) => "OTHER_ERROR",
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::InvalidConfig { .. } => ErrorCategory::Configuration,

            Self::Microphone(_) | Self::Geolocation(_) => ErrorCategory::Sensor,

            Self::ReverseGeocoding { .. }
            | Self::ExternalService { .. }
            | Self::InvalidResponse { .. }
            | Self::HttpClient(_) => ErrorCategory::Network,

            Self::Timeout(_) => ErrorCategory::Timeout,

            Self::OutOfRange { .. } | Self::UnknownEnvironment(_) => ErrorCategory::Validation,

            Self::Io(_)
            | Self::AudioEncoding(_)
            | Self::Serialization(_)
            | Self::MonitorStopped(_)
            | Self::Internal(_) => ErrorCategory::Internal,

            Self::Other(_) => ErrorCategory::Unknown,
        }
    }

    /// Sensor and permission failures stay visible and stop the sampling that produced them
    pub fn is_sensor(&self) -> bool {
        self.category() == ErrorCategory::Sensor
    }

    /// Check if this error is worth trying again on the next timer tick
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout
        )
    }
}

// Conversion traits for common error types
impl From<serde_json::Error> for NoiseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<figment::Error> for NoiseError {
    fn from(err: figment::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<hound::Error> for NoiseError {
    fn from(err: hound::Error) -> Self {
        Self::AudioEncoding(err.to_string())
    }
}

// Helper macros for creating errors
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::NoiseError::Configuration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::NoiseError::Configuration(format!($fmt, $($arg)*))
    };
}
