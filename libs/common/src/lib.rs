//! Noise monitor basic library
//!
//! Provides functions shared by the monitor crates:
//! - logging initialization and runtime level changes
//! - layered configuration loading
//! - shutdown signal handling

pub mod config_loader;
pub mod logging;
pub mod shutdown;

pub use config_loader::{figment_for, load_config, ENV_NESTING_SEPARATOR};
pub use logging::{get_log_level, init, init_with_config, set_log_level, LogConfig};
pub use shutdown::{wait_for_shutdown, ShutdownSignal};
