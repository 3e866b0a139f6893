//! Noise monitor service
//!
//! Wires the alert session from `noise-core` to the collaborators in `noise-clients`
//! and drives it from a tokio task, with a terminal dashboard on top.

pub mod args;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod monitor;

pub use config::NoisemonConfig;
pub use monitor::{Collaborators, Command, Monitor, MonitorHandle, MonitorSettings};
