//! Configuration loading helpers
//!
//! Layering order, lowest priority first: serialized defaults, the optional config file
//! (format picked by extension), then prefixed environment variables.

use std::path::Path;

use errors::{NoiseError, NoiseResult};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

/// Separator for nested keys in environment variables (`NOISEMON_MONITOR__TICK_MS`)
pub const ENV_NESTING_SEPARATOR: &str = "__";

/// Build the layered figment for a config type
///
/// A missing `path` is not an error: the defaults and environment still apply. A path that
/// is given but does not exist is rejected, since the user asked for it explicitly.
pub fn figment_for<T>(path: Option<&Path>, env_prefix: &str) -> NoiseResult<Figment>
where
    T: Serialize + Default,
{
    let mut figment = Figment::from(Serialized::defaults(T::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(NoiseError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
            Some("toml") => figment.merge(Toml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            other => {
                return Err(NoiseError::invalid_config(
                    "config",
                    format!(
                        "unsupported config file extension {:?} for {}",
                        other,
                        path.display()
                    ),
                ))
            },
        };
        info!("Loading configuration from {}", path.display());
    } else {
        debug!("No config file given, using defaults and environment");
    }

    Ok(figment.merge(Env::prefixed(env_prefix).split(ENV_NESTING_SEPARATOR)))
}

/// Load a config type from defaults, optional file and environment
pub fn load_config<T>(path: Option<&Path>, env_prefix: &str) -> NoiseResult<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    let figment = figment_for::<T>(path, env_prefix)?;
    Ok(figment.extract()?)
}
