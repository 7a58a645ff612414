//! Data-directory resolution and `config.toml` loading.
//!
//! Reads `config.toml` from the data directory (`~/.evoke` in production,
//! `EVOKE_DATA_DIR` override) and deserializes it into
//! [`EngineConfig`]. Falls back to defaults when the file is missing or
//! malformed -- a broken config never prevents the engine from starting.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use evoke_types::config::EngineConfig;

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolve the Evoke data directory.
///
/// `EVOKE_DATA_DIR` wins when set; otherwise `~/.evoke`, with a relative
/// `.evoke` as the last resort when no home directory is known.
pub fn data_dir() -> PathBuf {
    resolve_data_dir(std::env::var_os("EVOKE_DATA_DIR"), dirs::home_dir())
}

fn resolve_data_dir(env_override: Option<OsString>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_override {
        return PathBuf::from(dir);
    }
    match home {
        Some(home) => home.join(".evoke"),
        None => PathBuf::from(".evoke"),
    }
}

/// Load engine configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`EngineConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
/// - Otherwise: the parsed config (unset fields keep their defaults).
pub async fn load_config(data_dir: &Path) -> EngineConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "no config.toml at {}, using defaults",
                config_path.display()
            );
            return EngineConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return EngineConfig::default();
        }
    };

    match toml::from_str::<EngineConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            EngineConfig::default()
        }
    }
}
