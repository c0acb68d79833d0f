//! Operator-tunable run configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Top-level run configuration.
///
/// `window_sec` and `hop_sec` are declared but not consumed by any stage —
/// they are reserved for a future sliding-window mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Reserved; not consumed by the core in the current design.
    pub window_sec: u64,
    /// Reserved; not consumed.
    pub hop_sec: u64,
    /// Dedup window, in seconds.
    pub dedup_ttl_sec: i64,
    /// Episode split threshold, in seconds.
    pub episode_gap_sec: i64,
    /// Lead-lag search bound, in seconds (converted to bins per situation bin width).
    pub max_lag_sec: i64,
    /// Minimum co-occurrence / aligned-burst count required for emission.
    pub min_support: usize,
    /// Path to the optional external adjacency-graph document.
    pub graph: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            window_sec: 900,
            hop_sec: 1,
            dedup_ttl_sec: 120,
            episode_gap_sec: 300,
            max_lag_sec: 90,
            min_support: 3,
            graph: None,
        }
    }
}

impl RunConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ALERT_ENGINE_CONFIG` environment variable
    /// 2. `./alert_engine.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ALERT_ENGINE_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "loaded run config from ALERT_ENGINE_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "failed to load config from ALERT_ENGINE_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "ALERT_ENGINE_CONFIG points to a non-existent file, falling back");
            }
        }

        let default_path = Path::new("alert_engine.toml");
        if default_path.exists() {
            match Self::load_from_file(default_path) {
                Ok(config) => {
                    info!("loaded run config from ./alert_engine.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "failed to load ./alert_engine.toml, falling back to defaults");
                }
            }
        }

        info!("using built-in default run config");
        Self::default()
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
