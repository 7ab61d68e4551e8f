// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline configuration
//!
//! The exclusion-gate wait bounds are empirically chosen constants in the
//! reference system; they are exposed here as configuration rather than
//! hardcoded, with the original magnitudes as defaults.

use crate::constants;
use crate::errors::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bounded wait for frame delivery; on timeout the frame is dropped
    pub frame_wait_ms: u64,
    /// Bounded wait for next/previous effect; on timeout the request is skipped
    pub nav_wait_ms: u64,
    /// Bounded wait for tap-to-focus; on timeout the request is skipped
    pub focus_wait_ms: u64,
    /// Retry interval for teardown and activation rebind (retried until acquired)
    pub teardown_retry_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_wait_ms: constants::DEFAULT_FRAME_WAIT_MS,
            nav_wait_ms: constants::DEFAULT_NAV_WAIT_MS,
            focus_wait_ms: constants::DEFAULT_FOCUS_WAIT_MS,
            teardown_retry_ms: constants::DEFAULT_TEARDOWN_RETRY_MS,
        }
    }
}

impl PipelineConfig {
    pub fn frame_wait(&self) -> Duration {
        Duration::from_millis(self.frame_wait_ms)
    }

    pub fn nav_wait(&self) -> Duration {
        Duration::from_millis(self.nav_wait_ms)
    }

    pub fn focus_wait(&self) -> Duration {
        Duration::from_millis(self.focus_wait_ms)
    }

    pub fn teardown_retry(&self) -> Duration {
        Duration::from_millis(self.teardown_retry_ms)
    }

    /// Default config file location (`$XDG_CONFIG_HOME/viewfinder/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("viewfinder").join("config.json"))
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Load from the given path, falling back to the default location and
    /// finally to built-in defaults. A malformed file logs a warning rather
    /// than failing startup.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let candidate = path
            .map(PathBuf::from)
            .or_else(Self::default_path);

        match candidate {
            Some(p) if p.exists() => match Self::load(&p) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %p.display(), error = %e, "Ignoring malformed config");
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    /// Write configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents =
            serde_json::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
