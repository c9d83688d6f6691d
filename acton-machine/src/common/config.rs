/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::actor::RestartLimiterConfig;

/// Configuration for the Acton Machine runtime.
///
/// Loaded from `acton-machine/config.toml` in the XDG config directories by
/// [`MachineConfig::load`]; every section and field falls back to its default
/// when absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Default restart budget for `restart_on_failure` supervision
    pub supervision: RestartLimiterConfig,
    /// Default values configuration
    pub defaults: DefaultsConfig,
}

/// Timeout-related configuration values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Default `ask` timeout in milliseconds
    pub ask_timeout_ms: u64,
    /// Time a parent waits for each child to stop, in milliseconds
    pub child_stop_timeout_ms: u64,
    /// Time `shutdown_all` waits for every root to stop, in milliseconds
    pub system_shutdown_timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            ask_timeout_ms: 5_000,
            child_stop_timeout_ms: 10_000,
            system_shutdown_timeout_ms: 30_000,
        }
    }
}

/// Default configuration values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Prefix of generated root actor ids
    pub root_name: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            root_name: "actor".to_string(),
        }
    }
}

impl MachineConfig {
    /// Default `ask` timeout.
    #[must_use]
    pub const fn ask_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.ask_timeout_ms)
    }

    /// Per-child stop timeout.
    #[must_use]
    pub const fn child_stop_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.child_stop_timeout_ms)
    }

    /// Whole-system shutdown timeout.
    #[must_use]
    pub const fn system_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.system_shutdown_timeout_ms)
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is not valid TOML or a field has the wrong type.
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        toml::from_str(source).context("invalid acton-machine configuration")
    }

    /// Reads and parses the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Loads configuration from XDG-compliant locations, falling back to defaults.
    ///
    /// Searches, in order:
    /// 1. `$XDG_CONFIG_HOME/acton-machine/config.toml`
    /// 2. `acton-machine/config.toml` under each of `$XDG_CONFIG_DIRS`
    ///
    /// A missing file is not an error. An unreadable or malformed file is
    /// logged and ignored.
    #[must_use]
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix("acton-machine") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match Self::load_from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("{:#}; using defaults", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MachineConfig::default();
        assert_eq!(config.ask_timeout(), Duration::from_secs(5));
        assert_eq!(config.child_stop_timeout(), Duration::from_secs(10));
        assert_eq!(config.system_shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.supervision.max_restarts, 3);
        assert_eq!(config.defaults.root_name, "actor");
    }

    #[test]
    fn partial_documents_keep_remaining_defaults() {
        let config = MachineConfig::from_toml_str(
            r"
            [timeouts]
            ask_timeout_ms = 250

            [supervision]
            max_restarts = 7
            ",
        )
        .unwrap();

        assert_eq!(config.ask_timeout(), Duration::from_millis(250));
        assert_eq!(config.timeouts.child_stop_timeout_ms, 10_000);
        assert_eq!(config.supervision.max_restarts, 7);
        assert_eq!(config.supervision.restart_window_ms, 60_000);
        assert_eq!(config.defaults.root_name, "actor");
    }

    #[test]
    fn wrong_types_are_rejected() {
        let err = MachineConfig::from_toml_str("[timeouts]\nask_timeout_ms = \"soon\"").unwrap_err();
        assert!(format!("{err:#}").contains("invalid acton-machine configuration"));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = MachineConfig::default();
        let rendered = toml::to_string(&config).unwrap();
        assert_eq!(MachineConfig::from_toml_str(&rendered).unwrap(), config);
    }
}
