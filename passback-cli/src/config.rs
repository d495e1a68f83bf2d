//! CLI configuration file
//!
//! A TOML file combining the server bind address with the core's
//! reconciliation settings:
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 7435
//!
//! [core]
//! session_ttl_secs = 7200
//! score_maximum = 100.0
//! report_attempts = true
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use passback_core::PassbackConfig;
use passback_server::ServerConfig;

/// Default bind host for `passback serve`
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default port for `passback serve`
pub const DEFAULT_PORT: u16 = 7435;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub host: String,
    pub port: u16,
    pub core: PassbackConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            core: PassbackConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load a config file, or defaults when `path` is None
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.host.clone(), self.port)
    }
}
