//! Configuration for the supervisor and its control server.
//!
//! Stores configuration in JSON format at `~/.agentd/config.json`.
//! A missing file yields the defaults; every field may be omitted.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::application::EscalationBudget;
use crate::domain::WorkerCommand;
use crate::error::{Error, Result};

/// Default control server address.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Address the control server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Command line of the supervised worker.
    #[serde(default)]
    pub worker: WorkerCommand,

    /// Termination ladder budgets.
    #[serde(default)]
    pub escalation: EscalationConfig,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            worker: WorkerCommand::default(),
            escalation: EscalationConfig::default(),
        }
    }
}

impl Config {
    /// Check the invariants the supervisor relies on.
    pub fn validate(&self) -> Result<()> {
        if self.worker.program.trim().is_empty() {
            return Err(Error::Config("worker program must not be empty".to_string()));
        }

        self.listen_addr.parse::<SocketAddr>().map_err(|e| {
            Error::Config(format!("invalid listen address {}: {}", self.listen_addr, e))
        })?;

        self.escalation.validate()
    }

    /// Parsed listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address {}: {}", self.listen_addr, e)))
    }
}

/// Per-rung timeouts in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationConfig {
    #[serde(default = "default_timeout_ms")]
    pub graceful_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub forceful_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub direct_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            graceful_timeout_ms: default_timeout_ms(),
            forceful_timeout_ms: default_timeout_ms(),
            direct_timeout_ms: default_timeout_ms(),
        }
    }
}

impl EscalationConfig {
    /// Timeouts must be positive and non-decreasing along the ladder.
    pub fn validate(&self) -> Result<()> {
        let rungs = [
            ("gracefulTimeoutMs", self.graceful_timeout_ms),
            ("forcefulTimeoutMs", self.forceful_timeout_ms),
            ("directTimeoutMs", self.direct_timeout_ms),
        ];

        if let Some((name, _)) = rungs.iter().find(|(_, ms)| *ms == 0) {
            return Err(Error::Config(format!("{} must be greater than zero", name)));
        }

        if self.graceful_timeout_ms > self.forceful_timeout_ms
            || self.forceful_timeout_ms > self.direct_timeout_ms
        {
            return Err(Error::Config(
                "escalation timeouts must satisfy graceful <= forceful <= direct".to_string(),
            ));
        }

        Ok(())
    }

    pub fn budget(&self) -> EscalationBudget {
        EscalationBudget {
            graceful: Duration::from_millis(self.graceful_timeout_ms),
            forceful: Duration::from_millis(self.forceful_timeout_ms),
            direct: Duration::from_millis(self.direct_timeout_ms),
        }
    }
}

/// Configuration store backed by a JSON file.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.agentd/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".agentd").join("config.json"),
        })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(config)?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }
}
