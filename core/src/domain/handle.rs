//! Worker command and process handle domain models.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// WorkerCommand
// ============================================================================

/// Fully resolved command line for the supervised worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerCommand {
    /// Executable to run (absolute path or looked up in `PATH`).
    pub program: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory; inherits the supervisor's when unset.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables layered over the inherited environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl WorkerCommand {
    /// Create a command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl Default for WorkerCommand {
    fn default() -> Self {
        Self::new("python3").args(["-u", "agent_direct.py"])
    }
}

impl fmt::Display for WorkerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

// ============================================================================
// ProcessHandle
// ============================================================================

/// Identity of a launched worker.
///
/// A fresh handle is minted on every launch and is never reused, even when
/// the OS recycles the pid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessHandle {
    /// Unique launch identifier.
    pub id: Uuid,
    /// Platform process id.
    pub pid: u32,
    /// Process group the worker leads.
    pub pgid: u32,
    /// When the worker was launched.
    pub launched_at: DateTime<Utc>,
}

impl ProcessHandle {
    /// Mint a handle for a freshly launched group leader.
    pub fn new(pid: u32) -> Self {
        Self::with_group(pid, pid)
    }

    /// Mint a handle whose group id differs from its pid.
    pub fn with_group(pid: u32, pgid: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            pid,
            pgid,
            launched_at: Utc::now(),
        }
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID {} (group {})", self.pid, self.pgid)
    }
}
