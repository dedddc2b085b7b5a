//! Status vocabulary returned by supervisor operations.
//!
//! The string forms (`started`, `killed:<pid>`, `error:<msg>`, ...) are the
//! wire contract of the control surface and must not change.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Phase
// ============================================================================

/// Observable supervisor phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// No worker is held.
    #[default]
    Idle,
    /// A worker handle is held.
    Running,
    /// A termination ladder is in flight.
    Stopping,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Running => write!(f, "running"),
            Phase::Stopping => write!(f, "stopping"),
        }
    }
}

// ============================================================================
// Start / Stop statuses
// ============================================================================

/// Status code of a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartStatus {
    AlreadyRunning,
    Started,
    Error(String),
}

impl fmt::Display for StartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartStatus::AlreadyRunning => write!(f, "already_running"),
            StartStatus::Started => write!(f, "started"),
            StartStatus::Error(msg) => write!(f, "error:{}", msg),
        }
    }
}

impl FromStr for StartStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "already_running" => Ok(StartStatus::AlreadyRunning),
            "started" => Ok(StartStatus::Started),
            _ => s
                .strip_prefix("error:")
                .map(|msg| StartStatus::Error(msg.to_string()))
                .ok_or_else(|| format!("unknown start status: {}", s)),
        }
    }
}

/// Status code of a stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopStatus {
    NotRunning,
    Killed(u32),
    Error(String),
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopStatus::NotRunning => write!(f, "not_running"),
            StopStatus::Killed(pid) => write!(f, "killed:{}", pid),
            StopStatus::Error(msg) => write!(f, "error:{}", msg),
        }
    }
}

impl FromStr for StopStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "not_running" {
            return Ok(StopStatus::NotRunning);
        }
        if let Some(pid) = s.strip_prefix("killed:") {
            return pid
                .parse()
                .map(StopStatus::Killed)
                .map_err(|e| format!("invalid pid in {}: {}", s, e));
        }
        s.strip_prefix("error:")
            .map(|msg| StopStatus::Error(msg.to_string()))
            .ok_or_else(|| format!("unknown stop status: {}", s))
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

string_serde!(StartStatus);
string_serde!(StopStatus);

// ============================================================================
// Reports
// ============================================================================

/// Response of a start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartReport {
    pub ok: bool,
    pub status: StartStatus,
    pub pid: Option<u32>,
}

impl StartReport {
    pub fn started(pid: u32) -> Self {
        Self {
            ok: true,
            status: StartStatus::Started,
            pid: Some(pid),
        }
    }

    pub fn already_running(pid: u32) -> Self {
        Self {
            ok: true,
            status: StartStatus::AlreadyRunning,
            pid: Some(pid),
        }
    }

    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            ok: false,
            status: StartStatus::Error(message.to_string()),
            pid: None,
        }
    }
}

/// Response of a stop request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopReport {
    pub ok: bool,
    pub status: StopStatus,
}

impl StopReport {
    pub fn not_running() -> Self {
        Self {
            ok: true,
            status: StopStatus::NotRunning,
        }
    }

    pub fn killed(pid: u32) -> Self {
        Self {
            ok: true,
            status: StopStatus::Killed(pid),
        }
    }

    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            ok: false,
            status: StopStatus::Error(message.to_string()),
        }
    }
}

/// Point-in-time view of the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatusReport {
    pub phase: Phase,
    pub pid: Option<u32>,
    pub launched_at: Option<DateTime<Utc>>,
}
