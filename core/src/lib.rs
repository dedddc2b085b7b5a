//! agentd Core Library
//!
//! Supervises a single long-running worker process.
//! Provides functionality to:
//! - Launch the worker in its own process group, at most once at a time
//! - Stop it through a bounded ladder of increasingly forceful signals
//! - Report machine-readable status codes for every request
//! - Load and validate supervisor configuration
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models and status vocabulary
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: Platform process backends
//! - `application`: Supervisor and termination ladder
//!
//! # Platform Support
//! - Unix: `setpgid` process groups, `killpg`/`kill` via `nix`
//! - Windows: `CREATE_NEW_PROCESS_GROUP`, Ctrl+Break, `taskkill`, `TerminateProcess`

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{
    Phase, ProcessHandle, SignalKind, StartReport, StartStatus, StatusReport, StopReport,
    StopStatus, TerminationOutcome, WorkerCommand,
};

// Re-export other commonly used types
pub use adapters::PlatformBackend;
pub use application::{EscalationBudget, Escalator, Supervisor};
pub use config::{Config, ConfigStore, EscalationConfig};
pub use error::{Error, LaunchError, Result, SignalError};
pub use ports::ProcessBackend;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Supervisor wired to the backend of the current platform.
pub type PlatformSupervisor = Supervisor<PlatformBackend>;
