//! Domain layer - Pure data models.
//!
//! This module contains the value types shared by the supervisor, the
//! termination ladder and the control surface. These types have no I/O
//! dependencies and can be tested in isolation.

mod handle;
mod outcome;
mod status;

// Re-export all domain types
pub use handle::{ProcessHandle, WorkerCommand};
pub use outcome::{SignalKind, TerminationOutcome};
pub use status::{Phase, StartReport, StartStatus, StatusReport, StopReport, StopStatus};
