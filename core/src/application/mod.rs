//! Application layer - Use case services.
//!
//! This module contains the services that orchestrate domain logic and
//! backend interactions:
//! - `escalator`: the bounded termination ladder
//! - `supervisor`: the lock-serialized owner of the single worker
//!
//! Services depend only on the `ProcessBackend` port, so tests inject a
//! scripted backend instead of real processes.

mod escalator;
mod supervisor;

#[cfg(test)]
pub(crate) mod fake;

pub use escalator::{EscalationBudget, Escalator, EXHAUSTED_MESSAGE};
pub use supervisor::Supervisor;
