//! Signal intents and termination outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Abstract termination intent, mapped by each backend to its native primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalKind {
    /// A request the target may intercept before exiting (SIGTERM, Ctrl+Break).
    Cooperative,
    /// A request the target cannot intercept (SIGKILL, TerminateProcess).
    Forceful,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Cooperative => write!(f, "cooperative"),
            SignalKind::Forceful => write!(f, "forceful"),
        }
    }
}

/// Result of one pass through the termination ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum TerminationOutcome {
    /// The process had already exited before any signal was sent.
    AlreadyNotRunning,
    /// The process honoured the cooperative group signal.
    KilledGracefully { pid: u32 },
    /// The process had to be removed with a forceful signal.
    KilledForcefully { pid: u32 },
    /// Exit could not be confirmed after every rung.
    Error { message: String },
}

impl TerminationOutcome {
    /// Whether the outcome confirms the worker is gone.
    pub fn is_terminal_success(&self) -> bool {
        !matches!(self, TerminationOutcome::Error { .. })
    }
}

impl fmt::Display for TerminationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationOutcome::AlreadyNotRunning => write!(f, "already not running"),
            TerminationOutcome::KilledGracefully { pid } => {
                write!(f, "PID {} exited after cooperative signal", pid)
            }
            TerminationOutcome::KilledForcefully { pid } => {
                write!(f, "PID {} removed forcefully", pid)
            }
            TerminationOutcome::Error { message } => write!(f, "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_success() {
        assert!(TerminationOutcome::AlreadyNotRunning.is_terminal_success());
        assert!(TerminationOutcome::KilledGracefully { pid: 1 }.is_terminal_success());
        assert!(TerminationOutcome::KilledForcefully { pid: 1 }.is_terminal_success());
        assert!(!TerminationOutcome::Error {
            message: "stuck".to_string()
        }
        .is_terminal_success());
    }

    #[test]
    fn test_display() {
        let outcome = TerminationOutcome::KilledForcefully { pid: 77 };
        assert_eq!(outcome.to_string(), "PID 77 removed forcefully");
        assert_eq!(SignalKind::Cooperative.to_string(), "cooperative");
    }
}
