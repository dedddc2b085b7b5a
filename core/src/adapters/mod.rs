//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with the host OS.

pub mod process;

// Re-export main types for convenience
pub use process::PlatformBackend;
