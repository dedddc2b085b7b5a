//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with the host OS. Implementations live in `adapters`.

mod backend;

pub use backend::ProcessBackend;
