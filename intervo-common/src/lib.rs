//! Shared types for the Intervo interview platform
//!
//! Provides the data model (sessions, steps, evaluations), the session status
//! state machine, the real-time wire protocol, and the common error type used
//! by both the API server and any future worker binaries.

pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
