//! jkm-tui library
//!
//! Exports the router, views and runtime pieces for the `jkm` binary and
//! for testing.

pub mod app;
pub mod error;
pub mod services;
pub mod terminal;
pub mod views;

// Re-export commonly used types
pub use app::{reconcile, Command, Event, Mode, Router, Task};
pub use error::{Result, TuiError};
