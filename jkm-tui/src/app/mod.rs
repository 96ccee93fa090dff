//! Application module
//!
//! Contains the core application architecture:
//! - Events: what can happen
//! - Commands: deferred work, as data
//! - Router: which mode is active and what each event does to it
//! - Reconcile: keeping the list selection across refreshes
//!
//! Event handlers never perform I/O. They return commands, and the executor
//! (see `services.rs`) turns those back into events.

pub mod command;
pub mod event;
pub mod input;
pub mod reconcile;
pub mod router;

// Re-export commonly used types
pub use command::{perform, Command, Task};
pub use event::Event;
pub use reconcile::reconcile;
pub use router::{Mode, Router, View};
