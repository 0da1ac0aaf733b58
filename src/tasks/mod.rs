//! Background Tasks Module
//!
//! Contains background tasks that run periodically during service operation.
//!
//! # Tasks
//! - Purge: deletes entries stale for longer than a grace period (opt-in)

mod purge;

pub use purge::spawn_purge_task;
