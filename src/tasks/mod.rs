//! Background Tasks Module
//!
//! Periodic maintenance tasks owned by individual caches.
//!
//! # Tasks
//! - Expiry sweep: removes expired entries that are never read again

mod sweep;

pub use sweep::spawn_sweep_task;
