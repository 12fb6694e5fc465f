//! Asynchronous helpers
//!
//! Provides progress monitoring over a batch of independently running
//! futures, e.g. weight fetches feeding a loading bar.

mod progress;

pub use progress::{monitor_promises_progress, try_monitor_promises_progress};
