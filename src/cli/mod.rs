//! Command-line host adapter
//!
//! Each invocation translates one lifecycle event (install, activate,
//! request, message) into a call on [`crate::ServiceWorker`] backed by disk
//! stores and the HTTP fetcher.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
