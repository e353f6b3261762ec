//! assetsync - Offline-first asset cache synchronizer
//!
//! Keeps a local cache of a web application's static assets in step with
//! the deployed resource manifest: stages the shell at install time,
//! evicts only changed resources at activation, and serves requests
//! cache-first (the root document online-first).

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod installer;
pub mod lifecycle;
pub mod manifest;
pub mod network;
pub mod offline;
pub mod reconcile;
pub mod resource;
pub mod router;
pub mod store;

pub use error::{AssetSyncError, AssetSyncResult};
pub use lifecycle::{Command, CommandOutcome, Host, ServiceWorker};
pub use manifest::{Bundle, ResourceManifest, ShellSet};
pub use network::{Fetcher, HttpFetcher};
pub use reconcile::{Activation, ActivationKind};
pub use resource::{Origin, Request, Response};
pub use store::{CacheSet, CacheStore};
