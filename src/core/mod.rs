//! # Core Module
//!
//! Ambient building blocks shared by the sync state and the transports:
//! the error type, runtime configuration, and the two shared-value
//! containers used to hand state across ownership boundaries.
//!
//! ## Key Components
//! - `SyncError`: every recoverable failure in the crate
//! - `SyncConfig`: endpoints, throttle window, colors, loop timing
//! - `MtResource`: `Arc<RwLock<T>>` wrapper shared with transport worker threads
//! - `StResource`: `Rc<RefCell<T>>` wrapper for single-threaded sharing

pub mod config;
pub mod error;

pub mod mt_resource;
pub mod st_resource;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use mt_resource::MtResource;
pub use st_resource::StResource;
