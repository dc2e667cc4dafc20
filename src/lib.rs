#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Sync
//!
//! Client-side synchronization core for a shared voxel world.
//!
//! Two independent remote streams feed the client: a world channel carrying
//! placed cells and a roster channel carrying participants. This crate keeps
//! a local replica of each, applies local edits optimistically, reconciles
//! full server snapshots without echoing them back, and rate-limits outbound
//! position updates.
//!
//! ## Key Modules
//!
//! * `sync_state` - Replicas, wire protocol, reconciliation, move throttle and
//!   the [`sync_state::SyncCore`] that ties them together
//! * `channel` - The [`channel::Channel`] abstraction with WebSocket and
//!   in-memory implementations
//! * `core` - Configuration, errors and shared resource wrappers
//! * `application_state` - The headless runner: event loop, reconnects and
//!   console commands
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     voxel_sync::run();
//! }
//! ```

use clap::Parser;
use log::info;

pub mod application_state;
pub mod channel;
pub mod core;
pub mod sync_state;

use application_state::{run_app, Args};

/// Initializes logging, parses flags and runs the client until it quits.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let args = Args::parse();
    if let Err(e) = run_app(args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
