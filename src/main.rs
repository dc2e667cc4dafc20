//! # Voxel Sync Entry Point
//!
//! Native entry point. Calls into the library's `run()`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --world-url ws://127.0.0.1:8080 --roster-url ws://127.0.0.1:8081
//! ```

fn main() {
    voxel_sync::run();
}
