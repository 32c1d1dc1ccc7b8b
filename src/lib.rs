//! # Drive Dedup
//!
//! Finds duplicate files and duplicate folders on a volume, and merges
//! one volume's tree into another without losing either side's data.
//!
//! ## Core Philosophy
//! - **Never overwrite** - name clashes get a suffixed name
//! - **Set aside, don't delete** - redundant copies go to a holding area
//! - **Log everything** - every mutation is appended to a plain-text log
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - Discovery, dispositions, and merging
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DriveDedupError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. The filter is
/// read from `RUST_LOG`. Calling it twice leaves the first subscriber in
/// place.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
