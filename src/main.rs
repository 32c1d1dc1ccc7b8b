//! # drive-dedup CLI
//!
//! Command-line interface for the drive deduplication engine.
//!
//! ## Usage
//! ```bash
//! drive-dedup scan /mnt/archive --output json
//! drive-dedup organize /mnt/archive --files keep-first --folders merge
//! drive-dedup merge /mnt/new-drive /mnt/old-drive
//! ```

mod cli;

use drive_dedup::Result;

fn main() -> Result<()> {
    drive_dedup::init_tracing();
    cli::run()
}
