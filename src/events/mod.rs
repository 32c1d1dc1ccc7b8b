//! # Events Module
//!
//! Progress and status reporting for any UI layer.
//!
//! ## Design
//! Engine operations are plain synchronous calls. They take an
//! [`EventSender`] and report through it, so a host can run them on a
//! worker thread and render progress on its own thread.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Merge(MergeEvent::Progress(p)) = event {
//!             println!("{}/{}", p.processed, p.total);
//!         }
//!     }
//! });
//!
//! MergeEngine::new(config).run(&sender, &CancellationToken::new())?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
