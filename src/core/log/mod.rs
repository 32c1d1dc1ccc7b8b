//! Append-only plain-text action log.
//!
//! One header line per run and one `action: src -> dst` line per
//! mutation. The file is opened in append mode and never truncated.

use crate::events::{ActionEvent, Event, EventSender};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Handle to the log file of one run
#[derive(Debug)]
pub struct ActionLog {
    path: PathBuf,
    file: File,
}

impl ActionLog {
    /// Open (creating if needed) the log at `path` for appending.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the run header.
    pub fn header(
        &mut self,
        operation: &str,
        source: &Path,
        destination: &Path,
        mode: &str,
    ) -> std::io::Result<()> {
        writeln!(
            self.file,
            "\n=== {} started {} | source: {} | destination: {} | mode: {} ===",
            operation,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            source.display(),
            destination.display(),
            mode
        )
    }

    /// Record one mutation and return the line that was written.
    pub fn action(&mut self, action: &str, from: &Path, to: &Path) -> String {
        let line = format_action(action, from, to);
        self.line(&line);
        line
    }

    /// Append a free-form line. Write failures are reported via tracing only.
    pub fn line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.file, "{}", line) {
            tracing::warn!(log = %self.path.display(), error = %e, "failed to append to action log");
        }
    }

    /// Record an action, mirror it to the event channel, and return it.
    pub fn record(
        &mut self,
        events: &EventSender,
        action: &str,
        from: &Path,
        to: &Path,
    ) -> String {
        let line = self.action(action, from, to);
        tracing::debug!("{}", line);
        events.send(Event::Action(ActionEvent::Applied { line: line.clone() }));
        line
    }

    /// Record a per-item failure.
    pub fn failure(&mut self, events: &EventSender, message: &str) {
        tracing::warn!("{}", message);
        self.line(&format!("error: {}", message));
        events.send(Event::Action(ActionEvent::Failed {
            message: message.to_string(),
        }));
    }
}

/// `action: src -> dst`
pub fn format_action(action: &str, from: &Path, to: &Path) -> String {
    format!("{}: {} -> {}", action, from.display(), to.display())
}
