//! JSON-lines event sink.

use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

use crate::error::Result;
use crate::port::{Event, Notifier};

/// Appends every event as one JSON object per line.
pub struct JsonlNotifier {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
}

impl JsonlNotifier {
    /// Open `path` for appending, creating it and its parent directory.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(LineWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Notifier for JsonlNotifier {
    fn notify(&self, event: Event) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!(event = event.name(), error = %e, "Failed to encode event");
                return;
            }
        };
        if let Err(e) = writeln!(self.writer.lock(), "{line}") {
            warn!(path = %self.path.display(), error = %e, "Failed to write event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RiskEvent, RiskEventKind};
    use rust_decimal_macros::dec;

    #[test]
    fn appends_tagged_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events/out.jsonl");
        let sink = JsonlNotifier::open(&path).unwrap();

        sink.notify(Event::RiskEventRaised(RiskEvent::new(
            RiskEventKind::EmergencyStop,
            "drawdown",
            dec!(9000),
        )));
        sink.notify(Event::RiskEventRaised(RiskEvent::new(
            RiskEventKind::Resumed,
            "manual",
            dec!(9000),
        )));

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "risk_event_raised");
        assert_eq!(first["reason"], "drawdown");
    }
}
