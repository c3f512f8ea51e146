//! Report mirror adapter.
//!
//! Implements [`EventSink`] by overwriting a file with the most recent raw
//! report line (plus `\n`) every time one arrives. Other events are ignored.
//! Write failures are logged and otherwise swallowed.

use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

pub struct ReportMirror {
    path: PathBuf,
    failed: bool,
}

impl ReportMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            failed: false,
        }
    }

    fn write_line(&mut self, line: &str) {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        match fs::write(&self.path, buf) {
            Ok(()) => self.failed = false,
            Err(e) => {
                // Warn once per failure streak.
                if !self.failed {
                    warn!("report mirror {}: {}", self.path.display(), e);
                }
                self.failed = true;
            }
        }
    }
}

impl EventSink for ReportMirror {
    fn emit(&mut self, event: &AppEvent<'_>) {
        if let AppEvent::ReportReceived { line, .. } = event {
            self.write_line(line);
        }
    }
}
