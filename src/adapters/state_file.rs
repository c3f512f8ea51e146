//! State-file override source.
//!
//! Implements [`OverrideSource`] by reading the first symbol of a small text
//! file on every poll. An external producer rewrites that file (one symbol,
//! optionally followed by a newline); the relay only ever reads it.
//!
//! Missing, unreadable, or empty files yield `None`. Read errors are logged
//! at debug level only when their kind changes, so a permanently absent file
//! does not flood the log.

use std::fs;
use std::io;
use std::path::PathBuf;

use log::debug;

use crate::app::ports::OverrideSource;

pub struct FileOverrideSource {
    path: PathBuf,
    last_error: Option<io::ErrorKind>,
}

impl FileOverrideSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_error: None,
        }
    }
}

impl OverrideSource for FileOverrideSource {
    fn poll(&mut self) -> Option<char> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                self.last_error = None;
                first_symbol(&bytes)
            }
            Err(e) => {
                if self.last_error != Some(e.kind()) {
                    debug!("state file {}: {}", self.path.display(), e);
                    self.last_error = Some(e.kind());
                }
                None
            }
        }
    }
}

/// First character of `bytes`, skipping line terminators.
fn first_symbol(bytes: &[u8]) -> Option<char> {
    String::from_utf8_lossy(bytes)
        .chars()
        .find(|c| !matches!(c, '\r' | '\n'))
}
