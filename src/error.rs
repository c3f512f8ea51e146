//! Unified error type for the relay.
//!
//! Only unrecoverable conditions live here. Per-connection failures
//! (reset, EOF, failed send) and malformed reports are handled where they
//! occur and never surface as an [`Error`].

use core::fmt;
use std::io;
use std::net::SocketAddr;

use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level relay error
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// The listening socket could not be created or bound.
    Bind { addr: SocketAddr, source: io::Error },
    /// Waiting for readiness on the listening socket failed.
    Listener(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Bind { addr, source } => write!(f, "bind {addr}: {source}"),
            Self::Listener(e) => write!(f, "listener: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Bind { source, .. } => Some(source),
            Self::Listener(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Relay-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
