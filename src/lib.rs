//! Presence relay library.
//!
//! Exposes the relay, the presence domain and the adapters so the binary
//! and the integration tests share one implementation.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod presence;
pub mod relay;

pub use config::RelayConfig;
pub use error::{Error, Result};
pub use relay::Relay;
