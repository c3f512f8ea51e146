//! Application core: the per-line pipeline and its ports.
//!
//! All interaction with the filesystem and log output happens through the
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real files or sockets.

pub mod events;
pub mod ports;
pub mod service;
