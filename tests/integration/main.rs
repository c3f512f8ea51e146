//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters or real loopback sockets.

mod mock_source;
mod relay_tcp_tests;
mod service_tests;
