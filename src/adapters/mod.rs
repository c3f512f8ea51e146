//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter         | Implements     | Connects to                   |
//! |-----------------|----------------|-------------------------------|
//! | `log_sink`      | EventSink      | `log` facade (env_logger)     |
//! | `report_mirror` | EventSink      | last-report text file         |
//! | `state_file`    | OverrideSource | externally written state file |

pub mod log_sink;
pub mod report_mirror;
pub mod state_file;
