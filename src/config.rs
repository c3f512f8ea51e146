//! Relay configuration parameters
//!
//! All tunable parameters for the presence relay. Defaults reproduce the
//! field deployment; every value can be overridden from a JSON
//! file and then from the command line / environment (see `main.rs`).

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Hard ceiling for `max_clients`.
pub const MAX_CLIENTS_LIMIT: usize = 256;

/// Capacity of the device list inside one report.
pub const DEVICE_CAPACITY: usize = 32;

/// One row of the proximity table: readings strictly stronger than
/// `above_dbm` map to `level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub above_dbm: i32,
    pub level: i32,
}

/// Maps a non-neutral state-file symbol to the level it forces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub symbol: char,
    pub level: i32,
}

/// Decision tables, split out so the engine can borrow them alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionRules {
    /// Evaluated top to bottom, strongest threshold first.
    pub thresholds: Vec<ThresholdBand>,
    /// A found device must be strictly stronger than this to be considered.
    pub selection_floor_dbm: i32,
    pub overrides: Vec<OverrideRule>,
    /// Baseline state symbol an override edge must start from.
    pub neutral_symbol: char,
}

impl Default for DecisionRules {
    fn default() -> Self {
        Self {
            thresholds: vec![
                ThresholdBand { above_dbm: -40, level: 1 },
                ThresholdBand { above_dbm: -53, level: 2 },
                ThresholdBand { above_dbm: -128, level: 3 },
            ],
            selection_floor_dbm: -128,
            overrides: vec![
                OverrideRule { symbol: 'A', level: 4 },
                OverrideRule { symbol: 'B', level: 5 },
            ],
            neutral_symbol: '0',
        }
    }
}

/// Core relay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    // --- Network ---
    pub bind_address: IpAddr,
    pub port: u16,
    /// Maximum simultaneously connected sensor clients.
    pub max_clients: usize,

    // --- Reports ---
    /// Device entries kept per report; further entries are ignored.
    pub max_devices: usize,
    /// Longest accepted report line in bytes (without the delimiter).
    pub max_line_len: usize,

    // --- Fan-out ---
    /// Bytes that may queue for one slow client before it is dropped.
    pub max_outbound_bytes: usize,

    // --- Decision ---
    pub rules: DecisionRules,

    // --- Files ---
    /// File polled for the override state symbol.
    pub state_file: PathBuf,
    /// If set, the latest received report line is mirrored here.
    pub report_mirror: Option<PathBuf>,

    // --- Timing ---
    /// Housekeeping tick; bounds shutdown latency.
    pub tick_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            // Network
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 12345,
            max_clients: 16,

            // Reports
            max_devices: 8,
            max_line_len: 4096,

            // Fan-out
            max_outbound_bytes: 1024,

            rules: DecisionRules::default(),

            // Files
            state_file: PathBuf::from("command.txt"),
            report_mirror: None,

            tick_ms: 200,
        }
    }
}

impl RelayConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&text).map_err(ConfigError::Parse)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CLIENTS_LIMIT).contains(&self.max_clients) {
            return Err(ConfigError::ValidationFailed(
                "max_clients must be 1..=256",
            ));
        }
        if !(1..=DEVICE_CAPACITY).contains(&self.max_devices) {
            return Err(ConfigError::ValidationFailed("max_devices must be 1..=32"));
        }
        if self.max_line_len == 0 {
            return Err(ConfigError::ValidationFailed("max_line_len must be > 0"));
        }
        // One encoded level ("-2147483648\n") must always fit.
        if self.max_outbound_bytes < 12 {
            return Err(ConfigError::ValidationFailed(
                "max_outbound_bytes must be >= 12",
            ));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ValidationFailed("tick_ms must be > 0"));
        }
        self.rules.validate()
    }
}

impl DecisionRules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thresholds.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "thresholds must not be empty",
            ));
        }
        if self
            .thresholds
            .windows(2)
            .any(|w| w[0].above_dbm <= w[1].above_dbm)
        {
            return Err(ConfigError::ValidationFailed(
                "thresholds must be ordered strongest first",
            ));
        }
        if matches!(self.neutral_symbol, '\r' | '\n') {
            return Err(ConfigError::ValidationFailed(
                "neutral_symbol must not be a line terminator",
            ));
        }
        for (i, rule) in self.overrides.iter().enumerate() {
            if rule.symbol == self.neutral_symbol {
                return Err(ConfigError::ValidationFailed(
                    "override symbol must differ from neutral_symbol",
                ));
            }
            if self.overrides[..i].iter().any(|r| r.symbol == rule.symbol) {
                return Err(ConfigError::ValidationFailed(
                    "override symbols must be unique",
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    Io(std::io::Error),
    /// Config file is not valid JSON for [`RelayConfig`].
    Parse(serde_json::Error),
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config read failed: {}", e),
            Self::Parse(e) => write!(f, "config parse failed: {}", e),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::ValidationFailed(_) => None,
        }
    }
}
