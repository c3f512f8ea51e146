//! Presence report parser.
//!
//! Sensors send one JSON object per line, in one of two shapes:
//!
//! ```text
//! {"swing":0,"rssi":-48,"found":1}                                   legacy
//! {"swing":0,"devices":[{"mac":"AA:..","rssi":-48,"found":1}, ...]}  multi
//! ```
//!
//! Parsing is total: malformed input degrades to defaults or to an empty
//! device list, never to an error. Only complete, well-typed device
//! entries are kept. When the line as a whole is broken, entries of the
//! devices array that precede the damage still count.

use log::debug;
use serde_json::{Map, Value};

use crate::config::DEVICE_CAPACITY;

/// Longest device identifier kept (a MAC plus a spare byte).
pub const IDENT_CAPACITY: usize = 19;

/// Signal strength assumed when an entry omits `rssi`.
pub const DEFAULT_RSSI: i32 = -127;

pub type DeviceId = heapless::String<IDENT_CAPACITY>;
pub type DeviceList = heapless::Vec<DeviceReading, DEVICE_CAPACITY>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReading {
    pub id: DeviceId,
    pub rssi: i32,
    pub found: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceReport {
    /// Informational only; not used by the decision.
    pub swing: i32,
    pub devices: DeviceList,
}

/// Parse one report line, keeping at most `max_devices` entries.
pub fn parse_report(line: &str, max_devices: usize) -> PresenceReport {
    let max_devices = max_devices.min(DEVICE_CAPACITY);
    let mut report = PresenceReport::default();

    let obj = match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(obj)) => obj,
        Ok(_) => {
            debug!("report: not an object, ignoring");
            return report;
        }
        Err(e) => {
            debug!("report: malformed body ({}), salvaging device entries", e);
            return salvage_devices(line, max_devices);
        }
    };

    report.swing = obj.get("swing").and_then(as_i32).unwrap_or(0);

    match obj.get("devices") {
        Some(Value::Array(entries)) => {
            for entry in entries {
                if report.devices.len() >= max_devices {
                    break;
                }
                match entry.as_object().and_then(device_from) {
                    // Capacity is checked above; push cannot fail.
                    Some(dev) => {
                        let _ = report.devices.push(dev);
                    }
                    None => debug!("report: skipping malformed device entry"),
                }
            }
        }
        Some(_) => debug!("report: `devices` is not an array"),
        None => {
            if obj.contains_key("rssi") || obj.contains_key("found") {
                if let Some(dev) = device_from(&obj) {
                    let _ = report.devices.push(dev);
                }
            }
        }
    }

    report
}

/// Best-effort scan of a line that is not valid JSON as a whole.
///
/// Walks the `"devices":[` array one entry at a time and keeps every entry
/// that decodes, stopping at the first one that does not. Lines without a
/// devices array yield an empty report.
fn salvage_devices(line: &str, max_devices: usize) -> PresenceReport {
    let mut report = PresenceReport::default();
    let Some(mut rest) = array_after_key(line, "devices") else {
        return report;
    };

    report.swing = value_after_key(line, "swing")
        .as_ref()
        .and_then(as_i32)
        .unwrap_or(0);

    while report.devices.len() < max_devices {
        rest = rest.trim_start();
        if !rest.starts_with('{') {
            break;
        }
        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
        let Some(Ok(entry)) = stream.next() else {
            debug!("report: stopped at undecodable device entry");
            break;
        };
        rest = &rest[stream.byte_offset()..];

        match entry.as_object().and_then(device_from) {
            Some(dev) => {
                let _ = report.devices.push(dev);
            }
            None => debug!("report: skipping malformed device entry"),
        }

        match rest.trim_start().strip_prefix(',') {
            Some(next) => rest = next,
            None => break,
        }
    }

    debug!("report: salvaged {} device(s)", report.devices.len());
    report
}

/// Text following `"key"` and its colon.
fn after_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let quoted = format!("\"{key}\"");
    let start = line.find(&quoted)? + quoted.len();
    line[start..].trim_start().strip_prefix(':')
}

/// Contents of the array value of `key`, starting just past the `[`.
fn array_after_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    after_key(line, key)?.trim_start().strip_prefix('[')
}

/// The single JSON value following `key`, if it decodes.
fn value_after_key(line: &str, key: &str) -> Option<Value> {
    let rest = after_key(line, key)?;
    serde_json::Deserializer::from_str(rest)
        .into_iter::<Value>()
        .next()?
        .ok()
}

/// Build a reading from `mac`/`rssi`/`found` fields. Absent fields take
/// defaults; a present field of the wrong type rejects the whole entry.
fn device_from(obj: &Map<String, Value>) -> Option<DeviceReading> {
    let id = match obj.get("mac") {
        None => DeviceId::new(),
        Some(Value::String(s)) => truncate_ident(s),
        Some(_) => return None,
    };
    let rssi = match obj.get("rssi") {
        None => DEFAULT_RSSI,
        Some(v) => as_i32(v)?,
    };
    let found = match obj.get("found") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(v) => as_i32(v)? != 0,
    };
    Some(DeviceReading { id, rssi, found })
}

fn as_i32(v: &Value) -> Option<i32> {
    v.as_i64().and_then(|n| i32::try_from(n).ok())
}

fn truncate_ident(s: &str) -> DeviceId {
    let mut out = DeviceId::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
