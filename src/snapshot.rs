//! Status wire types
//!
//! Mirrors the JSON payload served by the watcher's status endpoint.
//! Deserialization is deliberately lenient: the display keeps polling
//! through partial payloads, so absent sub-fields become `None` or a
//! default instead of aborting the cycle. The one hard validity signal
//! is the presence of the `printing` key.

use crate::series::Channel;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single timestamped measurement: `[unix_millis, value]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(i64, f64)")]
pub struct TimedPoint {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Measured value (mm/sec)
    pub value: f64,
}

impl TimedPoint {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Timestamp as a chrono datetime (UTC)
    pub fn datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp)
            .single()
            .unwrap_or_default()
    }
}

// The server reports millisecond timestamps as JSON numbers, sometimes
// fractional. Accept either and truncate to whole milliseconds.
impl From<(f64, f64)> for TimedPoint {
    fn from((timestamp, value): (f64, f64)) -> Self {
        Self {
            timestamp: timestamp as i64,
            value,
        }
    }
}

impl From<TimedPoint> for (i64, f64) {
    fn from(point: TimedPoint) -> Self {
        (point.timestamp, point.value)
    }
}

/// Scalar the server may report as a number or as preformatted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldText {
    Number(f64),
    Text(String),
}

impl fmt::Display for FieldText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldText::Number(n) => write!(f, "{}", n),
            FieldText::Text(s) => f.write_str(s),
        }
    }
}

/// One server-reported status payload for a poll cycle.
///
/// Unknown keys are ignored so the server can grow the payload without
/// breaking older displays.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    /// Presence of this field marks the whole payload as valid
    pub printing: Option<bool>,
    /// Filament-feed alarm flag
    #[serde(default)]
    pub alarm: bool,
    /// Whether the alarm is armed
    #[serde(default)]
    pub valid: bool,
    /// Seconds until the alarm arms; meaningful only while printing and not yet valid
    pub time_to_valid: Option<f64>,
    /// Human-readable printer state
    pub summary: Option<String>,
    /// Encoder position of the filament sensor
    pub filament_pos: Option<FieldText>,
    /// Byte position within the file being printed
    pub file_pos: Option<FieldText>,
    pub bed_actual: Option<f64>,
    pub bed_target: Option<f64>,
    pub tool0_actual: Option<f64>,
    pub tool0_target: Option<f64>,
    /// Recent log lines, preformatted by the server
    pub log_msgs: Option<String>,
    /// Newest commanded feed-rate point
    pub gcode: Option<TimedPoint>,
    /// Newest measured feed-rate point
    pub actual: Option<TimedPoint>,
    /// Server-retained commanded history window, chronological
    #[serde(default)]
    pub gcode_history: Vec<TimedPoint>,
    /// Server-retained measured history window, chronological
    #[serde(default)]
    pub actual_history: Vec<TimedPoint>,
    /// Point cap the server intends the client to retain
    pub history_length: Option<usize>,
}

impl Snapshot {
    /// Whether the payload carries the validity sentinel.
    pub fn is_valid(&self) -> bool {
        self.printing.is_some()
    }

    /// The newest single point for one channel.
    pub fn point(&self, channel: Channel) -> Option<TimedPoint> {
        match channel {
            Channel::Gcode => self.gcode,
            Channel::Actual => self.actual,
        }
    }

    /// The server's history window for one channel.
    pub fn history(&self, channel: Channel) -> &[TimedPoint] {
        match channel {
            Channel::Gcode => &self.gcode_history,
            Channel::Actual => &self.actual_history,
        }
    }
}
