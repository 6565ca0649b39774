//! Snapshot reconciliation
//!
//! The heart of the crate. Each poll cycle the reconciler compares the
//! client's retained series against the server's authoritative history
//! window and decides between a wholesale reload and an incremental
//! append, then projects the snapshot's status fields into display text
//! for the renderer.
//!
//! A reload is needed when the server holds more history than the
//! client, or when the oldest retained points disagree by more than the
//! skew tolerance (a tablet suspending and resuming mid-session leaves
//! the client with a stale window that no amount of appending can fix).

use crate::series::{Channel, SeriesState};
use crate::snapshot::{Snapshot, TimedPoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default tolerance between the client's and server's oldest retained
/// points before the window is considered skewed.
pub const DEFAULT_DRIFT_TOLERANCE_MS: i64 = 10_000;

/// Where the per-series retention cap comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionCap {
    /// Use the `history_length` the server reports each cycle
    ServerProvided,
    /// Keep a fixed point count regardless of what the server reports
    Fixed(usize),
}

impl RetentionCap {
    /// Resolve against a snapshot. `None` means no cap and no eviction.
    fn resolve(&self, snapshot: &Snapshot) -> Option<usize> {
        match self {
            RetentionCap::Fixed(cap) => Some(*cap),
            RetentionCap::ServerProvided => snapshot.history_length,
        }
    }
}

/// Reconciler tuning and display-field selection.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub retention_cap: RetentionCap,
    /// Window-skew tolerance in milliseconds
    pub drift_tolerance_ms: i64,
    /// Which fields to project, in display order
    pub display_fields: Vec<DisplayField>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            retention_cap: RetentionCap::ServerProvided,
            drift_tolerance_ms: DEFAULT_DRIFT_TOLERANCE_MS,
            display_fields: DisplayField::all().to_vec(),
        }
    }
}

/// Named display slots the reconciler can project into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayField {
    Printing,
    Alarm,
    Armed,
    Summary,
    FilamentPos,
    FilePos,
    Bed,
    Tool0,
    LogMsgs,
}

impl DisplayField {
    /// All fields, in default display order
    pub fn all() -> &'static [DisplayField] {
        &[
            DisplayField::Printing,
            DisplayField::Alarm,
            DisplayField::Armed,
            DisplayField::Summary,
            DisplayField::FilamentPos,
            DisplayField::FilePos,
            DisplayField::Bed,
            DisplayField::Tool0,
            DisplayField::LogMsgs,
        ]
    }
}

impl fmt::Display for DisplayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayField::Printing => "printing",
            DisplayField::Alarm => "alarm",
            DisplayField::Armed => "armed",
            DisplayField::Summary => "summary",
            DisplayField::FilamentPos => "filament_pos",
            DisplayField::FilePos => "file_pos",
            DisplayField::Bed => "bed",
            DisplayField::Tool0 => "tool0",
            DisplayField::LogMsgs => "log_msgs",
        };
        f.write_str(name)
    }
}

/// Why a reload was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftReason {
    /// Server history holds more points than the client series
    ClientBehind(Channel),
    /// Oldest retained points disagree by more than the tolerance
    WindowSkew(Channel),
}

impl fmt::Display for DriftReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftReason::ClientBehind(channel) => write!(f, "client behind on {}", channel),
            DriftReason::WindowSkew(channel) => write!(f, "window skew on {}", channel),
        }
    }
}

/// Instructions for one series after a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesUpdate {
    pub channel: Channel,
    /// Replace prior contents entirely with these points
    pub reload: Option<Vec<TimedPoint>>,
    /// Point to append after any reload
    pub append: Option<TimedPoint>,
    /// Drop the oldest point before applying the append
    pub evict_oldest: bool,
}

/// Everything the renderer needs to apply after one valid cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleUpdate {
    /// One entry per channel, in [`Channel::all`] order
    pub series: Vec<SeriesUpdate>,
    /// Ordered field-to-text mapping, restricted to the configured set
    pub display: Vec<(DisplayField, String)>,
}

/// Errors from reconciling a snapshot
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    /// Payload did not carry the `printing` sentinel
    #[error("status payload missing the `printing` field")]
    InvalidPayload,
}

/// Owns the series state and decides reload-vs-append each cycle.
#[derive(Debug)]
pub struct Reconciler {
    config: ReconcilerConfig,
    state: SeriesState,
}

impl Reconciler {
    /// Create a reconciler with empty series state.
    pub fn new(config: ReconcilerConfig) -> Self {
        Self {
            config,
            state: SeriesState::new(),
        }
    }

    /// Read access to the retained series, for display layers and tests.
    pub fn state(&self) -> &SeriesState {
        &self.state
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Reconcile one snapshot against the retained series.
    ///
    /// On a valid payload the series are mutated in place (reload and/or
    /// append, with FIFO eviction at the retention cap) and the matching
    /// instructions are returned for the renderer. An invalid payload
    /// leaves the series untouched.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> Result<CycleUpdate, ReconcileError> {
        if !snapshot.is_valid() {
            return Err(ReconcileError::InvalidPayload);
        }

        let drift = self.detect_drift(snapshot);
        if let Some(reason) = drift {
            tracing::info!(%reason, "reloading series from server history");
        }

        let series = Channel::all()
            .iter()
            .map(|&channel| self.update_channel(channel, snapshot, drift.is_some()))
            .collect();

        Ok(CycleUpdate {
            series,
            display: self.project_display(snapshot),
        })
    }

    /// First drift condition that holds, if any. A check whose inputs are
    /// missing (empty client series or empty server history) is skipped.
    fn detect_drift(&self, snapshot: &Snapshot) -> Option<DriftReason> {
        for &channel in Channel::all() {
            let client = self.state.series(channel);
            let history = snapshot.history(channel);

            if client.len() < history.len() {
                return Some(DriftReason::ClientBehind(channel));
            }

            if let (Some(oldest), Some(server_oldest)) = (client.oldest(), history.first()) {
                if (oldest.timestamp - server_oldest.timestamp).abs() > self.config.drift_tolerance_ms
                {
                    return Some(DriftReason::WindowSkew(channel));
                }
            }
        }
        None
    }

    fn update_channel(&mut self, channel: Channel, snapshot: &Snapshot, reload: bool) -> SeriesUpdate {
        let cap = self.config.retention_cap.resolve(snapshot);
        let series = self.state.series_mut(channel);

        let reload_points = if reload {
            let points = snapshot.history(channel).to_vec();
            series.replace(points.clone());
            Some(points)
        } else {
            None
        };

        let append = snapshot.point(channel);
        let mut evict_oldest = false;
        if let Some(point) = append {
            if cap.map(|cap| series.len() >= cap).unwrap_or(false) {
                series.evict_oldest();
                evict_oldest = true;
            }
            series.append(point);
        }

        SeriesUpdate {
            channel,
            reload: reload_points,
            append,
            evict_oldest,
        }
    }

    fn project_display(&self, snapshot: &Snapshot) -> Vec<(DisplayField, String)> {
        self.config
            .display_fields
            .iter()
            .filter_map(|&field| project_field(field, snapshot).map(|text| (field, text)))
            .collect()
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Armed status line: armed, counting down to armed, or plain "No".
fn armed_text(snapshot: &Snapshot) -> String {
    if snapshot.valid {
        return "Yes".to_string();
    }
    match (snapshot.printing, snapshot.time_to_valid) {
        (Some(true), Some(secs)) => format!("No (valid in {} sec)", secs),
        _ => "No".to_string(),
    }
}

// A missing target means the heater is off; the server reports that as 0.
fn temp_pair(actual: Option<f64>, target: Option<f64>) -> Option<String> {
    actual.map(|actual| format!("{} / {}", actual, target.unwrap_or(0.0)))
}

/// Text for one display slot, or `None` when the snapshot has nothing
/// to show there.
fn project_field(field: DisplayField, snapshot: &Snapshot) -> Option<String> {
    match field {
        DisplayField::Printing => Some(yes_no(snapshot.printing.unwrap_or(false)).to_string()),
        DisplayField::Alarm => Some(yes_no(snapshot.alarm).to_string()),
        DisplayField::Armed => Some(armed_text(snapshot)),
        DisplayField::Summary => snapshot.summary.clone(),
        DisplayField::FilamentPos => snapshot.filament_pos.as_ref().map(|v| v.to_string()),
        DisplayField::FilePos => snapshot.file_pos.as_ref().map(|v| v.to_string()),
        DisplayField::Bed => temp_pair(snapshot.bed_actual, snapshot.bed_target),
        DisplayField::Tool0 => temp_pair(snapshot.tool0_actual, snapshot.tool0_target),
        DisplayField::LogMsgs => snapshot.log_msgs.clone(),
    }
}
