//! Client-retained series state
//!
//! `SeriesState` is the only mutable state in the crate: two ordered
//! point histories, one per tracked channel, created empty at startup
//! and mutated exclusively by the reconciler. The renderer only ever
//! sees explicit update instructions, never the state itself.

use crate::snapshot::TimedPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tracked quantity a series holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Feed rate commanded by the g-code
    Gcode,
    /// Feed rate measured at the filament sensor
    Actual,
}

impl Channel {
    /// Both channels, in display order
    pub fn all() -> &'static [Channel] {
        &[Channel::Gcode, Channel::Actual]
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Gcode => write!(f, "gcode"),
            Channel::Actual => write!(f, "actual"),
        }
    }
}

/// Ordered point history for one channel.
///
/// Points are kept in the order they were supplied; the reconciler only
/// ever appends newer points or replaces the window wholesale, so the
/// contents stay chronological.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    points: Vec<TimedPoint>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TimedPoint] {
        &self.points
    }

    pub fn oldest(&self) -> Option<&TimedPoint> {
        self.points.first()
    }

    pub fn newest(&self) -> Option<&TimedPoint> {
        self.points.last()
    }

    /// Append a point at the newest end.
    pub fn append(&mut self, point: TimedPoint) {
        self.points.push(point);
    }

    /// Replace the entire contents with a server-supplied window.
    pub fn replace(&mut self, points: Vec<TimedPoint>) {
        self.points = points;
    }

    /// Remove and return the single oldest point (FIFO).
    pub fn evict_oldest(&mut self) -> Option<TimedPoint> {
        if self.points.is_empty() {
            None
        } else {
            Some(self.points.remove(0))
        }
    }
}

/// Both per-channel series for the lifetime of the display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesState {
    pub gcode: Series,
    pub actual: Series,
}

impl SeriesState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn series(&self, channel: Channel) -> &Series {
        match channel {
            Channel::Gcode => &self.gcode,
            Channel::Actual => &self.actual,
        }
    }

    pub fn series_mut(&mut self, channel: Channel) -> &mut Series {
        match channel {
            Channel::Gcode => &mut self.gcode,
            Channel::Actual => &mut self.actual,
        }
    }
}
