//! Renderer seam
//!
//! The reconciler never touches a display directly; it hands a
//! [`CycleUpdate`] to whatever sits behind the [`Renderer`] trait. The
//! contract is small: appends preserve chronological order, a reload
//! replaces prior contents entirely, and `show_message` takes over the
//! summary slot when there is no live data to show.

use crate::reconcile::CycleUpdate;
use async_trait::async_trait;

/// Display collaborator for the poll loop.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Apply one cycle's series and display instructions.
    async fn apply(&mut self, update: &CycleUpdate);

    /// Show a status message in place of live data (invalid payload,
    /// transport failure).
    async fn show_message(&mut self, message: &str);
}

/// Renderer that writes every update to the tracing log.
///
/// Stands in for a real display during development and keeps headless
/// deployments observable.
#[derive(Debug, Default)]
pub struct LogRenderer;

impl LogRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Renderer for LogRenderer {
    async fn apply(&mut self, update: &CycleUpdate) {
        for series in &update.series {
            if let Some(points) = &series.reload {
                tracing::info!(channel = %series.channel, points = points.len(), "series reloaded");
            }
            if let Some(point) = series.append {
                tracing::debug!(
                    channel = %series.channel,
                    at = %point.datetime().format("%H:%M:%S"),
                    value = point.value,
                    evicted = series.evict_oldest,
                    "point appended"
                );
            }
        }
        for (field, text) in &update.display {
            tracing::debug!(field = %field, value = %text, "display field");
        }
    }

    async fn show_message(&mut self, message: &str) {
        tracing::warn!(%message, "display message");
    }
}
