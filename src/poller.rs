//! Polling loop
//!
//! One permanent, self-healing cycle for a long-lived display: fetch,
//! reconcile, render, sleep, repeat. The loop is strictly serialized —
//! the next request is issued only after the current cycle has fully
//! resolved and the fixed delay has elapsed, so there is never more
//! than one request in flight and no race on the series state. There is
//! no backoff, no cancellation, and no retry cap: every failure path
//! still re-arms the next cycle.

use crate::reconcile::{ReconcileError, Reconciler};
use crate::render::Renderer;
use crate::source::StatusSource;
use std::time::Duration;

/// Message shown when the payload fails validation.
const INVALID_PAYLOAD_MESSAGE: &str = "Invalid state received from server";

/// Polling cadence configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between the end of one cycle and the start of the next
    pub poll_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
        }
    }
}

/// Drives the fetch/reconcile/render cycle.
pub struct Poller {
    source: Box<dyn StatusSource>,
    renderer: Box<dyn Renderer>,
    reconciler: Reconciler,
    config: PollerConfig,
    cycles: u64,
    consecutive_failures: u32,
}

impl Poller {
    pub fn new(
        source: Box<dyn StatusSource>,
        renderer: Box<dyn Renderer>,
        reconciler: Reconciler,
        config: PollerConfig,
    ) -> Self {
        Self {
            source,
            renderer,
            reconciler,
            config,
            cycles: 0,
            consecutive_failures: 0,
        }
    }

    /// The reconciler (and through it the series state) owned by this poller.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Completed cycle count.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run forever. The sleep starts only after the cycle resolves, so
    /// requests never overlap.
    pub async fn run(mut self) {
        tracing::info!(
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "starting poll loop"
        );

        loop {
            self.poll_once().await;
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// One complete cycle: fetch, reconcile, render. Failures are shown
    /// and logged, never propagated; the caller always gets control back.
    pub async fn poll_once(&mut self) {
        self.cycles += 1;

        match self.source.fetch().await {
            Ok(snapshot) => match self.reconciler.reconcile(&snapshot) {
                Ok(update) => {
                    self.consecutive_failures = 0;
                    tracing::debug!(cycle = self.cycles, "cycle applied");
                    self.renderer.apply(&update).await;
                }
                Err(ReconcileError::InvalidPayload) => {
                    self.consecutive_failures += 1;
                    tracing::warn!(
                        cycle = self.cycles,
                        failures = self.consecutive_failures,
                        "invalid status payload"
                    );
                    self.renderer.show_message(INVALID_PAYLOAD_MESSAGE).await;
                }
            },
            Err(error) => {
                self.consecutive_failures += 1;
                tracing::warn!(
                    cycle = self.cycles,
                    failures = self.consecutive_failures,
                    error = %error,
                    "status poll failed"
                );
                self.renderer
                    .show_message(&format!("Error retrieving state: {}", error))
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{CycleUpdate, ReconcilerConfig};
    use crate::snapshot::{Snapshot, TimedPoint};
    use crate::source::SourceError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    /// Source that plays back a fixed script, then repeats the last-resort
    /// steady snapshot forever.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Snapshot, SourceError>>>,
        fetches: Arc<AtomicU64>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Snapshot, SourceError>>) -> (Self, Arc<AtomicU64>) {
            let fetches = Arc::new(AtomicU64::new(0));
            (
                Self {
                    script: Mutex::new(script.into()),
                    fetches: Arc::clone(&fetches),
                },
                fetches,
            )
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch(&self) -> Result<Snapshot, SourceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(steady_snapshot(0)))
        }
    }

    #[derive(Debug, PartialEq)]
    enum RenderEvent {
        Applied { appended: usize },
        Message(String),
    }

    #[derive(Clone)]
    struct RecordingRenderer {
        events: Arc<Mutex<Vec<RenderEvent>>>,
    }

    impl RecordingRenderer {
        fn new() -> (Self, Arc<Mutex<Vec<RenderEvent>>>) {
            let events = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    events: Arc::clone(&events),
                },
                events,
            )
        }
    }

    #[async_trait]
    impl Renderer for RecordingRenderer {
        async fn apply(&mut self, update: &CycleUpdate) {
            let appended = update.series.iter().filter(|s| s.append.is_some()).count();
            self.events
                .lock()
                .unwrap()
                .push(RenderEvent::Applied { appended });
        }

        async fn show_message(&mut self, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(RenderEvent::Message(message.to_string()));
        }
    }

    fn steady_snapshot(timestamp: i64) -> Snapshot {
        Snapshot {
            printing: Some(true),
            gcode: Some(TimedPoint::new(timestamp, 1.0)),
            actual: Some(TimedPoint::new(timestamp, 0.9)),
            history_length: Some(120),
            ..Default::default()
        }
    }

    fn poller(
        script: Vec<Result<Snapshot, SourceError>>,
    ) -> (Poller, Arc<AtomicU64>, Arc<Mutex<Vec<RenderEvent>>>) {
        let (source, fetches) = ScriptedSource::new(script);
        let (renderer, events) = RecordingRenderer::new();
        let poller = Poller::new(
            Box::new(source),
            Box::new(renderer),
            Reconciler::new(ReconcilerConfig::default()),
            PollerConfig::default(),
        );
        (poller, fetches, events)
    }

    #[tokio::test]
    async fn test_success_cycle_applies_update() {
        let (mut poller, _, events) = poller(vec![Ok(steady_snapshot(1000))]);
        poller.poll_once().await;

        assert_eq!(poller.reconciler().state().gcode.len(), 1);
        assert_eq!(
            events.lock().unwrap()[0],
            RenderEvent::Applied { appended: 2 }
        );
    }

    #[tokio::test]
    async fn test_invalid_payload_shows_message_without_mutation() {
        let (mut poller, _, events) = poller(vec![Ok(Snapshot::default())]);
        poller.poll_once().await;

        assert!(poller.reconciler().state().gcode.is_empty());
        assert_eq!(
            events.lock().unwrap()[0],
            RenderEvent::Message(INVALID_PAYLOAD_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_transport_failure_shows_error_detail() {
        let (mut poller, _, events) = poller(vec![Err(SourceError::Unavailable)]);
        poller.poll_once().await;

        let events = events.lock().unwrap();
        match &events[0] {
            RenderEvent::Message(text) => {
                assert!(text.starts_with("Error retrieving state:"));
                assert!(text.contains("unavailable"));
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_continues_after_transport_failure() {
        // Cycle 3 fails; the loop must keep going regardless
        let (poller, fetches, events) = poller(vec![
            Ok(steady_snapshot(1000)),
            Ok(steady_snapshot(2000)),
            Err(SourceError::Timeout),
            Ok(steady_snapshot(4000)),
        ]);

        let handle = tokio::spawn(poller.run());
        tokio::time::sleep(Duration::from_millis(4500)).await;
        handle.abort();

        assert!(fetches.load(Ordering::SeqCst) >= 4);
        let events = events.lock().unwrap();
        assert_eq!(events[0], RenderEvent::Applied { appended: 2 });
        assert_eq!(events[1], RenderEvent::Applied { appended: 2 });
        assert!(matches!(events[2], RenderEvent::Message(_)));
        assert_eq!(events[3], RenderEvent::Applied { appended: 2 });
    }
}
