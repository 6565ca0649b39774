//! # Printwatch
//!
//! Live telemetry poller for the filament watcher. Fetches the status
//! endpoint once a second and keeps a client-side pair of feed-rate
//! time series (commanded vs. measured) consistent with the server's
//! history window, pushing updates into a pluggable renderer.
//!
//! ## Features
//!
//! - **Drift-aware reconciliation**: full reload when the client falls
//!   behind the server's history or the retained window is skewed,
//!   incremental append otherwise
//! - **Bounded retention**: FIFO eviction at the server-provided or a
//!   fixed point cap
//! - **Self-healing polling**: strictly serialized cycles, fixed delay,
//!   no backoff, never stops on errors
//! - **Pluggable display**: renderer trait fed explicit update
//!   instructions, never raw state
//!
//! ## Modules
//!
//! - [`snapshot`]: wire types for the status payload
//! - [`series`]: client-retained series state
//! - [`reconcile`]: reload-vs-append decision logic
//! - [`render`]: display seam
//! - [`source`]: HTTP transport
//! - [`poller`]: the serialized polling loop
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use printwatch::config::Config;
//! use printwatch::poller::Poller;
//! use printwatch::reconcile::Reconciler;
//! use printwatch::render::LogRenderer;
//! use printwatch::source::HttpSource;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load_default();
//!
//!     let poller = Poller::new(
//!         Box::new(HttpSource::new(config.source_config())),
//!         Box::new(LogRenderer::new()),
//!         Reconciler::new(config.reconciler_config()),
//!         config.poller_config(),
//!     );
//!
//!     poller.run().await;
//! }
//! ```

pub mod config;
pub mod poller;
pub mod reconcile;
pub mod render;
pub mod series;
pub mod snapshot;
pub mod source;

// Re-export top-level types for convenience
pub use config::{Config, ConfigError, LoggingConfig};

pub use poller::{Poller, PollerConfig};

pub use reconcile::{
    CycleUpdate, DisplayField, DriftReason, ReconcileError, Reconciler, ReconcilerConfig,
    RetentionCap, SeriesUpdate,
};

pub use render::{LogRenderer, Renderer};

pub use series::{Channel, Series, SeriesState};

pub use snapshot::{FieldText, Snapshot, TimedPoint};

pub use source::{HttpSource, HttpSourceConfig, SourceError, StatusSource};
