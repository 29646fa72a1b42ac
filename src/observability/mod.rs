//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and subsystems produce:
//!     → logging.rs (structured log events, fmt layer)
//!     → metrics.rs (counters, histograms)
//!     → propagation.rs (per-request spans, outbound trace headers)
//!
//! Consumers (wired in telemetry.rs):
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint
//!     → OTLP collector (batched span export)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs and spans
//! - Export is best effort: a dead collector never blocks serving
//! - Span export is independent of log verbosity

pub mod logging;
pub mod metrics;
pub mod propagation;
pub mod telemetry;

pub use propagation::TracePropagator;
pub use telemetry::{TelemetryError, TelemetryGuard};
