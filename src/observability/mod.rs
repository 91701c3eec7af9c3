//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http + forwarding produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every request span
//! - The resolver itself stays side-effect free; recording happens in http

pub mod logging;
pub mod metrics;
