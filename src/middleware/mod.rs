//! # Middleware Module
//!
//! Cross-cutting hooks applied by the dispatcher around each endpoint call:
//!
//! - [`TracingMiddleware`] - extracts (or starts) a W3C trace context before the
//!   endpoint runs and logs the completed request
//! - [`MetricsMiddleware`] - counts requests, failures and latency per operation
//!   and renders them for the `/metrics` endpoint
//!
//! Custom middleware implements [`Middleware`] and is passed to
//! [`crate::app::HandlerConfig`].

mod core;
mod metrics;
mod tracing;

pub use core::Middleware;
pub use metrics::MetricsMiddleware;
pub use tracing::{root_span_context, TracingMiddleware};
