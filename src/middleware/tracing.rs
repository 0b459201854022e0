use std::time::Duration;

use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tracing::{debug, info};

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Request headers as an OpenTelemetry carrier. Keys are already lowercase.
impl Extractor for HandlerRequest {
    fn get(&self, key: &str) -> Option<&str> {
        self.get_header(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.headers.keys().map(String::as_str).collect()
    }
}

/// Start a new sampled trace rooted at this request. The 128-bit request ULID
/// doubles as the trace id.
#[must_use]
pub fn root_span_context(req: &HandlerRequest) -> SpanContext {
    SpanContext::new(
        TraceId::from_bytes(req.request_id.0.to_bytes()),
        SpanId::INVALID,
        TraceFlags::SAMPLED,
        false,
        TraceState::default(),
    )
}

/// Tracing hook invoked before each endpoint call.
///
/// Joins the caller's trace when a valid `traceparent` header is present and
/// starts a new one otherwise. The dispatcher records the resulting trace id on
/// the request span.
pub struct TracingMiddleware {
    propagator: TraceContextPropagator,
}

impl Default for TracingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self {
            propagator: TraceContextPropagator::new(),
        }
    }

    /// Remote span context from the W3C headers, if they carry a valid one.
    #[must_use]
    pub fn extract(&self, req: &HandlerRequest) -> Option<SpanContext> {
        let cx = self.propagator.extract(req);
        let span = cx.span();
        let ctx = span.span_context();
        ctx.is_valid().then(|| ctx.clone())
    }
}

impl Middleware for TracingMiddleware {
    fn before(&self, req: &mut HandlerRequest) {
        let ctx = match self.extract(req) {
            Some(ctx) => {
                debug!(
                    request_id = %req.request_id,
                    operation = %req.handler_name,
                    trace_id = %ctx.trace_id(),
                    parent_id = %ctx.span_id(),
                    sampled = ctx.is_sampled(),
                    "Joined caller trace"
                );
                ctx
            }
            None => root_span_context(req),
        };
        req.trace = Some(ctx);
    }

    fn after(&self, req: &HandlerRequest, res: &HandlerResponse, latency: Duration) {
        info!(
            request_id = %req.request_id,
            operation = %req.handler_name,
            trace_id = %req.trace.as_ref().map(|t| t.trace_id()).unwrap_or(TraceId::INVALID),
            status = res.status,
            latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            "Request complete"
        );
    }
}
