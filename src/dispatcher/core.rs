use crate::ids::RequestId;
use crate::middleware::Middleware;
use http::{Method, StatusCode};
use opentelemetry::trace::{SpanContext, TraceId};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

/// Media type of a [`HandlerResponse`] body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// `application/json`
    Json,
    /// Prometheus text exposition format
    PrometheusText,
}

impl ContentType {
    /// Full header line, as expected by `may_minihttp::Response::header`.
    #[must_use]
    pub fn header_line(self) -> &'static str {
        match self {
            ContentType::Json => "Content-Type: application/json",
            ContentType::PrometheusText => "Content-Type: text/plain; version=0.0.4",
        }
    }
}

/// Request data handed to a route handler.
///
/// Built once per HTTP request by the server and owned by that request's
/// coroutine. Middleware may annotate it (trace context) before the handler runs.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for log correlation
    pub request_id: RequestId,
    /// HTTP method
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Name of the route that matched, empty until dispatch
    pub handler_name: String,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Raw request body
    pub body: Vec<u8>,
    /// Distributed trace context, filled in by [`crate::middleware::TracingMiddleware`]
    pub trace: Option<SpanContext>,
}

impl HandlerRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            handler_name: String::new(),
            headers: HashMap::new(),
            body,
            trace: None,
        }
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A fully encoded response, written to the socket in one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    /// HTTP status code
    pub status: u16,
    /// Body media type
    pub content_type: ContentType,
    /// Encoded body
    pub body: Vec<u8>,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, content_type: ContentType, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    /// A JSON response from already-encoded bytes.
    #[must_use]
    pub fn json(status: u16, body: Vec<u8>) -> Self {
        Self::new(status, ContentType::Json, body)
    }

    /// A `{"error": "<message>"}` response.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::json(status, body.into_bytes())
    }

    /// Body as UTF-8 text, lossy.
    #[must_use]
    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Something that turns a request into a response for one route.
///
/// Implementations must always produce a response: failures are encoded, not
/// returned.
pub trait RouteHandler: Send + Sync {
    fn serve(&self, req: &HandlerRequest) -> HandlerResponse;
}

#[derive(Clone)]
struct Route {
    method: Method,
    handler_name: String,
    handler: Arc<dyn RouteHandler>,
}

/// Route table plus the middleware chain applied around every handler.
///
/// Built once at startup by [`crate::app::build_dispatcher`] and shared
/// read-only between connections.
#[derive(Clone, Default)]
pub struct Dispatcher {
    routes: HashMap<String, Route>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method path`.
    ///
    /// A later registration for the same path replaces the earlier one.
    pub fn add_route(
        &mut self,
        method: Method,
        path: &str,
        handler_name: &str,
        handler: Arc<dyn RouteHandler>,
    ) {
        let route = Route {
            method: method.clone(),
            handler_name: handler_name.to_string(),
            handler,
        };
        if self.routes.insert(path.to_string(), route).is_some() {
            warn!(path = %path, handler_name = %handler_name, "Replaced existing route");
        }
        info!(
            method = %method,
            path = %path,
            handler_name = %handler_name,
            total_routes = self.routes.len(),
            "Route registered"
        );
    }

    /// Add middleware to the processing pipeline
    ///
    /// Middleware runs in the order it was added.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Names of the registered handlers, sorted.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .routes
            .values()
            .map(|r| r.handler_name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Route a request to its handler and return the response.
    ///
    /// Unknown paths answer 404 and a method mismatch answers 405; neither goes
    /// through the middleware chain. A panicking handler answers 500.
    #[must_use]
    pub fn dispatch(&self, mut req: HandlerRequest) -> HandlerResponse {
        let Some(route) = self.routes.get(&req.path) else {
            debug!(request_id = %req.request_id, path = %req.path, "No route for path");
            return HandlerResponse::error(StatusCode::NOT_FOUND.as_u16(), "not found");
        };
        if route.method != req.method {
            debug!(
                request_id = %req.request_id,
                path = %req.path,
                method = %req.method,
                expected = %route.method,
                "Method not allowed"
            );
            return HandlerResponse::error(
                StatusCode::METHOD_NOT_ALLOWED.as_u16(),
                "method not allowed",
            );
        }
        req.handler_name.clone_from(&route.handler_name);

        for mw in &self.middlewares {
            mw.before(&mut req);
        }

        let trace_id = req
            .trace
            .as_ref()
            .map_or(TraceId::INVALID, SpanContext::trace_id);
        let span = info_span!(
            "request",
            request_id = %req.request_id,
            handler = %req.handler_name,
            trace_id = %trace_id
        );

        let start = Instant::now();
        let resp = span.in_scope(|| {
            match catch_unwind(AssertUnwindSafe(|| route.handler.serve(&req))) {
                Ok(resp) => resp,
                Err(panic) => {
                    error!(
                        request_id = %req.request_id,
                        handler_name = %req.handler_name,
                        panic_message = ?panic,
                        "Handler panicked - CRITICAL"
                    );
                    HandlerResponse::error(
                        StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                        "internal server error",
                    )
                }
            }
        });
        let latency: Duration = start.elapsed();

        for mw in &self.middlewares {
            mw.after(&req, &resp, latency);
        }
        resp
    }
}
