use super::request::{parse_request, ParsedRequest};
use super::response::write_handler_response;
use crate::dispatcher::{ContentType, Dispatcher, HandlerRequest, HandlerResponse};
use crate::error::{Domain, Error};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::middleware::MetricsMiddleware;
use crate::transport::encode_error;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use tracing::{debug, warn};

/// HTTP service that fronts the [`Dispatcher`].
///
/// Infrastructure routes (`/health`, `/metrics`) are answered here; everything
/// else is handed to the dispatcher. Cloned once per connection by
/// `may_minihttp`, so all state is behind `Arc`.
#[derive(Clone)]
pub struct AppService {
    pub dispatcher: Arc<Dispatcher>,
    pub metrics: Option<Arc<MetricsMiddleware>>,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Dispatcher, metrics: Option<Arc<MetricsMiddleware>>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            metrics,
        }
    }

    /// Produce the response for an already parsed request.
    ///
    /// This is the whole request path minus socket I/O.
    #[must_use]
    pub fn handle(&self, parsed: ParsedRequest) -> HandlerResponse {
        if parsed.method == "GET" && parsed.path == "/health" {
            if let Some(metrics) = &self.metrics {
                metrics.inc_top_level_request();
            }
            return health_endpoint();
        }
        if parsed.method == "GET" && parsed.path == "/metrics" {
            return match &self.metrics {
                Some(metrics) => {
                    metrics.inc_top_level_request();
                    metrics_endpoint(metrics)
                }
                None => HandlerResponse::error(404, "not found"),
            };
        }

        let Ok(method) = parsed.method.parse::<Method>() else {
            return HandlerResponse::error(405, "method not allowed");
        };
        let ParsedRequest {
            path, headers, body, ..
        } = parsed;
        let request_id =
            RequestId::from_header_or_new(headers.get(REQUEST_ID_HEADER).map(String::as_str));
        let mut req = HandlerRequest::new(method, path, body);
        req.request_id = request_id;
        req.headers = headers;
        self.dispatcher.dispatch(req)
    }
}

/// Liveness probe body.
#[must_use]
pub fn health_endpoint() -> HandlerResponse {
    HandlerResponse::json(200, br#"{"status":"ok"}"#.to_vec())
}

/// Metrics endpoint returning Prometheus text format statistics.
#[must_use]
pub fn metrics_endpoint(metrics: &MetricsMiddleware) -> HandlerResponse {
    HandlerResponse::new(
        200,
        ContentType::PrometheusText,
        metrics.render().into_bytes(),
    )
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let method = req.method().to_string();
        let path = req.path().to_string();
        let resp = match parse_request(req) {
            Ok(parsed) => self.handle(parsed),
            Err(e) => {
                warn!(method = %method, path = %path, error = %e, "Failed to read request body");
                encode_error(&Error::transport(Domain::Decode, Error::Io(e)))
            }
        };
        debug!(method = %method, path = %path, status = resp.status, "Writing response");
        write_handler_response(res, resp);
        Ok(())
    }
}
