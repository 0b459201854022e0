//! Wiring of endpoints, transport and middleware into a servable HTTP handler.

use crate::dispatcher::Dispatcher;
use crate::endpoints::Endpoints;
use crate::middleware::{MetricsMiddleware, Middleware, TracingMiddleware};
use crate::server::AppService;
use crate::transport::{
    decode_concat_request, decode_sum_request, encode_generic_response, Server,
};
use http::Method;
use std::sync::Arc;

/// Handler name of `POST /sum`, used in logs and metric labels.
pub const SUM_HANDLER: &str = "sum";
/// Handler name of `POST /concat`.
pub const CONCAT_HANDLER: &str = "concat";

/// Optional layers applied around every endpoint.
#[derive(Clone, Default)]
pub struct HandlerConfig {
    /// Per-operation request metrics. Also enables `GET /metrics`.
    pub metrics: Option<Arc<MetricsMiddleware>>,
    /// Join or start a W3C trace for each request.
    pub tracing: bool,
    /// Extra middleware, run after the built-in layers.
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

impl HandlerConfig {
    /// Metrics and tracing both enabled.
    #[must_use]
    pub fn instrumented() -> Self {
        Self {
            metrics: Some(Arc::new(MetricsMiddleware::new())),
            tracing: true,
            middlewares: Vec::new(),
        }
    }
}

/// Register `POST /sum` and `POST /concat` plus the configured middleware.
#[must_use]
pub fn build_dispatcher(endpoints: &Endpoints, config: &HandlerConfig) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();

    let sum = Server::new(
        Arc::clone(&endpoints.sum),
        decode_sum_request,
        encode_generic_response,
    );
    dispatcher.add_route(Method::POST, "/sum", SUM_HANDLER, Arc::new(sum));

    let concat = Server::new(
        Arc::clone(&endpoints.concat),
        decode_concat_request,
        encode_generic_response,
    );
    dispatcher.add_route(Method::POST, "/concat", CONCAT_HANDLER, Arc::new(concat));

    if config.tracing {
        dispatcher.add_middleware(Arc::new(TracingMiddleware::new()));
    }
    if let Some(metrics) = &config.metrics {
        dispatcher.add_middleware(metrics.clone());
    }
    for mw in &config.middlewares {
        dispatcher.add_middleware(Arc::clone(mw));
    }
    dispatcher
}

/// Build the complete HTTP service for `endpoints`.
#[must_use]
pub fn build_service(endpoints: &Endpoints, config: HandlerConfig) -> AppService {
    let dispatcher = build_dispatcher(endpoints, &config);
    AppService::new(dispatcher, config.metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::HandlerRequest;
    use crate::service::BasicService;

    fn endpoints() -> Endpoints {
        Endpoints::new(Arc::new(BasicService::default()))
    }

    fn post(path: &str, body: &str) -> HandlerRequest {
        HandlerRequest::new(Method::POST, path, body.as_bytes().to_vec())
    }

    #[test]
    fn registers_both_routes() {
        let d = build_dispatcher(&endpoints(), &HandlerConfig::default());
        assert_eq!(d.handler_names(), vec![CONCAT_HANDLER, SUM_HANDLER]);
    }

    #[test]
    fn sum_two_zeroes_is_bad_request() {
        let d = build_dispatcher(&endpoints(), &HandlerConfig::default());
        let resp = d.dispatch(post("/sum", r#"{"a":0,"b":0}"#));
        assert_eq!(resp.status, 400);
        assert_eq!(
            resp.body_str(),
            r#"{"error":"both arguments cannot be zero"}"#
        );
    }

    #[test]
    fn concat_too_long_is_bad_request() {
        let d = build_dispatcher(&endpoints(), &HandlerConfig::default());
        let resp = d.dispatch(post("/concat", r#"{"a":"abcdef","b":"ghijkl"}"#));
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body_str(), r#"{"error":"result exceeds maximum size"}"#);
    }

    #[test]
    fn metrics_record_outcome_per_operation() {
        let config = HandlerConfig::instrumented();
        let metrics = config.metrics.clone().unwrap();
        let d = build_dispatcher(&endpoints(), &config);
        let _ = d.dispatch(post("/sum", r#"{"a":2,"b":3}"#));
        let _ = d.dispatch(post("/sum", r#"{"a":0,"b":0}"#));
        let _ = d.dispatch(post("/concat", r#"{"a":"foo","b":"bar"}"#));
        assert_eq!(metrics.operation_count(SUM_HANDLER, true), 1);
        assert_eq!(metrics.operation_count(SUM_HANDLER, false), 1);
        assert_eq!(metrics.operation_count(CONCAT_HANDLER, true), 1);
        assert_eq!(metrics.request_count(), 3);
    }
}
