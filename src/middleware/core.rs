use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Hooks run by the [`crate::dispatcher::Dispatcher`] around every routed request.
pub trait Middleware: Send + Sync {
    /// Called after routing and before the handler. May annotate the request.
    fn before(&self, _req: &mut HandlerRequest) {}
    /// Called with the final response and the handler latency.
    fn after(&self, _req: &HandlerRequest, _res: &HandlerResponse, _latency: Duration) {}
}
