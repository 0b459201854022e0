//! # Dispatcher Module
//!
//! The dispatcher owns the route table and the middleware chain. The server
//! hands it one [`HandlerRequest`] per HTTP request; it picks the route, runs
//! the middleware `before` hooks, calls the handler inside a `request` tracing
//! span, runs the `after` hooks and returns the encoded [`HandlerResponse`].
//!
//! ## Request Flow
//!
//! 1. Server parses the HTTP request into a [`HandlerRequest`]
//! 2. Dispatcher looks up the route by path (404 if unknown, 405 on method mismatch)
//! 3. Middleware `before` hooks run (tracing context extraction, ...)
//! 4. The route handler decodes, calls the endpoint and encodes
//! 5. Middleware `after` hooks observe the response and latency (metrics)
//!
//! ## Concurrency
//!
//! Handlers run on the connection's coroutine. The dispatcher itself is
//! immutable after startup and shared behind an `Arc`.

mod core;

pub use core::{ContentType, Dispatcher, HandlerRequest, HandlerResponse, RouteHandler};
