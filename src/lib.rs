//! # addsvc
//!
//! HTTP/JSON transport for a two-operation service: **sum** two integers and
//! **concatenate** two strings. The server runs on the `may` coroutine runtime
//! through `may_minihttp`; a blocking `reqwest` client speaks the same wire
//! format.
//!
//! ## Architecture
//!
//! - **[`service`]** - the business interface and its default implementation
//! - **[`endpoints`]** - request/response types, the [`endpoints::Failer`]
//!   capability and the endpoint adapters over a service
//! - **[`transport`]** - JSON encoders/decoders and the per-route
//!   [`transport::Server`] (decode, call, encode)
//! - **[`error`]** - the error taxonomy and [`error::status_code`] classifier
//! - **[`dispatcher`]** - route table and middleware chain
//! - **[`middleware`]** - tracing and Prometheus metrics hooks
//! - **[`server`]** - the `may_minihttp` service, `/health` and `/metrics`
//! - **[`app`]** - composition of all of the above
//! - **[`client`]** - remote access to a running instance
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - the `addsvc` binary's plumbing
//!
//! ## Request Flow
//!
//! ```text
//! may_minihttp -> AppService -> Dispatcher -> [before hooks]
//!     -> transport::Server: decode -> endpoint -> encode
//!     -> [after hooks] -> Response
//! ```
//!
//! Any error along the way is tagged with the phase it happened in and
//! encoded as `{"error": "<message>"}`: 400 for malformed requests and
//! business-rule violations, 500 for everything else.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use addsvc::app::{build_service, HandlerConfig};
//! use addsvc::endpoints::Endpoints;
//! use addsvc::server::HttpServer;
//! use addsvc::service::BasicService;
//! use std::sync::Arc;
//!
//! let endpoints = Endpoints::new(Arc::new(BasicService::default()));
//! let service = build_service(&endpoints, HandlerConfig::instrumented());
//! let handle = HttpServer(service).start("0.0.0.0:8081")?;
//! handle.join().ok();
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod endpoints;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod service;
pub mod transport;

pub use error::{Error, Result};
