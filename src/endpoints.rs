//! # Endpoints Module
//!
//! Request and response shapes for the two operations, and the [`Endpoint`]
//! abstraction the transport invokes.
//!
//! ## Failure reporting
//!
//! An endpoint has two ways to fail:
//!
//! - It returns `Err(..)`. This is an endpoint-level fault; the transport wraps it
//!   with [`Domain::Do`](crate::error::Domain::Do) before classification.
//! - It returns `Ok(Outcome::Failure(..))`. This is a business failure produced as
//!   a normal value. The response encoder notices it through [`Failer`] and hands
//!   it to the error encoder instead of writing a success body.

use crate::error::{Error, Result};
use crate::service::Service;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Operands of a sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumRequest {
    pub a: i64,
    pub b: i64,
}

/// Operands of a concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatRequest {
    pub a: String,
    pub b: String,
}

/// Result of an operation: either the value or the business error that
/// prevented it.
///
/// A success serializes as `{"v": <value>, "err": ""}`. A failure serializes as
/// `{"err": "<message>"}`, although the server never writes one: failures are
/// routed to the error encoder.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Failure(Error),
}

/// Response of the sum endpoint.
pub type SumResponse = Outcome<i64>;
/// Response of the concat endpoint.
pub type ConcatResponse = Outcome<String>;

/// A response value that can report an embedded failure.
pub trait Failer {
    /// The failure carried by this response, if any.
    fn failed(&self) -> Option<&Error>;
}

impl<T> Failer for Outcome<T> {
    fn failed(&self) -> Option<&Error> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The success value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(v) => Some(v),
            Outcome::Failure(_) => None,
        }
    }

    /// Convert into a plain `Result`, surfacing the failure as the error.
    ///
    /// # Errors
    ///
    /// Returns the carried error for [`Outcome::Failure`].
    pub fn into_result(self) -> Result<T> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Failure(err) => Err(err),
        }
    }
}

impl<T, E: Into<Error>> From<std::result::Result<T, E>> for Outcome<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(v) => Outcome::Success(v),
            Err(err) => Outcome::Failure(err.into()),
        }
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Outcome::Success(v) => {
                let mut state = serializer.serialize_struct("Outcome", 2)?;
                state.serialize_field("v", v)?;
                state.serialize_field("err", "")?;
                state.end()
            }
            Outcome::Failure(err) => {
                let mut state = serializer.serialize_struct("Outcome", 1)?;
                state.serialize_field("err", &err.to_string())?;
                state.end()
            }
        }
    }
}

/// A single unit of business logic reachable through the transport.
pub trait Endpoint<Req, Resp>: Send + Sync {
    /// Invoke the endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error for endpoint-level faults. Business failures belong in
    /// the response value instead.
    fn call(&self, req: Req) -> Result<Resp>;
}

impl<Req, Resp, F> Endpoint<Req, Resp> for F
where
    F: Fn(Req) -> Result<Resp> + Send + Sync,
{
    fn call(&self, req: Req) -> Result<Resp> {
        (self)(req)
    }
}

/// Shared handle to an endpoint.
pub type EndpointPtr<Req, Resp> = Arc<dyn Endpoint<Req, Resp>>;

/// The endpoints exposed by the service.
#[derive(Clone)]
pub struct Endpoints {
    pub sum: EndpointPtr<SumRequest, SumResponse>,
    pub concat: EndpointPtr<ConcatRequest, ConcatResponse>,
}

impl Endpoints {
    /// Build both endpoints on top of `service`.
    pub fn new(service: Arc<dyn Service>) -> Self {
        Self {
            sum: make_sum_endpoint(Arc::clone(&service)),
            concat: make_concat_endpoint(service),
        }
    }
}

/// Endpoint that adapts [`Service::sum`].
pub fn make_sum_endpoint(service: Arc<dyn Service>) -> EndpointPtr<SumRequest, SumResponse> {
    Arc::new(move |req: SumRequest| -> Result<SumResponse> {
        Ok(Outcome::from(service.sum(req.a, req.b)))
    })
}

/// Endpoint that adapts [`Service::concat`].
pub fn make_concat_endpoint(
    service: Arc<dyn Service>,
) -> EndpointPtr<ConcatRequest, ConcatResponse> {
    Arc::new(move |req: ConcatRequest| -> Result<ConcatResponse> {
        Ok(Outcome::from(service.concat(&req.a, &req.b)))
    })
}
