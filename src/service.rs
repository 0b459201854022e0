//! Business logic behind the endpoints.
//!
//! The transport never calls a [`Service`] directly; it only sees the
//! [`crate::endpoints::Endpoints`] built on top of one.

use crate::error::ServiceError;
use std::time::Instant;
use tracing::{info, warn};

/// Default upper bound, in bytes, for the result of [`Service::concat`].
pub const DEFAULT_MAX_CONCAT_LEN: usize = 10;

/// The two operations offered by the service.
pub trait Service: Send + Sync {
    /// Add two integers.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when a business rule rejects the operands.
    fn sum(&self, a: i64, b: i64) -> Result<i64, ServiceError>;

    /// Concatenate two strings.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when a business rule rejects the operands.
    fn concat(&self, a: &str, b: &str) -> Result<String, ServiceError>;
}

/// Straightforward implementation of [`Service`].
#[derive(Debug, Clone, Copy)]
pub struct BasicService {
    max_concat_len: usize,
}

impl Default for BasicService {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCAT_LEN)
    }
}

impl BasicService {
    #[must_use]
    pub fn new(max_concat_len: usize) -> Self {
        Self { max_concat_len }
    }

    #[must_use]
    pub fn max_concat_len(&self) -> usize {
        self.max_concat_len
    }
}

impl Service for BasicService {
    fn sum(&self, a: i64, b: i64) -> Result<i64, ServiceError> {
        if a == 0 && b == 0 {
            return Err(ServiceError::TwoZeroes);
        }
        a.checked_add(b).ok_or(ServiceError::IntOverflow)
    }

    fn concat(&self, a: &str, b: &str) -> Result<String, ServiceError> {
        if a.len() + b.len() > self.max_concat_len {
            return Err(ServiceError::MaxSizeExceeded);
        }
        let mut v = String::with_capacity(a.len() + b.len());
        v.push_str(a);
        v.push_str(b);
        Ok(v)
    }
}

/// Decorator that logs every call made to the wrapped service.
pub struct LoggingService<S> {
    inner: S,
}

impl<S: Service> LoggingService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: Service> Service for LoggingService<S> {
    fn sum(&self, a: i64, b: i64) -> Result<i64, ServiceError> {
        let start = Instant::now();
        let result = self.inner.sum(a, b);
        let took_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        match &result {
            Ok(v) => info!(method = "sum", a, b, v, took_us, "service call"),
            Err(err) => warn!(method = "sum", a, b, error = %err, took_us, "service call rejected"),
        }
        result
    }

    fn concat(&self, a: &str, b: &str) -> Result<String, ServiceError> {
        let start = Instant::now();
        let result = self.inner.concat(a, b);
        let took_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        match &result {
            Ok(v) => info!(method = "concat", a, b, v = %v, took_us, "service call"),
            Err(err) => {
                warn!(method = "concat", a, b, error = %err, took_us, "service call rejected");
            }
        }
        result
    }
}
