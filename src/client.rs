//! Blocking HTTP client for a remote addsvc instance.
//!
//! ```no_run
//! use addsvc::client::HttpClient;
//!
//! let client = HttpClient::new("localhost:8081")?;
//! assert_eq!(client.sum(2, 3)?, 5);
//! # Ok::<(), addsvc::error::Error>(())
//! ```

use crate::endpoints::{ConcatRequest, ConcatResponse, SumRequest, SumResponse};
use crate::error::{Domain, Error, Result};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::transport::{decode_concat_response, decode_sum_response, encode_generic_request};
use http::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client bound to one remote instance.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
    sum_url: Url,
    concat_url: Url,
}

impl HttpClient {
    /// Build a client for `target`, e.g. `localhost:8081` or `http://host:8081/prefix`.
    ///
    /// A target without a scheme is treated as plain HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(target: &str) -> Result<Self> {
        Self::with_timeout(target, DEFAULT_TIMEOUT)
    }

    /// As [`HttpClient::new`] with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::new`].
    pub fn with_timeout(target: &str, timeout: Duration) -> Result<Self> {
        let base = base_url(target).map_err(|e| Error::transport(Domain::NewRequest, e))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(Domain::NewRequest, e.into()))?;
        Ok(Self {
            client,
            sum_url: endpoint_url(&base, "sum")?,
            concat_url: endpoint_url(&base, "concat")?,
        })
    }

    /// Call `POST /sum`, returning the response as sent by the server.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures and non-200 responses.
    pub fn call_sum(&self, a: i64, b: i64) -> Result<SumResponse> {
        let (status, body) = self.post(&self.sum_url, &SumRequest { a, b })?;
        decode_sum_response(status, &body).map_err(client_decode_error)
    }

    /// Call `POST /concat`, returning the response as sent by the server.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures and non-200 responses.
    pub fn call_concat(&self, a: &str, b: &str) -> Result<ConcatResponse> {
        let req = ConcatRequest {
            a: a.to_string(),
            b: b.to_string(),
        };
        let (status, body) = self.post(&self.concat_url, &req)?;
        decode_concat_response(status, &body).map_err(client_decode_error)
    }

    /// Remote sum; failures reported by the server become errors.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures and any remote failure.
    pub fn sum(&self, a: i64, b: i64) -> Result<i64> {
        self.call_sum(a, b)?.into_result()
    }

    /// Remote concat; failures reported by the server become errors.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures and any remote failure.
    pub fn concat(&self, a: &str, b: &str) -> Result<String> {
        self.call_concat(a, b)?.into_result()
    }

    fn post<T: Serialize>(&self, url: &Url, req: &T) -> Result<(StatusCode, Vec<u8>)> {
        let body = encode_generic_request(req).map_err(|e| Error::transport(Domain::Encode, e))?;
        let request_id = RequestId::new();
        let request = self
            .client
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json; charset=utf-8")
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .body(body)
            .build()
            .map_err(|e| Error::transport(Domain::NewRequest, e.into()))?;

        debug!(url = %url, request_id = %request_id, "Sending request");
        let response = self
            .client
            .execute(request)
            .map_err(|e| Error::transport(Domain::Do, e.into()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .map_err(|e| Error::transport(Domain::Decode, e.into()))?;
        if !status.is_success() {
            warn!(url = %url, request_id = %request_id, status = status.as_u16(), "Remote returned error status");
        }
        Ok((status, bytes.to_vec()))
    }
}

/// Remote error statuses stay as-is; anything else failed while decoding.
fn client_decode_error(err: Error) -> Error {
    match err {
        remote @ Error::Remote(_) => remote,
        other => Error::transport(Domain::Decode, other),
    }
}

fn base_url(target: &str) -> Result<Url> {
    let target = target.trim();
    let with_scheme = if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("http://{target}")
    };
    let mut url = Url::parse(&with_scheme)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn endpoint_url(base: &Url, name: &str) -> Result<Url> {
    base.join(name)
        .map_err(|e| Error::transport(Domain::NewRequest, e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_without_scheme_is_http() {
        let url = base_url("localhost:8081").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/");
        assert_eq!(endpoint_url(&url, "sum").unwrap().as_str(), "http://localhost:8081/sum");
    }

    #[test]
    fn target_path_prefix_is_kept() {
        let url = base_url("https://svc.example/add").unwrap();
        assert_eq!(
            endpoint_url(&url, "concat").unwrap().as_str(),
            "https://svc.example/add/concat"
        );
    }

    #[test]
    fn invalid_target_is_new_request_error() {
        let err = HttpClient::new("http://[::1").unwrap_err();
        assert_eq!(err.domain(), Some(Domain::NewRequest));
    }
}
