//! JSON encoders and decoders for both sides of the wire.
//!
//! Server side: [`decode_sum_request`], [`decode_concat_request`],
//! [`encode_generic_response`] and [`encode_error`].
//! Client side: [`encode_generic_request`], [`decode_sum_response`],
//! [`decode_concat_response`] and [`decode_error`].

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::endpoints::{ConcatRequest, ConcatResponse, Failer, Outcome, SumRequest, SumResponse};
use crate::error::{status_code, Error, Result};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Canonical JSON shape of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorWrapper {
    pub error: String,
}

/// Decode a JSON-encoded sum request from the request body.
///
/// # Errors
///
/// Returns [`Error::Json`] for malformed JSON, missing fields or wrong types.
pub fn decode_sum_request(req: &HandlerRequest) -> Result<SumRequest> {
    decode_json(&req.body)
}

/// Decode a JSON-encoded concat request from the request body.
///
/// # Errors
///
/// Returns [`Error::Json`] for malformed JSON, missing fields or wrong types.
pub fn decode_concat_request(req: &HandlerRequest) -> Result<ConcatRequest> {
    decode_json(&req.body)
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}

/// Encode any response as a 200 JSON body.
///
/// A response that reports a failure through [`Failer`] is handed to
/// [`encode_error`] instead; nothing is serialized for it first.
///
/// # Errors
///
/// Returns [`Error::Json`] if the response cannot be serialized.
pub fn encode_generic_response<R: Failer + Serialize>(response: &R) -> Result<HandlerResponse> {
    if let Some(err) = response.failed() {
        return Ok(encode_error(err));
    }
    let body = serde_json::to_vec(response)?;
    Ok(HandlerResponse::json(StatusCode::OK.as_u16(), body))
}

/// Encode an error as `{"error": "<message>"}` with the classified status.
#[must_use]
pub fn encode_error(err: &Error) -> HandlerResponse {
    let status = status_code(err);
    let wrapper = ErrorWrapper {
        error: err.to_string(),
    };
    match serde_json::to_vec(&wrapper) {
        Ok(body) => HandlerResponse::json(status.as_u16(), body),
        Err(_) => HandlerResponse::error(status.as_u16(), "internal error"),
    }
}

/// JSON-encode any request body. Used by the client.
///
/// # Errors
///
/// Returns [`Error::Json`] if the request cannot be serialized.
pub fn encode_generic_request<T: Serialize>(request: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(request)?)
}

/// Rebuild an error from an [`ErrorWrapper`] body.
///
/// Only the message survives; the specific error kind does not cross the wire.
///
/// # Errors
///
/// Returns [`Error::Json`] if the body is not an error wrapper.
pub fn decode_error(body: &[u8]) -> Result<Error> {
    let wrapper: ErrorWrapper = serde_json::from_slice(body)?;
    Ok(Error::Remote(wrapper.error))
}

#[derive(Deserialize)]
struct ResponseWire<T> {
    v: Option<T>,
    #[serde(default)]
    err: String,
}

/// Decode a `{"v": T, "err": string}` response.
///
/// Any status other than 200 is an error, decoded from the error wrapper or,
/// failing that, described by the status line.
///
/// # Errors
///
/// Returns [`Error::Remote`] for non-200 responses and [`Error::Json`] for
/// bodies that do not match the response shape.
pub fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<Outcome<T>> {
    if status != StatusCode::OK {
        let err = decode_error(body).unwrap_or_else(|decode_err| {
            debug!(status = status.as_u16(), error = %decode_err, "Error body not decodable");
            Error::Remote(status_line(status))
        });
        return Err(err);
    }
    let wire: ResponseWire<T> = serde_json::from_slice(body)?;
    if !wire.err.is_empty() {
        return Ok(Outcome::Failure(Error::Remote(wire.err)));
    }
    match wire.v {
        Some(v) => Ok(Outcome::Success(v)),
        None => Err(Error::Json(serde::de::Error::missing_field("v"))),
    }
}

/// Decode a sum response. See [`decode_response`].
///
/// # Errors
///
/// See [`decode_response`].
pub fn decode_sum_response(status: StatusCode, body: &[u8]) -> Result<SumResponse> {
    decode_response(status, body)
}

/// Decode a concat response. See [`decode_response`].
///
/// # Errors
///
/// See [`decode_response`].
pub fn decode_concat_response(status: StatusCode, body: &[u8]) -> Result<ConcatResponse> {
    decode_response(status, body)
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Domain, ServiceError};
    use http::Method;

    fn request(body: &str) -> HandlerRequest {
        HandlerRequest::new(Method::POST, "/sum", body.as_bytes().to_vec())
    }

    #[test]
    fn decodes_sum_request() {
        let req = decode_sum_request(&request(r#"{"a":2,"b":3}"#)).unwrap();
        assert_eq!(req, SumRequest { a: 2, b: 3 });
    }

    #[test]
    fn decodes_concat_request() {
        let req = decode_concat_request(&request(r#"{"a":"foo","b":"bar","extra":1}"#)).unwrap();
        assert_eq!(req.a, "foo");
        assert_eq!(req.b, "bar");
    }

    #[test]
    fn decode_failures_are_client_errors_once_wrapped() {
        for body in [
            "",
            "{",
            r#"{"a":1}"#,
            r#"{"a":"1","b":2}"#,
            r#"{"a":1.5,"b":2}"#,
            r#"{"a":99999999999999999999,"b":1}"#,
            "[1,2]",
        ] {
            let err = decode_sum_request(&request(body)).unwrap_err();
            assert!(matches!(err, Error::Json(_)), "{body}");
            let wrapped = Error::transport(Domain::Decode, err);
            assert_eq!(status_code(&wrapped), StatusCode::BAD_REQUEST, "{body}");
        }
        let err = decode_concat_request(&request(r#"{"a":1,"b":2}"#)).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn encodes_success() {
        let resp = encode_generic_response(&Outcome::Success(5_i64)).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body_str(), r#"{"v":5,"err":""}"#);
    }

    #[test]
    fn failure_goes_to_error_encoder() {
        let resp: SumResponse = Outcome::Failure(ServiceError::TwoZeroes.into());
        let resp = encode_generic_response(&resp).unwrap();
        assert_eq!(resp.status, 400);
        assert_eq!(
            resp.body_str(),
            r#"{"error":"both arguments cannot be zero"}"#
        );
    }

    #[test]
    fn unknown_failure_is_500() {
        let resp: ConcatResponse = Outcome::Failure(Error::internal("disk on fire"));
        let resp = encode_generic_response(&resp).unwrap();
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body_str(), r#"{"error":"disk on fire"}"#);
    }

    #[test]
    fn success_round_trips() {
        let encoded = encode_generic_response(&Outcome::Success("foobar".to_string())).unwrap();
        let status = StatusCode::from_u16(encoded.status).unwrap();
        let decoded = decode_concat_response(status, &encoded.body).unwrap();
        assert_eq!(decoded.value().map(String::as_str), Some("foobar"));

        let encoded = encode_generic_response(&Outcome::Success(-42_i64)).unwrap();
        let status = StatusCode::from_u16(encoded.status).unwrap();
        let decoded = decode_sum_response(status, &encoded.body).unwrap();
        assert_eq!(decoded.value(), Some(&-42));
    }

    #[test]
    fn failure_round_trips_message() {
        let original: Error = ServiceError::MaxSizeExceeded.into();
        let encoded = encode_error(&original);
        let status = StatusCode::from_u16(encoded.status).unwrap();
        let err = decode_concat_response(status, &encoded.body).unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
        assert_eq!(err.to_string(), original.to_string());
    }

    #[test]
    fn undecodable_error_body_falls_back_to_status_line() {
        let err = decode_sum_response(StatusCode::BAD_GATEWAY, b"<html>").unwrap_err();
        assert_eq!(err.to_string(), "502 Bad Gateway");
    }

    #[test]
    fn embedded_err_becomes_failure() {
        let resp = decode_sum_response(StatusCode::OK, br#"{"v":0,"err":"integer overflow"}"#)
            .unwrap();
        assert_eq!(resp.failed().unwrap().to_string(), "integer overflow");
    }

    #[test]
    fn success_without_value_is_decode_error() {
        let err = decode_sum_response(StatusCode::OK, br#"{"err":""}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn request_encoding_matches_wire_shape() {
        let body = encode_generic_request(&SumRequest { a: 1, b: 2 }).unwrap();
        assert_eq!(body, br#"{"a":1,"b":2}"#);
    }
}
