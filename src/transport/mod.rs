//! # Transport Module
//!
//! JSON-over-HTTP bindings for the endpoints.
//!
//! The [`codec`] functions convert between HTTP bodies and endpoint
//! request/response types on both the server and the client side. [`Server`]
//! glues a decoder, an endpoint and an encoder into a
//! [`crate::dispatcher::RouteHandler`].
//!
//! ## Wire format
//!
//! | Route          | Request                   | Success (200)               |
//! |----------------|---------------------------|-----------------------------|
//! | `POST /sum`    | `{"a": int, "b": int}`    | `{"v": int, "err": ""}`     |
//! | `POST /concat` | `{"a": str, "b": str}`    | `{"v": str, "err": ""}`     |
//!
//! Errors are `{"error": "<message>"}` with a status from
//! [`crate::error::status_code`].

pub mod codec;
mod server;

pub use codec::{
    decode_concat_request, decode_concat_response, decode_error, decode_response,
    decode_sum_request, decode_sum_response, encode_error, encode_generic_request,
    encode_generic_response, ErrorWrapper,
};
pub use server::{DecodeRequestFn, EncodeResponseFn, ErrorEncoderFn, Server};
