use crate::dispatcher::{HandlerRequest, HandlerResponse, RouteHandler};
use crate::endpoints::EndpointPtr;
use crate::error::{status_code, Domain, Error, Result};
use tracing::{debug, error, warn};

use super::codec::encode_error;

/// Decodes a request body into the endpoint's request type.
pub type DecodeRequestFn<Req> = fn(&HandlerRequest) -> Result<Req>;
/// Encodes the endpoint's response into an HTTP response.
pub type EncodeResponseFn<Resp> = fn(&Resp) -> Result<HandlerResponse>;
/// Encodes any error raised while serving a request.
pub type ErrorEncoderFn = fn(&Error) -> HandlerResponse;

/// Binds one endpoint to HTTP through a decoder and an encoder.
///
/// Every failure is tagged with the phase it surfaced in before being handed
/// to the error encoder, so the status code reflects whose fault it was.
pub struct Server<Req, Resp> {
    endpoint: EndpointPtr<Req, Resp>,
    decode: DecodeRequestFn<Req>,
    encode: EncodeResponseFn<Resp>,
    error_encoder: ErrorEncoderFn,
}

impl<Req, Resp> Server<Req, Resp> {
    #[must_use]
    pub fn new(
        endpoint: EndpointPtr<Req, Resp>,
        decode: DecodeRequestFn<Req>,
        encode: EncodeResponseFn<Resp>,
    ) -> Self {
        Self {
            endpoint,
            decode,
            encode,
            error_encoder: encode_error,
        }
    }

    /// Replace the default [`encode_error`].
    #[must_use]
    pub fn with_error_encoder(mut self, error_encoder: ErrorEncoderFn) -> Self {
        self.error_encoder = error_encoder;
        self
    }

    fn handle(&self, req: &HandlerRequest) -> Result<HandlerResponse> {
        let request = (self.decode)(req).map_err(|e| Error::transport(Domain::Decode, e))?;
        let response = self
            .endpoint
            .call(request)
            .map_err(|e| Error::transport(Domain::Do, e))?;
        (self.encode)(&response).map_err(|e| Error::transport(Domain::Encode, e))
    }
}

impl<Req, Resp> RouteHandler for Server<Req, Resp> {
    fn serve(&self, req: &HandlerRequest) -> HandlerResponse {
        match self.handle(req) {
            Ok(resp) => {
                debug!(
                    request_id = %req.request_id,
                    handler_name = %req.handler_name,
                    status = resp.status,
                    "Response encoded"
                );
                resp
            }
            Err(err) => {
                let status = status_code(&err);
                let domain = err.domain().map(Domain::as_str).unwrap_or_default();
                if status.is_server_error() {
                    error!(
                        request_id = %req.request_id,
                        handler_name = %req.handler_name,
                        domain = domain,
                        status = status.as_u16(),
                        error = %err,
                        "Request failed"
                    );
                } else {
                    warn!(
                        request_id = %req.request_id,
                        handler_name = %req.handler_name,
                        domain = domain,
                        status = status.as_u16(),
                        error = %err,
                        "Request rejected"
                    );
                }
                (self.error_encoder)(&err)
            }
        }
    }
}
