use crate::dispatcher::HandlerResponse;
use may_minihttp::Response;

/// Reason phrase for the status line.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown"),
    }
}

/// Copy an encoded [`HandlerResponse`] onto the wire response.
pub fn write_handler_response(res: &mut Response, resp: HandlerResponse) {
    res.status_code(usize::from(resp.status), status_reason(resp.status));
    res.header(resp.content_type.header_line());
    res.body_vec(resp.body);
}
