use may_minihttp::Request;
use std::collections::HashMap;
use std::io::{self, Read};
use tracing::debug;

/// Parsed HTTP request data used by `AppService`.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Raw request body
    pub body: Vec<u8>,
}

/// Route path of a request target; the query string plays no part in routing.
fn route_path(target: &str) -> &str {
    target.split_once('?').map_or(target, |(path, _)| path)
}

/// Extract useful information from a `may_minihttp::Request`.
///
/// Consumes the request because the body can only be read once.
///
/// # Errors
///
/// Returns the I/O error raised while reading the body.
pub fn parse_request(req: Request) -> io::Result<ParsedRequest> {
    let method = req.method().to_string();
    let path = route_path(req.path()).to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let mut body = Vec::new();
    req.body().read_to_end(&mut body)?;

    debug!(
        method = %method,
        path = %path,
        header_count = headers.len(),
        body_size = body.len(),
        "HTTP request parsed"
    );

    Ok(ParsedRequest {
        method,
        path,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_is_dropped() {
        assert_eq!(route_path("/sum"), "/sum");
        assert_eq!(route_path("/sum?x=1"), "/sum");
        assert_eq!(route_path("/concat?"), "/concat");
    }
}
