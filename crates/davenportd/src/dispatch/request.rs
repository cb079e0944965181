//! Request-head acquisition and parsing.
//!
//! The head is accumulated chunk-wise until the `\r\n\r\n` terminator,
//! bounded by [`MAX_HEAD_BYTES`]. Bytes that arrive past the terminator
//! belong to the body and are carried over to the body-acquisition step.

use std::collections::HashMap;
use std::io::{self, Read};

use davenport_types::{DavPath, Method};

use super::errors::DispatchError;

/// Maximum size of a request head in bytes.
pub(crate) const MAX_HEAD_BYTES: usize = 16 * 1024;

/// Parsed request line and header block.
#[derive(Debug)]
pub struct RequestHead {
    method: Method,
    target: String,
    path: DavPath,
    headers: HashMap<String, String>,
}

impl RequestHead {
    /// The normalised request verb.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw request target, query string included.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The resource path addressed by the request.
    pub fn path(&self) -> &DavPath {
        &self.path
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The declared body length.
    ///
    /// A missing, unparseable or negative `Content-Length` declares zero,
    /// which dispatches with an empty body and no body read.
    pub fn content_length(&self) -> usize {
        self.header("content-length")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(method: Method, target: &str, headers: &[(&str, &str)]) -> Self {
        Self {
            method,
            target: target.to_owned(),
            path: DavPath::parse(target),
            headers: headers
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), (*value).to_owned()))
                .collect(),
        }
    }
}

/// Reads a bounded request head from the stream.
///
/// Returns `Ok(None)` when the client disconnects without sending data.
/// On success the second element holds the body bytes that arrived after
/// the head terminator.
pub(crate) fn read_request_head<R: Read>(
    stream: &mut R,
) -> Result<Option<(RequestHead, Vec<u8>)>, DispatchError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];

    loop {
        let bytes_read = read_with_retry(stream, &mut chunk)?;

        if bytes_read == 0 {
            return if buffer.is_empty() {
                Ok(None)
            } else {
                Err(DispatchError::TruncatedHead)
            };
        }

        buffer.extend_from_slice(&chunk[..bytes_read]);
        enforce_head_limit(buffer.len())?;

        if let Some(end) = find_head_end(&buffer) {
            let carry = buffer.split_off(end);
            let head = parse_head(&buffer)?;
            return Ok(Some((head, carry)));
        }
    }
}

/// Reads from the stream, retrying on interrupts.
pub(crate) fn read_with_retry<R: Read>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn enforce_head_limit(size: usize) -> Result<(), DispatchError> {
    if size > MAX_HEAD_BYTES {
        return Err(DispatchError::HeadTooLarge {
            size,
            max: MAX_HEAD_BYTES,
        });
    }
    Ok(())
}

/// Position just past the `\r\n\r\n` terminator, if present.
fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|index| index + 4)
}

fn parse_head(bytes: &[u8]) -> Result<RequestHead, DispatchError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| DispatchError::malformed("head is not valid UTF-8"))?;
    let mut lines = text.split("\r\n");

    let request_line = lines
        .next()
        .ok_or_else(|| DispatchError::malformed("empty head"))?;
    let mut parts = request_line.splitn(3, ' ');
    let method_token = parts
        .next()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| DispatchError::malformed("missing method"))?;
    let target = parts
        .next()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| DispatchError::malformed("missing request target"))?;
    let version = parts
        .next()
        .ok_or_else(|| DispatchError::malformed("missing protocol version"))?;
    if !version.starts_with("HTTP/1.") {
        return Err(DispatchError::UnsupportedVersion {
            version: version.to_owned(),
        });
    }

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| DispatchError::malformed(format!("header line '{line}'")))?;
        if name.is_empty() {
            return Err(DispatchError::malformed("empty header name"));
        }
        headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    let path_part = target.split('?').next().unwrap_or(target);
    Ok(RequestHead {
        method: Method::parse(method_token),
        target: target.to_owned(),
        path: DavPath::parse(path_part),
        headers,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn read(input: &[u8]) -> Result<Option<(RequestHead, Vec<u8>)>, DispatchError> {
        read_request_head(&mut Cursor::new(input.to_vec()))
    }

    #[test]
    fn parses_minimal_request() {
        let (head, carry) = read(b"GET /a/b HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .expect("read head")
            .expect("head present");
        assert_eq!(head.method(), &Method::Get);
        assert_eq!(head.target(), "/a/b");
        assert_eq!(head.path(), &DavPath::parse("/a/b"));
        assert_eq!(head.header("host"), Some("localhost"));
        assert_eq!(head.header("HOST"), Some("localhost"));
        assert!(carry.is_empty());
    }

    #[test]
    fn carries_over_body_bytes_past_the_terminator() {
        let (head, carry) = read(b"PUT /f HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel")
            .expect("read head")
            .expect("head present");
        assert_eq!(head.content_length(), 5);
        assert_eq!(carry, b"hel");
    }

    #[test]
    fn strips_query_from_the_path() {
        let (head, _) = read(b"GET /a/b?depth=1 HTTP/1.1\r\n\r\n")
            .expect("read head")
            .expect("head present");
        assert_eq!(head.target(), "/a/b?depth=1");
        assert_eq!(head.path(), &DavPath::parse("/a/b"));
    }

    #[test]
    fn content_length_defaults_to_zero() {
        let (head, _) = read(b"PUT / HTTP/1.1\r\n\r\n")
            .expect("read head")
            .expect("head present");
        assert_eq!(head.content_length(), 0);

        let (head, _) = read(b"PUT / HTTP/1.1\r\nContent-Length: -4\r\n\r\n")
            .expect("read head")
            .expect("head present");
        assert_eq!(head.content_length(), 0);
    }

    #[test]
    fn unknown_verbs_parse_as_extensions() {
        let (head, _) = read(b"FROB / HTTP/1.1\r\n\r\n")
            .expect("read head")
            .expect("head present");
        assert_eq!(head.method(), &Method::Extension("FROB".to_owned()));
    }

    #[test]
    fn empty_connection_yields_none() {
        assert!(read(b"").expect("read head").is_none());
    }

    #[test]
    fn truncated_head_is_an_error() {
        let result = read(b"GET / HTTP/1.1\r\nHost: x");
        assert!(matches!(result, Err(DispatchError::TruncatedHead)));
    }

    #[test]
    fn rejects_non_http_version() {
        let result = read(b"GET / SPDY/3\r\n\r\n");
        assert!(matches!(
            result,
            Err(DispatchError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn rejects_header_without_colon() {
        let result = read(b"GET / HTTP/1.1\r\nbroken header\r\n\r\n");
        assert!(matches!(result, Err(DispatchError::MalformedHead { .. })));
    }

    #[test]
    fn enforces_the_head_bound() {
        let mut request = Vec::from(&b"GET / HTTP/1.1\r\n"[..]);
        request.extend_from_slice(format!("X-Pad: {}\r\n\r\n", "p".repeat(MAX_HEAD_BYTES)).as_bytes());
        let result = read(&request);
        assert!(matches!(result, Err(DispatchError::HeadTooLarge { .. })));
    }
}
