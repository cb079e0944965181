//! Response construction and wire serialisation.

use std::io::{self, Write};

/// The response a handler builds while serving a request.
///
/// The coordinator serialises it exactly once after the handler returns;
/// `Content-Length` and `Connection` are owned by the serialiser and
/// cannot be overridden by handler headers.
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

impl Response {
    /// The current status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    /// Appends a response header.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replaces the response body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// The body bytes set so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

pub(crate) fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        207 => "Multi-Status",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        423 => "Locked",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        505 => "HTTP Version Not Supported",
        _ => "Unknown",
    }
}

/// Serialises responses onto a connection stream.
pub(crate) struct ResponseWriter<W: Write> {
    inner: W,
}

impl<W: Write> ResponseWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes a full response: status line, handler headers (minus the
    /// reserved ones), framing headers and body.
    pub(crate) fn write_response(&mut self, response: &Response) -> io::Result<()> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n",
            response.status,
            status_reason(response.status)
        );
        for (name, value) in &response.headers {
            if name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("connection")
            {
                continue;
            }
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            response.body.len()
        ));

        self.inner.write_all(head.as_bytes())?;
        self.inner.write_all(&response.body)?;
        self.inner.flush()
    }

    /// Terminates a request with a bare status and no body.
    pub(crate) fn write_empty(&mut self, status: u16) -> io::Result<()> {
        let head = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            status,
            status_reason(status)
        );
        self.inner.write_all(head.as_bytes())?;
        self.inner.flush()
    }
}
