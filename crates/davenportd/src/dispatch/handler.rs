//! Connection handler driving the request lifecycle.
//!
//! The flow per accepted connection: read and parse the head → resolve the
//! verb (never fails) → build the context, authenticating the caller
//! (failures answer `401`/`500` with no hooks run) → acquire the body with
//! the buffered or streaming strategy → before-hooks → handler → finalise
//! the response → after-hooks. Finalisation happens exactly once; the
//! after-hook chain gates subsequent hooks only, never the response the
//! client already received.

use std::io::{self, Cursor, Read};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::server::ServerCore;
use crate::transport::{ConnectionHandler, ConnectionStream};

use super::DISPATCH_TARGET;
use super::context::RequestContext;
use super::request::{read_request_head, read_with_retry};
use super::response::ResponseWriter;

/// Connection handler wiring the shared server core into the transport.
pub(crate) struct DavConnectionHandler {
    core: Arc<ServerCore>,
}

impl DavConnectionHandler {
    pub(crate) fn new(core: Arc<ServerCore>) -> Self {
        Self { core }
    }

    fn dispatch(&self, mut stream: ConnectionStream) {
        let (head, carry) = match read_request_head(&mut stream) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without a request");
                return;
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to read request head");
                let _ = ResponseWriter::new(&mut stream).write_empty(error.status());
                return;
            }
        };

        let handler = self.core.table.resolve(head.method());
        let method = head.method().clone();
        let target = head.target().to_owned();

        let mut ctx = match RequestContext::build(head, self.core.authenticator.as_ref()) {
            Ok(ctx) => ctx,
            Err(error) => {
                // Terminates before the hook chains: 401 for authentication
                // failures, 500 for anything else.
                warn!(
                    target: DISPATCH_TARGET,
                    method = %method,
                    %error,
                    "request context construction failed"
                );
                let _ = ResponseWriter::new(&mut stream).write_empty(error.status());
                return;
            }
        };

        debug!(
            target: DISPATCH_TARGET,
            method = %method,
            target = %target,
            user = %ctx.user().username,
            "dispatching request"
        );

        if self.core.chunked_dispatch && handler.supports_chunked() {
            self.core.before.run(&mut ctx);
            let declared = ctx.content_length() as u64;
            {
                let mut body = Cursor::new(carry).chain(&mut stream).take(declared);
                handler.invoke_chunked(&mut ctx, &mut body);
            }
        } else {
            let declared = ctx.content_length();
            if declared > 0 {
                match read_exact_body(&mut stream, &carry, declared) {
                    Ok(body) => ctx.set_body(body),
                    Err(error) => {
                        // A request whose body never completes is dropped
                        // unanswered; body accumulation has no read timeout.
                        warn!(target: DISPATCH_TARGET, %error, "connection ended mid body");
                        return;
                    }
                }
            }
            self.core.before.run(&mut ctx);
            handler.invoke(&mut ctx);
        }

        let mut writer = ResponseWriter::new(&mut stream);
        if let Err(error) = writer.write_response(ctx.response()) {
            warn!(target: DISPATCH_TARGET, %error, "failed to write response");
        }
        self.core.after.run(&mut ctx);
    }
}

impl ConnectionHandler for DavConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        self.dispatch(stream);
    }
}

/// Buffered body strategy: a buffer of exactly `declared` bytes, filled
/// from the head carry-over first and then from the stream. Bytes beyond
/// the declared length are never copied.
fn read_exact_body<R: Read>(
    stream: &mut R,
    carry: &[u8],
    declared: usize,
) -> io::Result<Vec<u8>> {
    let mut body = vec![0_u8; declared];
    let prefix = carry.len().min(declared);
    body[..prefix].copy_from_slice(&carry[..prefix]);

    let mut filled = prefix;
    while filled < declared {
        let read = read_with_retry(stream, &mut body[filled..])?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before the declared body arrived",
            ));
        }
        filled += read;
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader that hands out its input a few bytes at a time.
    struct Trickle {
        data: Vec<u8>,
        offset: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let remaining = self.data.len() - self.offset;
            let take = remaining.min(self.step).min(buf.len());
            buf[..take].copy_from_slice(&self.data[self.offset..self.offset + take]);
            self.offset += take;
            Ok(take)
        }
    }

    #[test]
    fn assembles_fragmented_chunks_in_arrival_order() {
        let mut stream = Trickle {
            data: b"lo world".to_vec(),
            offset: 0,
            step: 3,
        };
        let body = read_exact_body(&mut stream, b"hel", 11).expect("body");
        assert_eq!(body, b"hello world");
    }

    #[test]
    fn carry_bytes_beyond_the_declared_length_are_dropped() {
        let mut stream = Trickle {
            data: Vec::new(),
            offset: 0,
            step: 1,
        };
        let body = read_exact_body(&mut stream, b"abcdef", 4).expect("body");
        assert_eq!(body, b"abcd");
    }

    #[test]
    fn early_eof_is_reported() {
        let mut stream = Trickle {
            data: b"xy".to_vec(),
            offset: 0,
            step: 2,
        };
        let error = read_exact_body(&mut stream, b"", 5).expect_err("eof error");
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
    }
}
