//! Connection handling abstractions for the daemon listener.

use std::io::{self, Read, Write};
use std::net::TcpStream;

use rustls::{ServerConnection, StreamOwned};

/// Stream types accepted by the daemon listener.
///
/// TLS streams complete their handshake lazily on first read or write.
pub enum ConnectionStream {
    /// Plain HTTP connection.
    Plain(TcpStream),
    /// TLS-terminated HTTPS connection.
    Tls(Box<StreamOwned<ServerConnection, TcpStream>>),
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

/// Handles accepted socket connections.
///
/// Implementations run on a dedicated thread per connection and should
/// avoid panicking; a panic tears down that connection's thread only.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection.
    fn handle(&self, stream: ConnectionStream);
}
