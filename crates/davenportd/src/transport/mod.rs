//! Socket transport for the daemon.
//!
//! The transport module binds the configured TCP endpoint, optionally
//! terminates TLS, and accepts connections on a background thread, handing
//! each accepted stream to a [`ConnectionHandler`] on its own thread.

mod errors;
mod handler;
mod listener;
mod tls;

pub use self::errors::ListenerError;
pub use self::handler::{ConnectionHandler, ConnectionStream};
pub use self::listener::{ListenerHandle, SocketListener};
pub use self::tls::{TlsContext, TlsError};

pub(crate) const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
