//! Request pipeline core of the davenport WebDAV-class daemon.
//!
//! The daemon accepts HTTP or HTTPS connections, resolves the request verb
//! through a method table with an unknown-method fallback, authenticates
//! the caller while building the per-request context, acquires the body
//! with one of two strategies (fully buffered, or streamed straight to a
//! chunk-capable handler), runs the before-hook chain, invokes the
//! handler, finalises the response, and then runs the after-hook chain.
//!
//! Mutating verbs feed the [`persist`] coordinator, which serialises the
//! resource-tree snapshot, gzips it to a temporary file and atomically
//! renames it over the previous snapshot, coalescing overlapping save
//! requests into at most one deferred follow-up cycle.
//!
//! Concrete WebDAV method handlers, the resource-tree implementation and
//! authentication stores are external collaborators supplied through the
//! [`DavMethod`], [`TreeSource`] and [`Authenticator`] seams.

mod auth;
mod bootstrap;
mod dispatch;
mod persist;
mod pkg;
mod placeholder;
mod server;
mod telemetry;
mod transport;

pub use auth::{AnonymousAuthenticator, AuthError, Authenticator, BasicAuthenticator, UserIdentity};
pub use bootstrap::{BootstrapError, bootstrap, bootstrap_from_file};
pub use dispatch::{
    ContextError, DavMethod, DispatchError, HookChain, MethodTable, RequestContext, RequestHead,
    RequestHook, Response,
};
pub use persist::{AutoSave, ErrorSink, PersistError, StreamProvider, TreeSource};
pub use pkg::{PackageInfo, package_info};
pub use placeholder::MemoryTree;
pub use server::{DavServer, StartError, StopError};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{ConnectionHandler, ConnectionStream, ListenerError, TlsError};

#[cfg(test)]
mod tests;
