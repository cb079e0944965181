//! Per-request dispatch pipeline.
//!
//! Each accepted connection serves one request: the head is accumulated
//! and parsed, the verb is resolved through the [`MethodTable`] (unknown
//! verbs fall through to the table's fallback handler), and the
//! [`RequestContext`] is built, authenticating the caller with failures
//! mapped to `401` or `500` before any hook runs. The body is then
//! acquired with the buffered or streaming strategy, the before-hook
//! chain runs, the handler executes, the response is finalised, and the
//! after-hook chain runs.

mod context;
mod errors;
mod handler;
mod hooks;
mod method_table;
mod request;
mod response;

pub use self::context::{ContextError, RequestContext};
pub use self::errors::DispatchError;
pub(crate) use self::handler::DavConnectionHandler;
pub use self::hooks::{HookChain, RequestHook};
pub use self::method_table::{DavMethod, MethodTable};
pub use self::request::RequestHead;
pub use self::response::Response;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
