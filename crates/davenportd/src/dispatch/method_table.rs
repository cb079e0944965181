//! Verb-to-handler registry.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use davenport_types::Method;
use tracing::debug;

use super::DISPATCH_TARGET;
use super::context::RequestContext;

/// A protocol method handler.
///
/// Handlers receive the request context with the body already buffered.
/// A handler that can consume the raw body stream itself additionally
/// declares chunk capability; [`DavMethod::invoke_chunked`] is only called
/// when chunked dispatch is enabled server-wide *and* the handler declares
/// support.
pub trait DavMethod: Send + Sync {
    /// Handles a request whose body is buffered in the context.
    fn invoke(&self, ctx: &mut RequestContext);

    /// True when the handler can consume the live body stream itself.
    fn supports_chunked(&self) -> bool {
        false
    }

    /// Handles a request by consuming the live body stream directly.
    ///
    /// The default delegates to [`DavMethod::invoke`] without touching the
    /// stream; handlers that declare chunk capability override this.
    fn invoke_chunked(&self, ctx: &mut RequestContext, _body: &mut dyn Read) {
        self.invoke(ctx);
    }
}

/// Fallback for verbs nothing was registered for: `501 Not Implemented`.
struct NotImplemented;

impl DavMethod for NotImplemented {
    fn invoke(&self, ctx: &mut RequestContext) {
        ctx.response_mut().set_status(501);
    }
}

/// Registry mapping a normalised verb to its handler.
///
/// Resolution never fails: verbs without a registration resolve to the
/// unknown-method handler, a handled case rather than an error.
#[derive(Clone)]
pub struct MethodTable {
    handlers: HashMap<Method, Arc<dyn DavMethod>>,
    unknown: Arc<dyn DavMethod>,
}

impl Default for MethodTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodTable {
    /// Creates an empty table with the `501` fallback.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            unknown: Arc::new(NotImplemented),
        }
    }

    /// Registers a handler, replacing any previous one for the verb.
    pub fn register(&mut self, method: Method, handler: Arc<dyn DavMethod>) {
        debug!(target: DISPATCH_TARGET, method = %method, "method handler registered");
        self.handlers.insert(method, handler);
    }

    /// Replaces the unknown-method fallback.
    pub fn set_unknown(&mut self, handler: Arc<dyn DavMethod>) {
        self.unknown = handler;
    }

    /// Resolves a verb to its handler, falling back for unknown verbs.
    pub fn resolve(&self, method: &Method) -> Arc<dyn DavMethod> {
        self.handlers
            .get(method)
            .map_or_else(|| Arc::clone(&self.unknown), Arc::clone)
    }
}
