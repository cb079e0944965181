//! Before- and after-request hook chains.
//!
//! Hooks run strictly in registration order on the request's thread, one
//! at a time; returning from [`RequestHook::run`] is the completion
//! signal, so a hook cannot complete twice or be skipped.

use std::sync::Arc;

use super::context::RequestContext;

/// A cross-cutting callback run before or after the handler.
pub trait RequestHook: Send + Sync {
    /// Runs the hook. Returning completes it; the next hook in the chain
    /// does not start until this returns.
    fn run(&self, ctx: &mut RequestContext);
}

/// An ordered chain of hooks.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn RequestHook>>,
}

impl HookChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook; chains run in registration order.
    pub fn register(&mut self, hook: Arc<dyn RequestHook>) {
        self.hooks.push(hook);
    }

    /// Runs every hook in order.
    pub fn run(&self, ctx: &mut RequestContext) {
        for hook in &self.hooks {
            hook.run(ctx);
        }
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// True when no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
