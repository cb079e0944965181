//! The server façade owning the request pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use davenport_config::{OptionsError, ServerOptions};
use davenport_types::Method;

use crate::auth::{AnonymousAuthenticator, Authenticator};
use crate::dispatch::{DavConnectionHandler, DavMethod, HookChain, MethodTable, RequestHook};
use crate::persist::{AutoSave, ErrorSink, StreamProvider, TreeSource};
use crate::transport::{ListenerError, ListenerHandle, SocketListener, TlsContext, TlsError};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Shared, immutable view of the pipeline handed to connection threads.
pub(crate) struct ServerCore {
    pub(crate) table: MethodTable,
    pub(crate) before: HookChain,
    pub(crate) after: HookChain,
    pub(crate) authenticator: Arc<dyn Authenticator>,
    pub(crate) chunked_dispatch: bool,
}

/// A WebDAV-class server instance: method table, hook chains and listener
/// lifecycle.
///
/// The lifecycle is Stopped → Listening → Stopped and re-startable.
/// Registration methods take effect at the next [`DavServer::start`].
pub struct DavServer {
    options: ServerOptions,
    tree: Arc<dyn TreeSource>,
    table: MethodTable,
    before: HookChain,
    after: HookChain,
    authenticator: Arc<dyn Authenticator>,
    save_stream_provider: Option<StreamProvider>,
    save_error_sink: Option<ErrorSink>,
    auto_save: Option<AutoSave>,
    auto_save_registered: bool,
    handle: Option<ListenerHandle>,
}

impl DavServer {
    /// Creates a stopped server around the given tree collaborator.
    ///
    /// Until registrations are made every verb answers through the
    /// unknown-method fallback, and authentication is anonymous.
    pub fn new(options: ServerOptions, tree: Arc<dyn TreeSource>) -> Self {
        Self {
            options,
            tree,
            table: MethodTable::new(),
            before: HookChain::new(),
            after: HookChain::new(),
            authenticator: Arc::new(AnonymousAuthenticator),
            save_stream_provider: None,
            save_error_sink: None,
            auto_save: None,
            auto_save_registered: false,
            handle: None,
        }
    }

    /// Registers a handler for a verb.
    pub fn method(&mut self, method: Method, handler: Arc<dyn DavMethod>) {
        self.table.register(method, handler);
    }

    /// Replaces the unknown-method fallback handler.
    pub fn unknown_method(&mut self, handler: Arc<dyn DavMethod>) {
        self.table.set_unknown(handler);
    }

    /// Appends a before-request hook.
    pub fn before_request(&mut self, hook: Arc<dyn RequestHook>) {
        self.before.register(hook);
    }

    /// Appends an after-request hook.
    pub fn after_request(&mut self, hook: Arc<dyn RequestHook>) {
        self.after.register(hook);
    }

    /// Replaces the authenticator consulted during context construction.
    pub fn set_authenticator(&mut self, authenticator: Arc<dyn Authenticator>) {
        self.authenticator = authenticator;
    }

    /// Supplies the persistence stream provider. Takes effect when the
    /// auto-save hook is created on first start.
    pub fn set_save_stream_provider(&mut self, provider: StreamProvider) {
        self.save_stream_provider = Some(provider);
    }

    /// Supplies the persistence error sink. Takes effect when the
    /// auto-save hook is created on first start.
    pub fn set_save_error_sink(&mut self, sink: ErrorSink) {
        self.save_error_sink = Some(sink);
    }

    /// The persistence coordinator, once the first start created it.
    pub fn auto_save(&self) -> Option<&AutoSave> {
        self.auto_save.as_ref()
    }

    /// Starts listening, or returns the bound address unchanged when
    /// already listening.
    ///
    /// The first start with an auto-save block configured creates the
    /// persistence coordinator and registers it on the after-chain; later
    /// starts never register it again.
    ///
    /// # Errors
    ///
    /// Invalid options, unreadable TLS credential material and bind
    /// failures surface synchronously as [`StartError`].
    pub fn start(&mut self) -> Result<SocketAddr, StartError> {
        if let Some(handle) = &self.handle {
            return Ok(handle.local_addr());
        }

        self.options.validate()?;

        if !self.auto_save_registered
            && let Some(auto_save_options) = self.options.auto_save.clone()
        {
            let mut auto_save = AutoSave::new(Arc::clone(&self.tree), auto_save_options);
            if let Some(provider) = self.save_stream_provider.take() {
                auto_save = auto_save.with_stream_provider(provider);
            }
            if let Some(sink) = self.save_error_sink.take() {
                auto_save = auto_save.with_error_sink(sink);
            }
            self.after.register(Arc::new(auto_save.clone()));
            self.auto_save = Some(auto_save);
            self.auto_save_registered = true;
        }

        let tls = match &self.options.tls {
            Some(tls_options) => Some(TlsContext::from_options(tls_options)?),
            None => None,
        };

        let listener = SocketListener::bind(&self.options.host, self.options.port, tls)?;
        let core = Arc::new(ServerCore {
            table: self.table.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
            authenticator: Arc::clone(&self.authenticator),
            chunked_dispatch: self.options.chunked_dispatch,
        });
        let handle = listener.start(Arc::new(DavConnectionHandler::new(core)))?;
        let addr = handle.local_addr();
        info!(
            target: SERVER_TARGET,
            %addr,
            https = self.options.tls.is_some(),
            "server listening"
        );
        self.handle = Some(handle);
        Ok(addr)
    }

    /// True while the listener is accepting connections.
    pub fn is_listening(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the listener, waiting for the accept loop to exit.
    ///
    /// Completes immediately when no listener exists.
    ///
    /// # Errors
    ///
    /// Returns [`StopError::ListenerPanicked`] when the accept-loop thread
    /// panicked instead of exiting cleanly.
    pub fn stop(&mut self) -> Result<(), StopError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle.shutdown();
        handle
            .join()
            .map_err(|_| StopError::ListenerPanicked)?;
        info!(target: SERVER_TARGET, "server stopped");
        Ok(())
    }
}

/// Synchronous failures from [`DavServer::start`].
#[derive(Debug, Error)]
pub enum StartError {
    /// Options failed cross-field validation.
    #[error("invalid server options: {0}")]
    Options(#[from] OptionsError),
    /// TLS credential material could not be loaded.
    #[error(transparent)]
    Tls(#[from] TlsError),
    /// The listener could not be bound or started.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Failures from [`DavServer::stop`].
#[derive(Debug, Error)]
pub enum StopError {
    /// The accept-loop thread panicked.
    #[error("listener thread panicked during shutdown")]
    ListenerPanicked,
}
