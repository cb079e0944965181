//! Per-request state.

use davenport_types::{DavPath, Method};
use thiserror::Error;

use crate::auth::{AuthError, Authenticator, UserIdentity};

use super::request::RequestHead;
use super::response::Response;

/// State carried through one request's hooks and handler.
///
/// Built per accepted connection after method resolution; construction
/// authenticates the caller, and a construction failure terminates the
/// request (`401` or `500`) before any hook runs.
pub struct RequestContext {
    head: RequestHead,
    user: UserIdentity,
    body: Vec<u8>,
    response: Response,
}

impl RequestContext {
    pub(crate) fn build(
        head: RequestHead,
        authenticator: &dyn Authenticator,
    ) -> Result<Self, ContextError> {
        let user = authenticator.authenticate(&head)?;
        Ok(Self {
            head,
            user,
            body: Vec::new(),
            response: Response::default(),
        })
    }

    /// The parsed request head.
    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    /// The request verb.
    pub fn method(&self) -> &Method {
        self.head.method()
    }

    /// The resource path addressed by the request.
    pub fn path(&self) -> &DavPath {
        self.head.path()
    }

    /// The declared body length.
    pub fn content_length(&self) -> usize {
        self.head.content_length()
    }

    /// The authenticated caller.
    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    /// The accumulated body.
    ///
    /// Empty under the streaming strategy, where the handler consumes the
    /// live stream itself.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    /// The response under construction.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Mutable access to the response under construction.
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }
}

/// Failures while building a [`RequestContext`].
#[derive(Debug, Error)]
pub enum ContextError {
    /// Authentication refused the request.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Any other construction failure.
    #[error("failed to build request context: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl ContextError {
    /// Status code terminating the request: authentication failures are a
    /// client-class `401`, everything else a server-class `500`.
    pub fn status(&self) -> u16 {
        match self {
            Self::Auth(_) => 401,
            Self::Internal { .. } => 500,
        }
    }
}
