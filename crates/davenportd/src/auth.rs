//! Authentication collaborators.
//!
//! Authentication happens while the request context is built, before any
//! hook or handler runs. Every [`AuthError`] maps to `401 Unauthorized`;
//! the providers here are the bundled defaults, and embedders supply their
//! own by implementing [`Authenticator`].

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

use crate::dispatch::RequestHead;

/// The caller identity attached to a request context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// User name as authenticated.
    pub username: String,
}

impl UserIdentity {
    /// Identity used when no authentication is configured.
    pub fn anonymous() -> Self {
        Self {
            username: "anonymous".to_owned(),
        }
    }
}

/// Authentication failures, all answered with `401 Unauthorized`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// A stored credential is missing the property needed to verify.
    #[error("user record is missing a credential property")]
    MissingCredentialProperty,
    /// The request carried no `Authorization` header.
    #[error("missing authorization header")]
    MissingAuthorizationHeader,
    /// Credentials did not verify.
    #[error("bad authentication")]
    BadAuthentication,
    /// The `Authorization` header was not in the expected format.
    #[error("malformed authorization header")]
    MalformedHeader,
}

/// Authenticates a request from its parsed head.
pub trait Authenticator: Send + Sync {
    /// Returns the caller identity or the reason the request is refused.
    fn authenticate(&self, head: &RequestHead) -> Result<UserIdentity, AuthError>;
}

/// Accepts every request with the anonymous identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousAuthenticator;

impl Authenticator for AnonymousAuthenticator {
    fn authenticate(&self, _head: &RequestHead) -> Result<UserIdentity, AuthError> {
        Ok(UserIdentity::anonymous())
    }
}

/// HTTP Basic authentication over an in-memory user store.
///
/// A user stored without a password cannot be verified and is refused with
/// [`AuthError::MissingCredentialProperty`].
#[derive(Debug, Default)]
pub struct BasicAuthenticator {
    users: HashMap<String, Option<String>>,
}

impl BasicAuthenticator {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user with a verifiable password.
    pub fn add_user(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.users.insert(username.into(), Some(password.into()));
    }

    /// Adds a user record without a password.
    pub fn add_user_without_password(&mut self, username: impl Into<String>) {
        self.users.insert(username.into(), None);
    }
}

impl Authenticator for BasicAuthenticator {
    fn authenticate(&self, head: &RequestHead) -> Result<UserIdentity, AuthError> {
        let header = head
            .header("authorization")
            .ok_or(AuthError::MissingAuthorizationHeader)?;

        let (scheme, payload) = header
            .split_once(' ')
            .ok_or(AuthError::MalformedHeader)?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AuthError::MalformedHeader);
        }

        let decoded = BASE64
            .decode(payload.trim())
            .map_err(|_| AuthError::MalformedHeader)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedHeader)?;
        let (username, password) = decoded.split_once(':').ok_or(AuthError::MalformedHeader)?;

        match self.users.get(username) {
            None => Err(AuthError::BadAuthentication),
            Some(None) => Err(AuthError::MissingCredentialProperty),
            Some(Some(stored)) if stored == password => Ok(UserIdentity {
                username: username.to_owned(),
            }),
            Some(Some(_)) => Err(AuthError::BadAuthentication),
        }
    }
}

#[cfg(test)]
mod tests {
    use davenport_types::Method;

    use super::*;

    fn head_with_authorization(value: Option<&str>) -> RequestHead {
        match value {
            Some(value) => {
                RequestHead::for_tests(Method::Get, "/", &[("Authorization", value)])
            }
            None => RequestHead::for_tests(Method::Get, "/", &[]),
        }
    }

    fn basic_header(credentials: &str) -> String {
        format!("Basic {}", BASE64.encode(credentials))
    }

    fn store() -> BasicAuthenticator {
        let mut auth = BasicAuthenticator::new();
        auth.add_user("mirabel", "s3cret");
        auth.add_user_without_password("ghost");
        auth
    }

    #[test]
    fn anonymous_always_succeeds() {
        let identity = AnonymousAuthenticator
            .authenticate(&head_with_authorization(None))
            .expect("anonymous identity");
        assert_eq!(identity, UserIdentity::anonymous());
    }

    #[test]
    fn valid_credentials_authenticate() {
        let header = basic_header("mirabel:s3cret");
        let identity = store()
            .authenticate(&head_with_authorization(Some(&header)))
            .expect("identity");
        assert_eq!(identity.username, "mirabel");
    }

    #[test]
    fn missing_header_is_its_own_failure() {
        let result = store().authenticate(&head_with_authorization(None));
        assert_eq!(result, Err(AuthError::MissingAuthorizationHeader));
    }

    #[test]
    fn wrong_scheme_is_malformed() {
        let result = store().authenticate(&head_with_authorization(Some("Bearer abc")));
        assert_eq!(result, Err(AuthError::MalformedHeader));
    }

    #[test]
    fn undecodable_payload_is_malformed() {
        let result = store().authenticate(&head_with_authorization(Some("Basic ???")));
        assert_eq!(result, Err(AuthError::MalformedHeader));
    }

    #[test]
    fn wrong_password_is_bad_authentication() {
        let header = basic_header("mirabel:wrong");
        let result = store().authenticate(&head_with_authorization(Some(&header)));
        assert_eq!(result, Err(AuthError::BadAuthentication));
    }

    #[test]
    fn unknown_user_is_bad_authentication() {
        let header = basic_header("nobody:pw");
        let result = store().authenticate(&head_with_authorization(Some(&header)));
        assert_eq!(result, Err(AuthError::BadAuthentication));
    }

    #[test]
    fn passwordless_record_is_missing_credential_property() {
        let header = basic_header("ghost:pw");
        let result = store().authenticate(&head_with_authorization(Some(&header)));
        assert_eq!(result, Err(AuthError::MissingCredentialProperty));
    }
}
