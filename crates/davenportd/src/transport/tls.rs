//! TLS termination for the listener.

use std::fs::File;
use std::io::{self, BufReader};
use std::net::TcpStream;
use std::sync::Arc;

use camino::Utf8PathBuf;
use rustls::{ServerConfig, ServerConnection, StreamOwned};
use thiserror::Error;

use davenport_config::TlsOptions;

use super::handler::ConnectionStream;

/// A reusable TLS acceptor built once from the configured credential
/// material and shared by every accepted connection.
#[derive(Clone)]
pub struct TlsContext {
    config: Arc<ServerConfig>,
}

impl TlsContext {
    /// Loads the PEM certificate chain and private key and builds the
    /// server-side TLS configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`TlsError`] describing which part of the credential
    /// material could not be loaded or was rejected.
    pub fn from_options(options: &TlsOptions) -> Result<Self, TlsError> {
        let mut cert_reader = open(&options.cert_path, TlsError::read_certificate)?;
        let certs = rustls_pemfile::certs(&mut cert_reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| TlsError::read_certificate(&options.cert_path, source))?;
        if certs.is_empty() {
            return Err(TlsError::EmptyCertificate {
                path: options.cert_path.clone(),
            });
        }

        let mut key_reader = open(&options.key_path, TlsError::read_key)?;
        let key = rustls_pemfile::private_key(&mut key_reader)
            .map_err(|source| TlsError::read_key(&options.key_path, source))?
            .ok_or_else(|| TlsError::MissingKey {
                path: options.key_path.clone(),
            })?;

        let config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|source| TlsError::Config { source })?;

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Wraps an accepted socket in a server-side TLS session.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError::Session`] when a session cannot be created from
    /// the shared configuration.
    pub fn wrap(&self, stream: TcpStream) -> Result<ConnectionStream, TlsError> {
        let connection = ServerConnection::new(Arc::clone(&self.config))
            .map_err(|source| TlsError::Session { source })?;
        Ok(ConnectionStream::Tls(Box::new(StreamOwned::new(
            connection, stream,
        ))))
    }
}

fn open(
    path: &Utf8PathBuf,
    wrap: impl Fn(&Utf8PathBuf, io::Error) -> TlsError,
) -> Result<BufReader<File>, TlsError> {
    File::open(path.as_std_path())
        .map(BufReader::new)
        .map_err(|source| wrap(path, source))
}

/// Errors surfaced while loading TLS credential material.
#[derive(Debug, Error)]
pub enum TlsError {
    /// Certificate file could not be read.
    #[error("failed to read certificate file {path}: {source}")]
    ReadCertificate {
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Certificate file held no certificates.
    #[error("no certificates found in {path}")]
    EmptyCertificate {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// Private key file could not be read.
    #[error("failed to read private key file {path}: {source}")]
    ReadKey {
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Private key file held no key.
    #[error("no private key found in {path}")]
    MissingKey {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// Credential material was rejected by the TLS stack.
    #[error("rejected TLS credential material: {source}")]
    Config {
        /// Underlying TLS error.
        #[source]
        source: rustls::Error,
    },
    /// A per-connection session could not be created.
    #[error("failed to begin TLS session: {source}")]
    Session {
        /// Underlying TLS error.
        #[source]
        source: rustls::Error,
    },
}

impl TlsError {
    fn read_certificate(path: &Utf8PathBuf, source: io::Error) -> Self {
        Self::ReadCertificate {
            path: path.clone(),
            source,
        }
    }

    fn read_key(path: &Utf8PathBuf, source: io::Error) -> Self {
        Self::ReadKey {
            path: path.clone(),
            source,
        }
    }
}
