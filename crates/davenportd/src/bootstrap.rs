//! Daemon bootstrap orchestration.

use std::sync::Arc;

use camino::Utf8Path;
use thiserror::Error;
use tracing::info;

use davenport_config::{OptionsError, ServerOptions};

use crate::persist::TreeSource;
use crate::pkg;
use crate::server::DavServer;
use crate::telemetry::{self, TelemetryError};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying options error.
        #[source]
        source: OptionsError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Builds a stopped server from resolved options: validates them,
/// initialises telemetry and wires the tree collaborator.
pub fn bootstrap(
    options: ServerOptions,
    tree: Arc<dyn TreeSource>,
) -> Result<DavServer, BootstrapError> {
    options
        .validate()
        .map_err(|source| BootstrapError::Configuration { source })?;
    telemetry::initialise(&options.log).map_err(|source| BootstrapError::Telemetry { source })?;

    let info = pkg::package_info();
    info!(
        target: BOOTSTRAP_TARGET,
        name = info.name,
        version = info.version,
        host = %options.host,
        port = options.port,
        "bootstrap complete"
    );
    Ok(DavServer::new(options, tree))
}

/// Loads options from a JSON file, then bootstraps.
pub fn bootstrap_from_file(
    path: &Utf8Path,
    tree: Arc<dyn TreeSource>,
) -> Result<DavServer, BootstrapError> {
    let options = ServerOptions::from_file(path)
        .map_err(|source| BootstrapError::Configuration { source })?;
    bootstrap(options, tree)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct NullTree;

    impl TreeSource for NullTree {
        fn save(&self) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>> {
            Ok(json!({}))
        }
    }

    #[test]
    fn bootstrap_yields_a_stopped_server() {
        let options = ServerOptions {
            port: 0,
            ..ServerOptions::default()
        };
        let server = bootstrap(options, Arc::new(NullTree)).expect("bootstrap");
        assert!(!server.is_listening());
    }

    #[test]
    fn bootstrap_from_missing_file_is_a_configuration_error() {
        let result = bootstrap_from_file(Utf8Path::new("/nonexistent/options.json"), Arc::new(NullTree));
        assert!(matches!(
            result,
            Err(BootstrapError::Configuration { .. })
        ));
    }
}
