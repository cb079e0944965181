//! Declarative configuration for the davenport daemon.
//!
//! The daemon is configured through [`ServerOptions`]: where to listen,
//! whether to terminate TLS, whether chunked dispatch is enabled, the
//! auto-save snapshot file pair, and logging. Options are plain serde
//! values so embedders can construct them in code while the binary reads
//! them from a JSON document.

mod defaults;
mod endpoint;
mod logging;
mod options;

pub use defaults::{DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_PORT};
pub use endpoint::{Endpoint, EndpointParseError};
pub use logging::{LogFormat, LogOptions};
pub use options::{AutoSaveOptions, OptionsError, ServerOptions, TlsOptions};
