//! Default values shared between serde defaulting and the binary.

use crate::logging::LogFormat;

/// Default listen host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 1900;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

pub(crate) fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

pub(crate) fn default_port() -> u16 {
    DEFAULT_PORT
}

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

pub(crate) fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
