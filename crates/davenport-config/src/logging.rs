//! Logging configuration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults;

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
    /// Human-readable single line output.
    #[default]
    Compact,
}

/// Telemetry settings for the daemon.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LogOptions {
    /// `EnvFilter` expression selecting what gets logged.
    #[serde(default = "defaults::default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default = "defaults::default_log_format")]
    pub format: LogFormat,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            filter: defaults::default_log_filter(),
            format: defaults::default_log_format(),
        }
    }
}
