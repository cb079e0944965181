//! Server option structures and validation.

use std::fs::File;
use std::io::{self, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults;
use crate::logging::LogOptions;

/// Complete configuration for one daemon instance.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerOptions {
    /// Host name or address to bind.
    #[serde(default = "defaults::default_host")]
    pub host: String,
    /// TCP port to bind. Port `0` requests an ephemeral port.
    #[serde(default = "defaults::default_port")]
    pub port: u16,
    /// TLS credential material; present selects HTTPS, absent plain HTTP.
    #[serde(default)]
    pub tls: Option<TlsOptions>,
    /// Enables streaming body dispatch for handlers that declare support.
    #[serde(default)]
    pub chunked_dispatch: bool,
    /// Snapshot persistence settings; absent disables auto-save.
    #[serde(default)]
    pub auto_save: Option<AutoSaveOptions>,
    /// Telemetry settings.
    #[serde(default)]
    pub log: LogOptions,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: defaults::default_host(),
            port: defaults::default_port(),
            tls: None,
            chunked_dispatch: false,
            auto_save: None,
            log: LogOptions::default(),
        }
    }
}

impl ServerOptions {
    /// Reads options from a JSON document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::Read`] when the file cannot be opened and
    /// [`OptionsError::Parse`] when it is not a valid options document.
    pub fn from_file(path: &Utf8Path) -> Result<Self, OptionsError> {
        let file = File::open(path.as_std_path()).map_err(|source| OptionsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let options: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| OptionsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        options.validate()?;
        Ok(options)
    }

    /// Checks cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::AutoSavePathsEqual`] when the snapshot file
    /// and its temporary twin point at the same path; the atomic-replace
    /// protocol requires them to differ.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if let Some(auto_save) = &self.auto_save
            && auto_save.tree_file == auto_save.temp_tree_file
        {
            return Err(OptionsError::AutoSavePathsEqual {
                path: auto_save.tree_file.clone(),
            });
        }
        Ok(())
    }
}

/// TLS credential material enabling HTTPS.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TlsOptions {
    /// PEM file holding the certificate chain.
    pub cert_path: Utf8PathBuf,
    /// PEM file holding the private key.
    pub key_path: Utf8PathBuf,
}

/// Snapshot persistence file pair.
///
/// The stream-provider and error-sink collaborators of the persistence
/// coordinator are code, not configuration, and are set on the coordinator
/// itself.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AutoSaveOptions {
    /// Final snapshot path.
    pub tree_file: Utf8PathBuf,
    /// Temporary path written first, then renamed over `tree_file`.
    pub temp_tree_file: Utf8PathBuf,
}

/// Errors surfaced while loading or validating options.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Options file could not be opened.
    #[error("failed to read options file {path}: {source}")]
    Read {
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Options file is not a valid document.
    #[error("failed to parse options file {path}: {source}")]
    Parse {
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// The auto-save snapshot and temporary paths coincide.
    #[error("auto-save tree file and temporary file are both {path}")]
    AutoSavePathsEqual {
        /// The shared path.
        path: Utf8PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn defaults_are_plain_http() {
        let options = ServerOptions::default();
        assert_eq!(options.host, "127.0.0.1");
        assert_eq!(options.port, 1900);
        assert!(options.tls.is_none());
        assert!(!options.chunked_dispatch);
        assert!(options.auto_save.is_none());
    }

    #[test]
    fn validate_rejects_equal_auto_save_paths() {
        let options = ServerOptions {
            auto_save: Some(AutoSaveOptions {
                tree_file: Utf8PathBuf::from("/tmp/tree.gz"),
                temp_tree_file: Utf8PathBuf::from("/tmp/tree.gz"),
            }),
            ..ServerOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(OptionsError::AutoSavePathsEqual { .. })
        ));
    }

    #[test]
    fn validate_accepts_distinct_auto_save_paths() {
        let options = ServerOptions {
            auto_save: Some(AutoSaveOptions {
                tree_file: Utf8PathBuf::from("/tmp/tree.gz"),
                temp_tree_file: Utf8PathBuf::from("/tmp/tree.gz.tmp"),
            }),
            ..ServerOptions::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn from_file_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("options.json");
        let mut file = File::create(&path).expect("create options file");
        file.write_all(
            br#"{
                "host": "0.0.0.0",
                "port": 8080,
                "chunked_dispatch": true,
                "auto_save": {
                    "tree_file": "/var/lib/davenport/tree.gz",
                    "temp_tree_file": "/var/lib/davenport/tree.gz.tmp"
                }
            }"#,
        )
        .expect("write options file");

        let utf8 = Utf8PathBuf::from_path_buf(path).expect("utf8 path");
        let options = ServerOptions::from_file(&utf8).expect("load options");
        assert_eq!(options.host, "0.0.0.0");
        assert_eq!(options.port, 8080);
        assert!(options.chunked_dispatch);
        let auto_save = options.auto_save.expect("auto_save block");
        assert_eq!(auto_save.tree_file, "/var/lib/davenport/tree.gz");
    }

    #[test]
    fn from_file_reports_missing_file() {
        let result = ServerOptions::from_file(Utf8Path::new("/nonexistent/options.json"));
        assert!(matches!(result, Err(OptionsError::Read { .. })));
    }

    #[test]
    fn from_file_reports_malformed_document() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("options.json");
        std::fs::write(&path, b"{").expect("write options file");

        let utf8 = Utf8PathBuf::from_path_buf(path).expect("utf8 path");
        let result = ServerOptions::from_file(&utf8);
        assert!(matches!(result, Err(OptionsError::Parse { .. })));
    }
}
