//! Process-wide package metadata.

use once_cell::sync::OnceCell;

/// Immutable build metadata, loaded once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageInfo {
    /// Package name.
    pub name: &'static str,
    /// Package version.
    pub version: &'static str,
}

static PACKAGE_INFO: OnceCell<PackageInfo> = OnceCell::new();

/// Returns the package metadata, initialising it on first use.
pub fn package_info() -> &'static PackageInfo {
    PACKAGE_INFO.get_or_init(|| PackageInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
