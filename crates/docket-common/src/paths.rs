//! Standard filesystem paths for docket.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

/// Name of the runtime configuration file inside a bundle.
pub const SPEC_CONFIG: &str = "config.json";

/// Root filesystem directory, relative to the bundle.
pub const DEFAULT_ROOTFS: &str = "rootfs";

/// Default engine socket (`unix:///var/run/docker.sock`).
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Engine socket resolved from `DOCKER_HOST`, falling back to [`DEFAULT_DOCKER_HOST`].
pub static DOCKER_HOST: Lazy<String> = Lazy::new(|| {
    std::env::var("DOCKER_HOST")
        .ok()
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string())
});

/// Turn a `unix://` engine address into a socket path.
///
/// Bare paths are accepted as-is. Returns `None` for non-unix schemes.
#[must_use]
pub fn socket_path(host: &str) -> Option<PathBuf> {
    match host.split_once("://") {
        Some(("unix", path)) => Some(PathBuf::from(path)),
        Some(_) => None,
        None => Some(PathBuf::from(host)),
    }
}

/// Paths inside an OCI bundle directory.
#[derive(Debug, Clone)]
pub struct BundlePaths {
    /// Bundle root directory.
    pub root: PathBuf,
}

impl BundlePaths {
    /// Create paths for a bundle rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The bundle's `config.json`.
    #[must_use]
    pub fn config(&self) -> PathBuf {
        self.root.join(SPEC_CONFIG)
    }

    /// The bundle's root filesystem directory.
    #[must_use]
    pub fn rootfs(&self) -> PathBuf {
        self.root.join(DEFAULT_ROOTFS)
    }

    /// The bundle root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for BundlePaths {
    fn default() -> Self {
        Self::new(".")
    }
}
