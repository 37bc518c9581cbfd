//! Translation configuration.

use std::path::PathBuf;

use docket_common::paths::DEFAULT_ROOTFS;
use docket_oci::runtime::Hooks;

use crate::namespace::IdRange;
use crate::security::{DEFAULT_APPARMOR_PROFILE, default_capabilities};

/// Translation configuration options.
#[derive(Debug, Clone)]
pub struct TranslateConfig {
    /// Root filesystem path written into the runtime spec, relative to the bundle.
    pub rootfs: PathBuf,
    /// Capabilities granted to unprivileged containers before overrides.
    pub capabilities: Vec<String>,
    /// AppArmor profile for unprivileged containers without one.
    pub apparmor_profile: String,
    /// Host ID range for user namespace remapping.
    pub id_range: IdRange,
    /// Lifecycle hooks copied into the runtime spec.
    pub hooks: Hooks,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            rootfs: PathBuf::from(DEFAULT_ROOTFS),
            capabilities: default_capabilities(),
            apparmor_profile: DEFAULT_APPARMOR_PROFILE.to_string(),
            id_range: IdRange::default(),
            hooks: Hooks::default(),
        }
    }
}

impl TranslateConfig {
    /// Set the root filesystem path.
    #[must_use]
    pub fn with_rootfs(mut self, rootfs: impl Into<PathBuf>) -> Self {
        self.rootfs = rootfs.into();
        self
    }

    /// Set the base capability set.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the default AppArmor profile.
    #[must_use]
    pub fn with_apparmor_profile(mut self, profile: impl Into<String>) -> Self {
        self.apparmor_profile = profile.into();
        self
    }

    /// Remap container IDs starting at host ID `root` for `len` IDs.
    #[must_use]
    pub fn with_id_range(mut self, root: u32, len: u32) -> Self {
        self.id_range = IdRange::new(root, len);
        self
    }

    /// Set the lifecycle hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }
}
