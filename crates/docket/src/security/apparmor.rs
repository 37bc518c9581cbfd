//! AppArmor profile selection.

use std::path::Path;

/// Engine's default AppArmor profile for containers.
pub const DEFAULT_APPARMOR_PROFILE: &str = "docker-default";

/// Marker for running without AppArmor confinement.
pub const UNCONFINED: &str = "unconfined";

/// AppArmor profile reference for a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppArmorProfile {
    /// Profile name.
    pub name: String,
}

impl AppArmorProfile {
    /// Create a new AppArmor profile reference.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Default container profile.
    pub fn container_default() -> Self {
        Self::new(DEFAULT_APPARMOR_PROFILE)
    }

    /// Unconfined profile (no restrictions).
    pub fn unconfined() -> Self {
        Self::new(UNCONFINED)
    }

    /// Whether this is the unconfined marker.
    pub fn is_unconfined(&self) -> bool {
        self.name == UNCONFINED
    }

    /// Profile name as written into the runtime spec.
    ///
    /// Runtimes reject the literal `unconfined`, so it becomes "no profile".
    pub fn into_runtime_profile(self) -> Option<String> {
        if self.is_unconfined() || self.name.is_empty() {
            None
        } else {
            Some(self.name)
        }
    }

    /// Check if AppArmor is enabled on this host.
    #[cfg(target_os = "linux")]
    pub fn is_enabled() -> bool {
        Path::new("/sys/module/apparmor").exists()
            && Path::new("/sys/kernel/security/apparmor").exists()
    }

    #[cfg(not(target_os = "linux"))]
    pub fn is_enabled() -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_creation() {
        let profile = AppArmorProfile::new("test-profile");
        assert_eq!(profile.name, "test-profile");
        assert_eq!(profile.into_runtime_profile(), Some("test-profile".to_string()));
    }

    #[test]
    fn test_unconfined_profile_has_no_runtime_name() {
        let profile = AppArmorProfile::unconfined();
        assert!(profile.is_unconfined());
        assert_eq!(profile.into_runtime_profile(), None);
    }

    #[test]
    fn test_container_default_profile() {
        let profile = AppArmorProfile::container_default();
        assert_eq!(profile.name, "docker-default");
    }
}
