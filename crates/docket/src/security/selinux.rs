//! SELinux label resolution.
//!
//! Label options arrive as `key:value` strings (`user:`, `role:`, `type:`,
//! `level:`, `filetype:`) or the bare word `disable`. A [`LabelPolicy`] turns
//! them into the process and mount labels written into the runtime spec.

use std::fmt;
use std::path::Path;

use docket_common::{DocketError, DocketResult};

/// SELinux context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SELinuxContext {
    /// User component.
    pub user: String,
    /// Role component.
    pub role: String,
    /// Type component.
    pub type_: String,
    /// Level component (optional).
    pub level: Option<String>,
}

impl SELinuxContext {
    /// Create a new SELinux context.
    pub fn new(user: &str, role: &str, type_: &str, level: Option<&str>) -> Self {
        Self {
            user: user.to_string(),
            role: role.to_string(),
            type_: type_.to_string(),
            level: level.map(String::from),
        }
    }

    /// Parse a context string.
    pub fn parse(context: &str) -> DocketResult<Self> {
        let parts: Vec<&str> = context.splitn(4, ':').collect();

        if parts.len() < 3 {
            return Err(DocketError::malformed(context, "invalid SELinux context"));
        }

        Ok(Self {
            user: parts[0].to_string(),
            role: parts[1].to_string(),
            type_: parts[2].to_string(),
            level: parts.get(3).map(|s| s.to_string()),
        })
    }

    /// Default container process context.
    pub fn container_default() -> Self {
        Self::new("system_u", "system_r", "container_t", Some("s0"))
    }

    /// Default context for container files and mounts.
    pub fn container_file_default() -> Self {
        Self::new("system_u", "object_r", "container_file_t", Some("s0"))
    }

    /// Check if SELinux is enabled on this host.
    #[cfg(target_os = "linux")]
    pub fn is_enabled() -> bool {
        Path::new("/sys/fs/selinux").exists()
    }

    #[cfg(not(target_os = "linux"))]
    pub fn is_enabled() -> bool {
        false
    }
}

impl fmt::Display for SELinuxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.level {
            Some(level) => write!(f, "{}:{}:{}:{}", self.user, self.role, self.type_, level),
            None => write!(f, "{}:{}:{}", self.user, self.role, self.type_),
        }
    }
}

/// Resolved labels for a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelinuxLabels {
    /// Label for the container process.
    pub process: Option<String>,
    /// Label for the container's mounts.
    pub mount: Option<String>,
}

/// Turns label option strings into process and mount labels.
pub trait LabelPolicy {
    /// Resolve `options` (the values of `label=` security options).
    fn init_labels(&self, options: &[String]) -> DocketResult<SelinuxLabels>;
}

/// Label policy backed by the standard container contexts.
#[derive(Debug, Clone, Copy)]
pub struct SelinuxLabelPolicy {
    enabled: bool,
}

impl SelinuxLabelPolicy {
    /// Policy for the current host.
    pub fn detect() -> Self {
        Self {
            enabled: SELinuxContext::is_enabled(),
        }
    }

    /// Policy with SELinux forced on or off.
    pub fn with_enabled(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl LabelPolicy for SelinuxLabelPolicy {
    fn init_labels(&self, options: &[String]) -> DocketResult<SelinuxLabels> {
        if !self.enabled {
            tracing::debug!("SELinux not enabled, skipping labels");
            return Ok(SelinuxLabels::default());
        }

        let mut process = SELinuxContext::container_default();
        let mut mount = SELinuxContext::container_file_default();

        for opt in options {
            if opt == "disable" {
                tracing::debug!("SELinux labeling disabled by option");
                return Ok(SelinuxLabels::default());
            }

            let Some((key, value)) = opt.split_once(':') else {
                return Err(DocketError::malformed(
                    opt,
                    "label options must be of the form key:value",
                ));
            };

            match key {
                "user" => {
                    process.user = value.to_string();
                    mount.user = value.to_string();
                }
                "role" => process.role = value.to_string(),
                "type" => process.type_ = value.to_string(),
                "filetype" => mount.type_ = value.to_string(),
                "level" => {
                    process.level = Some(value.to_string());
                    mount.level = Some(value.to_string());
                }
                _ => {
                    return Err(DocketError::malformed(
                        opt,
                        "unknown label key, expected user, role, type, level or filetype",
                    ));
                }
            }
        }

        Ok(SelinuxLabels {
            process: Some(process.to_string()),
            mount: Some(mount.to_string()),
        })
    }
}
