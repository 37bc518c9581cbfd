//! Container security translation.
//!
//! This module resolves the security-related parts of the runtime spec:
//! - Linux capabilities
//! - AppArmor profiles
//! - SELinux labels
//! - Seccomp profiles

mod apparmor;
mod capabilities;
mod seccomp;
mod selinux;

use std::str::FromStr;

use docket_common::{DocketError, DocketResult};
use docket_oci::runtime::Seccomp;

pub use apparmor::{AppArmorProfile, DEFAULT_APPARMOR_PROFILE};
pub use capabilities::{
    CapabilitySet, DEFAULT_CAPABILITIES, all_capabilities, default_capabilities, normalize,
};
pub use seccomp::{default_profile as default_seccomp_profile, parse_profile as parse_seccomp};
pub use selinux::{LabelPolicy, SELinuxContext, SelinuxLabelPolicy, SelinuxLabels};

/// A single `--security-opt` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityOpt {
    /// `label=<option>`: one SELinux label option.
    Label(String),
    /// `apparmor=<profile>`: AppArmor profile name.
    Apparmor(String),
    /// `seccomp=<json|unconfined>`: inline seccomp profile.
    Seccomp(String),
}

impl FromStr for SecurityOpt {
    type Err = DocketError;

    fn from_str(opt: &str) -> Result<Self, Self::Err> {
        let Some(idx) = opt.find(|c| c == ':' || c == '=') else {
            return Err(DocketError::malformed(
                opt,
                "security options must be of the form key:value or key=value",
            ));
        };
        let (key, value) = (&opt[..idx], &opt[idx + 1..]);

        match key {
            "label" => Ok(Self::Label(value.to_string())),
            "apparmor" => Ok(Self::Apparmor(value.to_string())),
            "seccomp" => Ok(Self::Seccomp(value.to_string())),
            _ => Err(DocketError::malformed(
                opt,
                "unknown security option, expected label, apparmor or seccomp",
            )),
        }
    }
}

/// Resolved security settings for a container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityProfile {
    /// AppArmor profile; `None` runs unconfined.
    pub apparmor_profile: Option<String>,
    /// SELinux process and mount labels.
    pub selinux: SelinuxLabels,
    /// Seccomp profile; `None` disables filtering.
    pub seccomp: Option<Seccomp>,
}

/// Resolves security options into a [`SecurityProfile`].
pub struct SecurityResolver<'a> {
    default_apparmor: &'a str,
    label_policy: &'a dyn LabelPolicy,
}

impl<'a> SecurityResolver<'a> {
    /// Create a resolver applying `default_apparmor` to unprivileged containers.
    pub fn new(default_apparmor: &'a str, label_policy: &'a dyn LabelPolicy) -> Self {
        Self {
            default_apparmor,
            label_policy,
        }
    }

    /// Resolve `options` for a container.
    ///
    /// `applied_apparmor` is the profile the engine reports as already
    /// applied; an explicit `apparmor=` option overrides it.
    ///
    /// # Errors
    ///
    /// Fails on a malformed option, an unparseable seccomp profile, or a
    /// label option the policy rejects.
    pub fn resolve(
        &self,
        options: &[String],
        applied_apparmor: &str,
        privileged: bool,
    ) -> DocketResult<SecurityProfile> {
        let mut label_opts = Vec::new();
        let mut apparmor = (!applied_apparmor.is_empty()).then(|| AppArmorProfile::new(applied_apparmor));
        let mut custom_seccomp = false;
        let mut seccomp = None;

        for opt in options {
            match opt.parse::<SecurityOpt>()? {
                SecurityOpt::Label(value) => label_opts.push(value),
                SecurityOpt::Apparmor(name) => apparmor = Some(AppArmorProfile::new(&name)),
                SecurityOpt::Seccomp(value) => {
                    custom_seccomp = true;
                    if value == seccomp::UNCONFINED {
                        tracing::debug!("Seccomp filtering disabled by option");
                        seccomp = None;
                    } else {
                        seccomp = Some(parse_seccomp(&value)?);
                    }
                }
            }
        }

        let apparmor = match apparmor {
            Some(profile) => profile,
            None if privileged => AppArmorProfile::unconfined(),
            None => AppArmorProfile::new(self.default_apparmor),
        };
        if !apparmor.is_unconfined() && !AppArmorProfile::is_enabled() {
            tracing::debug!(profile = %apparmor.name, "AppArmor not enabled on this host, recording profile anyway");
        }

        if !custom_seccomp && !privileged {
            seccomp = Some(default_seccomp_profile());
        }

        let selinux = self.label_policy.init_labels(&label_opts)?;

        Ok(SecurityProfile {
            apparmor_profile: apparmor.into_runtime_profile(),
            selinux,
            seccomp,
        })
    }
}
