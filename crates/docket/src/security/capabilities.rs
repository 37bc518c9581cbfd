//! Linux capability resolution.

use std::collections::HashSet;

/// Capabilities granted to an unprivileged container by default.
pub const DEFAULT_CAPABILITIES: &[&str] = &[
    "CAP_CHOWN",
    "CAP_DAC_OVERRIDE",
    "CAP_FSETID",
    "CAP_FOWNER",
    "CAP_MKNOD",
    "CAP_NET_RAW",
    "CAP_SETGID",
    "CAP_SETUID",
    "CAP_SETFCAP",
    "CAP_SETPCAP",
    "CAP_NET_BIND_SERVICE",
    "CAP_SYS_CHROOT",
    "CAP_KILL",
    "CAP_AUDIT_WRITE",
];

/// Keyword that stands for every capability in add/drop lists.
const ALL: &str = "ALL";

/// Normalize a capability name to the `CAP_<NAME>` form.
///
/// Names are upper-cased; unknown names are passed through otherwise untouched.
#[must_use]
pub fn normalize(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase();
    if upper.starts_with("CAP_") {
        upper
    } else {
        format!("CAP_{upper}")
    }
}

/// Every capability known to the platform, sorted by name.
#[must_use]
pub fn all_capabilities() -> Vec<String> {
    let mut all: Vec<String> = caps::all().into_iter().map(|c| c.to_string()).collect();
    all.sort();
    all
}

/// Capability overrides requested for a container.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    /// Capabilities to add.
    pub add: Vec<String>,
    /// Capabilities to drop.
    pub drop: Vec<String>,
}

impl CapabilitySet {
    /// Create a set of overrides.
    #[must_use]
    pub fn new(add: Vec<String>, drop: Vec<String>) -> Self {
        Self { add, drop }
    }

    /// Compute the final capability list from `base`.
    ///
    /// Privileged containers get every capability regardless of overrides.
    /// Otherwise drops win over adds; `ALL` in the drop list discards the
    /// base set and `ALL` in the add list grants every capability not dropped.
    #[must_use]
    pub fn resolve(&self, base: &[String], privileged: bool) -> Vec<String> {
        if privileged {
            tracing::debug!("Privileged container, granting all capabilities");
            return all_capabilities();
        }

        let drop_all = self.drop.iter().any(|c| c.eq_ignore_ascii_case(ALL));
        let add_all = self.add.iter().any(|c| c.eq_ignore_ascii_case(ALL));
        let dropped: HashSet<String> = self
            .drop
            .iter()
            .filter(|c| !c.eq_ignore_ascii_case(ALL))
            .map(|c| normalize(c))
            .collect();

        let mut seen = HashSet::new();
        let mut caps = Vec::new();
        let mut push = |cap: String| {
            if !dropped.contains(&cap) && seen.insert(cap.clone()) {
                caps.push(cap);
            }
        };

        if !drop_all {
            base.iter().map(|c| normalize(c)).for_each(&mut push);
        }
        if add_all {
            all_capabilities().into_iter().for_each(&mut push);
        }
        self.add
            .iter()
            .filter(|c| !c.eq_ignore_ascii_case(ALL))
            .map(|c| normalize(c))
            .for_each(&mut push);

        tracing::debug!(count = caps.len(), "Resolved capability set");
        caps
    }
}

/// Default capabilities as owned strings.
#[must_use]
pub fn default_capabilities() -> Vec<String> {
    DEFAULT_CAPABILITIES.iter().map(|c| (*c).to_string()).collect()
}
