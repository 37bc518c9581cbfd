//! Linux namespace selection.
//!
//! This module decides which namespaces the container is placed into:
//! - Mount, UTS and IPC namespaces, always
//! - PID namespace, unless sharing the host's
//! - Network namespace, unless sharing the host's
//! - User namespace, when an ID range is configured and nothing forces host IDs

mod userns;

pub use userns::{IdRange, split_for_gid, split_for_gids, split_for_groups};

use docket_oci::inspect::HostConfig;
use docket_oci::runtime::{Namespace, NamespaceType};

/// Namespace configuration.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamespaceConfig {
    /// User namespace.
    pub user: bool,
    /// PID namespace.
    pub pid: bool,
    /// Network namespace.
    pub net: bool,
    /// Mount namespace.
    pub mount: bool,
    /// UTS namespace.
    pub uts: bool,
    /// IPC namespace.
    pub ipc: bool,
}

impl NamespaceConfig {
    /// Namespaces for a container with the given host config.
    ///
    /// `remap` is whether an ID range is configured for user namespaces.
    #[must_use]
    pub fn for_container(host: &HostConfig, remap: bool) -> Self {
        let privileged = host.privileged;
        let net = !host.network_is_host() && !privileged;
        let pid = !host.pid_is_host() && !privileged;
        let user = remap
            && !host.network_is_host()
            && !host.pid_is_host()
            && !host.userns_is_host()
            && !privileged;

        let config = Self {
            user,
            pid,
            net,
            mount: true,
            uts: true,
            ipc: true,
        };
        tracing::debug!(?config, "Selected namespaces");
        config
    }

    /// Runtime-spec namespace list, in a fixed order.
    #[must_use]
    pub fn to_namespaces(self) -> Vec<Namespace> {
        [
            (self.mount, NamespaceType::Mount),
            (self.uts, NamespaceType::Uts),
            (self.ipc, NamespaceType::Ipc),
            (self.net, NamespaceType::Network),
            (self.pid, NamespaceType::Pid),
            (self.user, NamespaceType::User),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, ns_type)| Namespace::from(ns_type))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(config: NamespaceConfig) -> Vec<NamespaceType> {
        config.to_namespaces().into_iter().map(|ns| ns.ns_type).collect()
    }

    #[test]
    fn default_container() {
        let host = HostConfig::default();
        assert_eq!(
            types(NamespaceConfig::for_container(&host, false)),
            vec![
                NamespaceType::Mount,
                NamespaceType::Uts,
                NamespaceType::Ipc,
                NamespaceType::Network,
                NamespaceType::Pid,
            ]
        );
        assert!(NamespaceConfig::for_container(&host, true).user);
    }

    #[test]
    fn host_network_disables_net_and_user() {
        let host = HostConfig {
            network_mode: "host".to_string(),
            ..Default::default()
        };
        let config = NamespaceConfig::for_container(&host, true);
        assert!(!config.net);
        assert!(!config.user);
        assert!(config.pid);
    }

    #[test]
    fn privileged_shares_everything_but_basics() {
        let host = HostConfig {
            privileged: true,
            ..Default::default()
        };
        assert_eq!(
            types(NamespaceConfig::for_container(&host, true)),
            vec![NamespaceType::Mount, NamespaceType::Uts, NamespaceType::Ipc]
        );
    }

    #[test]
    fn userns_host_disables_user() {
        let host = HostConfig {
            userns_mode: "host".to_string(),
            ..Default::default()
        };
        let config = NamespaceConfig::for_container(&host, true);
        assert!(!config.user);
        assert!(config.net && config.pid);
    }
}
