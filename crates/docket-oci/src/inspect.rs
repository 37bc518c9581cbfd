//! Container descriptor as returned by the engine's inspect endpoint.
//!
//! Only the fields the translation reads are modelled. The engine emits
//! `null` for many empty lists and strings, so every field tolerates both a
//! missing key and an explicit `null`.

use serde::{Deserialize, Deserializer, Serialize};

use docket_common::ContainerId;

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Container inspect response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    /// Container ID.
    #[serde(default, deserialize_with = "nullable")]
    pub id: ContainerId,
    /// Name, with the engine's leading slash.
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    /// Path to command.
    #[serde(default, deserialize_with = "nullable")]
    pub path: String,
    /// Command arguments.
    #[serde(default, deserialize_with = "nullable")]
    pub args: Vec<String>,
    /// AppArmor profile the engine applied.
    #[serde(default, deserialize_with = "nullable")]
    pub app_armor_profile: String,
    /// Host path of the generated `/etc/hosts`.
    #[serde(default, deserialize_with = "nullable")]
    pub hosts_path: String,
    /// Host path of the generated `/etc/resolv.conf`.
    #[serde(default, deserialize_with = "nullable")]
    pub resolv_conf_path: String,
    /// Container config.
    #[serde(default, deserialize_with = "nullable")]
    pub config: ContainerConfig,
    /// Host config.
    #[serde(default, deserialize_with = "nullable")]
    pub host_config: HostConfig,
    /// Mounts.
    #[serde(default, deserialize_with = "nullable")]
    pub mounts: Vec<MountPoint>,
}

impl ContainerInspect {
    /// Container name without the engine's leading slash.
    #[must_use]
    pub fn trimmed_name(&self) -> &str {
        self.name.trim_start_matches('/')
    }
}

/// Container config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    /// Hostname.
    #[serde(default, deserialize_with = "nullable")]
    pub hostname: String,
    /// User (`name`, `uid`, `name:group` or `uid:gid`).
    #[serde(default, deserialize_with = "nullable")]
    pub user: String,
    /// Environment.
    #[serde(default, deserialize_with = "nullable")]
    pub env: Vec<String>,
    /// Working directory.
    #[serde(default, deserialize_with = "nullable")]
    pub working_dir: String,
    /// TTY.
    #[serde(default, deserialize_with = "nullable")]
    pub tty: bool,
}

/// Mount point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountPoint {
    /// Mount type.
    #[serde(rename = "Type", default, deserialize_with = "nullable")]
    pub mount_type: String,
    /// Source.
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
    /// Destination.
    #[serde(default, deserialize_with = "nullable")]
    pub destination: String,
    /// Mode.
    #[serde(default, deserialize_with = "nullable")]
    pub mode: String,
    /// Read-write.
    #[serde(rename = "RW", default, deserialize_with = "nullable")]
    pub rw: bool,
    /// Propagation.
    #[serde(default, deserialize_with = "nullable")]
    pub propagation: String,
}

/// Host device mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceMapping {
    /// Device (or directory of devices) on the host.
    #[serde(default, deserialize_with = "nullable")]
    pub path_on_host: String,
    /// Path inside the container.
    #[serde(default, deserialize_with = "nullable")]
    pub path_in_container: String,
    /// Cgroup access string (`rwm`).
    #[serde(default, deserialize_with = "nullable")]
    pub cgroup_permissions: String,
}

/// Resource limit override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ulimit {
    /// Limit name (`nofile`, `nproc`, ...).
    pub name: String,
    /// Soft limit.
    pub soft: i64,
    /// Hard limit.
    pub hard: i64,
}

/// Host configuration.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    /// Privileged mode.
    #[serde(default, deserialize_with = "nullable")]
    pub privileged: bool,
    /// Read-only root filesystem.
    #[serde(default, deserialize_with = "nullable")]
    pub readonly_rootfs: bool,
    /// Network mode (`bridge`, `host`, `none`, `container:<id>`, ...).
    #[serde(default, deserialize_with = "nullable")]
    pub network_mode: String,
    /// PID mode.
    #[serde(default, deserialize_with = "nullable")]
    pub pid_mode: String,
    /// User namespace mode.
    #[serde(default, deserialize_with = "nullable")]
    pub userns_mode: String,
    /// Capabilities to add.
    #[serde(default, deserialize_with = "nullable")]
    pub cap_add: Vec<String>,
    /// Capabilities to drop.
    #[serde(default, deserialize_with = "nullable")]
    pub cap_drop: Vec<String>,
    /// Device mappings.
    #[serde(default, deserialize_with = "nullable")]
    pub devices: Vec<DeviceMapping>,
    /// Security options (`label=...`, `apparmor=...`, `seccomp=...`).
    #[serde(default, deserialize_with = "nullable")]
    pub security_opt: Vec<String>,
    /// Supplementary groups.
    #[serde(default, deserialize_with = "nullable")]
    pub group_add: Vec<String>,
    /// Resource limit overrides.
    #[serde(default, deserialize_with = "nullable")]
    pub ulimits: Vec<Ulimit>,
    /// OOM score adjustment.
    #[serde(default, deserialize_with = "nullable")]
    pub oom_score_adj: i32,
    /// Memory limit.
    #[serde(default, deserialize_with = "nullable")]
    pub memory: i64,
    /// Memory soft limit.
    #[serde(default, deserialize_with = "nullable")]
    pub memory_reservation: i64,
    /// Memory + swap limit.
    #[serde(default, deserialize_with = "nullable")]
    pub memory_swap: i64,
    /// Swappiness; unset when `null`.
    #[serde(default)]
    pub memory_swappiness: Option<i64>,
    /// Kernel memory limit.
    #[serde(default, deserialize_with = "nullable")]
    pub kernel_memory: i64,
    /// Disable the OOM killer; unset when `null`.
    #[serde(default)]
    pub oom_kill_disable: Option<bool>,
    /// CPU shares.
    #[serde(default, deserialize_with = "nullable")]
    pub cpu_shares: i64,
    /// CPU quota.
    #[serde(default, deserialize_with = "nullable")]
    pub cpu_quota: i64,
    /// CPU period.
    #[serde(default, deserialize_with = "nullable")]
    pub cpu_period: i64,
    /// Allowed CPUs.
    #[serde(default, deserialize_with = "nullable")]
    pub cpuset_cpus: String,
    /// Allowed memory nodes.
    #[serde(default, deserialize_with = "nullable")]
    pub cpuset_mems: String,
    /// PIDs limit; unset when `null`.
    #[serde(default)]
    pub pids_limit: Option<i64>,
    /// Block I/O weight.
    #[serde(default, deserialize_with = "nullable")]
    pub blkio_weight: u16,
}

impl HostConfig {
    /// Container shares the host network stack.
    #[must_use]
    pub fn network_is_host(&self) -> bool {
        self.network_mode == "host"
    }

    /// Container has no networking at all.
    #[must_use]
    pub fn network_is_none(&self) -> bool {
        self.network_mode == "none"
    }

    /// Container joins another container's network stack.
    #[must_use]
    pub fn network_is_container(&self) -> bool {
        self.network_mode.starts_with("container:")
    }

    /// Container shares the host PID namespace.
    #[must_use]
    pub fn pid_is_host(&self) -> bool {
        self.pid_mode == "host"
    }

    /// Container explicitly opted out of user namespace remapping.
    #[must_use]
    pub fn userns_is_host(&self) -> bool {
        self.userns_mode == "host"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nulls_and_missing_fields() {
        let json = r#"{
            "Id": "13b2fcc2316e4f5d",
            "Name": "/tor",
            "Path": "tor",
            "Args": null,
            "Config": {"Hostname": "13b2fcc2316e", "Env": null, "Tty": false},
            "HostConfig": {
                "CapAdd": null,
                "Devices": null,
                "MemorySwappiness": null,
                "PidsLimit": null,
                "NetworkMode": "default"
            },
            "Mounts": null
        }"#;

        let inspect: ContainerInspect = serde_json::from_str(json).unwrap();
        assert_eq!(inspect.trimmed_name(), "tor");
        assert!(inspect.args.is_empty());
        assert!(inspect.config.env.is_empty());
        assert!(inspect.host_config.cap_add.is_empty());
        assert!(inspect.host_config.memory_swappiness.is_none());
        assert!(inspect.mounts.is_empty());
        assert!(!inspect.host_config.network_is_host());
    }

    #[test]
    fn parses_devices_and_mounts() {
        let json = r#"{
            "HostConfig": {
                "Devices": [
                    {"PathOnHost": "/dev/snd", "PathInContainer": "/dev/snd", "CgroupPermissions": "rwm"}
                ],
                "Ulimits": [{"Name": "nofile", "Soft": 1024, "Hard": 2048}]
            },
            "Mounts": [
                {"Type": "bind", "Source": "/etc/localtime", "Destination": "/etc/localtime", "Mode": "ro", "RW": false}
            ]
        }"#;

        let inspect: ContainerInspect = serde_json::from_str(json).unwrap();
        assert_eq!(inspect.host_config.devices[0].path_on_host, "/dev/snd");
        assert_eq!(inspect.host_config.ulimits[0].hard, 2048);
        assert_eq!(inspect.mounts[0].destination, "/etc/localtime");
        assert!(!inspect.mounts[0].rw);
    }

    #[test]
    fn network_modes() {
        let mut hc = HostConfig {
            network_mode: "container:abc".to_string(),
            ..Default::default()
        };
        assert!(hc.network_is_container());
        hc.network_mode = "none".to_string();
        assert!(hc.network_is_none());
    }
}
