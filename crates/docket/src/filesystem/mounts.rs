//! Mount table assembly.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use docket_oci::inspect::MountPoint;
use docket_oci::runtime::Mount;

/// Host file bind-mounted over `/etc/hosts` when none is recorded.
pub const HOST_HOSTS: &str = "/etc/hosts";
/// Host file bind-mounted over `/etc/resolv.conf` when none is recorded.
pub const HOST_RESOLV_CONF: &str = "/etc/resolv.conf";

const CGROUP: &str = "/sys/fs/cgroup";
const DEVPTS: &str = "/dev/pts";

/// Default mount table.
///
/// Format: (destination, type, source, options)
const DEFAULT_MOUNTS: &[(&str, &str, &str, &[&str])] = &[
    ("/proc", "proc", "proc", &[]),
    (
        "/dev",
        "tmpfs",
        "tmpfs",
        &["nosuid", "strictatime", "mode=755", "size=65536k"],
    ),
    (
        DEVPTS,
        "devpts",
        "devpts",
        &["nosuid", "noexec", "newinstance", "ptmxmode=0666", "mode=0620"],
    ),
    (
        "/dev/shm",
        "tmpfs",
        "shm",
        &["nosuid", "noexec", "nodev", "mode=1777", "size=65536k"],
    ),
    ("/dev/mqueue", "mqueue", "mqueue", &["nosuid", "noexec", "nodev"]),
    ("/sys", "sysfs", "sysfs", &["nosuid", "noexec", "nodev"]),
    (CGROUP, "cgroup", "cgroup", &["nosuid", "noexec", "nodev", "relatime"]),
];

fn strings(options: &[&str]) -> Vec<String> {
    options.iter().map(|o| (*o).to_string()).collect()
}

/// Fresh copy of the default mount table.
#[must_use]
pub fn default_mounts() -> Vec<Mount> {
    DEFAULT_MOUNTS
        .iter()
        .map(|&(destination, fstype, source, options)| Mount {
            destination: PathBuf::from(destination),
            mount_type: Some(fstype.to_string()),
            source: Some(PathBuf::from(source)),
            options: strings(options),
        })
        .collect()
}

/// Host files providing the container's name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkFiles {
    /// Source for `/etc/hosts`.
    pub hosts: PathBuf,
    /// Source for `/etc/resolv.conf`.
    pub resolv_conf: PathBuf,
}

impl NetworkFiles {
    /// Use the engine-generated files, falling back to the host's own.
    #[must_use]
    pub fn new(hosts: &str, resolv_conf: &str) -> Self {
        let or_host = |path: &str, fallback: &str| {
            PathBuf::from(if path.is_empty() { fallback } else { path })
        };
        Self {
            hosts: or_host(hosts, HOST_HOSTS),
            resolv_conf: or_host(resolv_conf, HOST_RESOLV_CONF),
        }
    }

    fn mounts(&self) -> Vec<Mount> {
        [(HOST_HOSTS, &self.hosts), (HOST_RESOLV_CONF, &self.resolv_conf)]
            .into_iter()
            .map(|(destination, source)| Mount {
                destination: PathBuf::from(destination),
                mount_type: Some("bind".to_string()),
                source: Some(source.clone()),
                options: strings(&["rbind", "rprivate", "ro"]),
            })
            .collect()
    }
}

/// Bind entry for a user mount.
#[must_use]
pub fn bind_mount(mount: &MountPoint) -> Mount {
    let mut options = strings(&["rbind", "rprivate", if mount.rw { "rw" } else { "ro" }]);
    for part in mount.mode.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !options.iter().any(|o| o == part) {
            options.push(part.to_string());
        }
    }

    Mount {
        destination: PathBuf::from(&mount.destination),
        mount_type: Some("bind".to_string()),
        source: Some(PathBuf::from(&mount.source)),
        options,
    }
}

/// Build the container's mount list.
///
/// User mounts come first and always win; default and network mounts are
/// appended only for destinations nobody claimed. Without ID remapping the
/// cgroup mount is made read-only and devpts is owned by the `tty` group.
#[must_use]
pub fn assemble_mounts(
    user: &[MountPoint],
    network: Option<&NetworkFiles>,
    remapped: bool,
) -> Vec<Mount> {
    let mut mounts: Vec<Mount> = Vec::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();

    for mount in user {
        let bind = bind_mount(mount);
        if claimed.insert(bind.destination.clone()) {
            mounts.push(bind);
        } else {
            tracing::warn!(destination = %mount.destination, "Duplicate mount destination, keeping the first");
        }
    }

    let defaults = default_mounts()
        .into_iter()
        .chain(network.map(NetworkFiles::mounts).unwrap_or_default());
    for mount in defaults {
        if claimed.insert(mount.destination.clone()) {
            mounts.push(mount);
        } else {
            tracing::debug!(destination = %mount.destination.display(), "Default mount overridden by user mount");
        }
    }

    if !remapped {
        add_option(&mut mounts, Path::new(CGROUP), "ro");
        add_option(&mut mounts, Path::new(DEVPTS), "gid=5");
    }

    mounts
}

fn add_option(mounts: &mut [Mount], destination: &Path, option: &str) {
    if let Some(mount) = mounts
        .iter_mut()
        .find(|m| m.destination == destination && m.mount_type.as_deref() != Some("bind"))
    {
        if !mount.has_option(option) {
            mount.options.push(option.to_string());
        }
    }
}
