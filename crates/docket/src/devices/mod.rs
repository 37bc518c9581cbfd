//! Device list and device cgroup rules.
//!
//! Unprivileged containers get the default device allow-list merged with
//! the user's device mappings. A mapping may point at a single device node
//! or at a directory, in which case every device node below it is added with
//! the host prefix swapped for the container prefix. Directory walks are
//! best-effort: entries that cannot be read are recorded in
//! [`MergedDevices::skipped`] rather than failing the translation.

mod host;

use std::io;
use std::path::{Path, PathBuf};

use docket_common::{DocketError, DocketResult};
use docket_oci::inspect::DeviceMapping;
use docket_oci::runtime::{Device, DeviceCgroup};

pub use host::{DeviceKind, DeviceNode, DeviceProbe, HostDevices, HostFs, ProbedPath};

/// Access granted when a mapping leaves its cgroup permissions blank.
const DEFAULT_ACCESS: &str = "rwm";

const TTY_PATH: &str = "/dev/tty";

/// Devices available to every unprivileged container.
///
/// Format: (path, major, minor)
const DEFAULT_DEVICES: &[(&str, u32, u32)] = &[
    ("/dev/null", 1, 3),
    ("/dev/zero", 1, 5),
    ("/dev/full", 1, 7),
    (TTY_PATH, 5, 0),
    ("/dev/urandom", 1, 9),
    ("/dev/random", 1, 8),
];

/// A device together with the access its cgroup rule grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    /// Device node description.
    pub device: Device,
    /// Cgroup access string.
    pub access: String,
}

impl DeviceEntry {
    fn from_node(node: &DeviceNode, path: PathBuf, access: &str) -> Self {
        Self {
            device: node.to_device(path),
            access: access.to_string(),
        }
    }

    /// Allow rule for exactly this device.
    #[must_use]
    pub fn cgroup_rule(&self) -> DeviceCgroup {
        DeviceCgroup {
            allow: true,
            device_type: Some(self.device.device_type.clone()),
            major: Some(self.device.major),
            minor: Some(self.device.minor),
            access: Some(self.access.clone()),
        }
    }
}

/// A path skipped while walking a device directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Path that could not be inspected.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

impl SkippedEntry {
    fn from_io(path: &Path, err: &io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}

/// Devices resolved from one mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceResolution {
    /// Resolved devices, at their container paths.
    pub devices: Vec<DeviceEntry>,
    /// Entries skipped during a directory walk.
    pub skipped: Vec<SkippedEntry>,
}

/// Final device list and matching cgroup rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedDevices {
    /// Device nodes to create in the container.
    pub devices: Vec<Device>,
    /// Device cgroup rules.
    pub rules: Vec<DeviceCgroup>,
    /// Entries skipped while walking device directories.
    pub skipped: Vec<SkippedEntry>,
}

/// Fresh copy of the default device allow-list.
#[must_use]
pub fn default_devices() -> Vec<DeviceEntry> {
    DEFAULT_DEVICES
        .iter()
        .map(|&(path, major, minor)| {
            let node = DeviceNode {
                kind: DeviceKind::Char,
                major,
                minor,
                file_mode: 0o666,
                uid: 0,
                gid: 0,
            };
            DeviceEntry::from_node(&node, PathBuf::from(path), DEFAULT_ACCESS)
        })
        .collect()
}

/// Resolves device mappings against the host.
pub struct DeviceMerger<'a> {
    probe: &'a dyn DeviceProbe,
}

impl<'a> DeviceMerger<'a> {
    /// Create a merger inspecting the host through `probe`.
    pub fn new(probe: &'a dyn DeviceProbe) -> Self {
        Self { probe }
    }

    /// Resolve a single mapping.
    ///
    /// # Errors
    ///
    /// Fails when the host path cannot be inspected, is neither a device
    /// node nor a directory, or is a directory without any device node.
    pub fn resolve(&self, mapping: &DeviceMapping) -> DocketResult<DeviceResolution> {
        let host = Path::new(&mapping.path_on_host);
        let container = if mapping.path_in_container.is_empty() {
            host
        } else {
            Path::new(&mapping.path_in_container)
        };
        let access = if mapping.cgroup_permissions.is_empty() {
            DEFAULT_ACCESS
        } else {
            mapping.cgroup_permissions.as_str()
        };

        let failure = |reason: String| DocketError::DeviceResolution {
            path: host.to_path_buf(),
            reason,
        };

        match self.probe.probe(host).map_err(|e| failure(e.to_string()))? {
            ProbedPath::Device(node) => Ok(DeviceResolution {
                devices: vec![DeviceEntry::from_node(&node, container.to_path_buf(), access)],
                skipped: Vec::new(),
            }),
            ProbedPath::Directory => {
                let resolution = self.expand_directory(host, container, access);
                if resolution.devices.is_empty() {
                    let reason = resolution.skipped.first().map_or_else(
                        || "directory contains no device nodes".to_string(),
                        |s| format!("{}: {}", s.path.display(), s.reason),
                    );
                    return Err(failure(reason));
                }
                Ok(resolution)
            }
            ProbedPath::Other => Err(failure("not a device node".to_string())),
        }
    }

    fn expand_directory(&self, host: &Path, container: &Path, access: &str) -> DeviceResolution {
        let mut resolution = DeviceResolution::default();

        for entry in self.probe.walk(host) {
            let path = match entry {
                Ok(path) => path,
                Err(entry) => {
                    tracing::warn!(path = %entry.path.display(), reason = %entry.reason, "Skipping unreadable device entry");
                    resolution.skipped.push(entry);
                    continue;
                }
            };

            match self.probe.probe(&path) {
                Ok(ProbedPath::Device(node)) => {
                    let Ok(relative) = path.strip_prefix(host) else {
                        continue;
                    };
                    let target = container.join(relative);
                    tracing::debug!(host = %path.display(), container = %target.display(), "Adding device from directory");
                    resolution
                        .devices
                        .push(DeviceEntry::from_node(&node, target, access));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable device entry");
                    resolution.skipped.push(SkippedEntry::from_io(&path, &e));
                }
            }
        }

        resolution
    }

    /// Merge the default devices with the user's mappings.
    ///
    /// Defaults come first, minus `/dev/tty` without a terminal and minus any
    /// path a user device claims. Rules mirror the device list index for index.
    ///
    /// # Errors
    ///
    /// Propagates the first mapping that fails to resolve.
    pub fn merge(&self, mappings: &[DeviceMapping], terminal: bool) -> DocketResult<MergedDevices> {
        let mut user = Vec::new();
        let mut skipped = Vec::new();
        for mapping in mappings {
            let resolution = self.resolve(mapping)?;
            user.extend(resolution.devices);
            skipped.extend(resolution.skipped);
        }

        let mut entries: Vec<DeviceEntry> = default_devices()
            .into_iter()
            .filter(|d| terminal || d.device.path != Path::new(TTY_PATH))
            .filter(|d| !user.iter().any(|u| u.device.path == d.device.path))
            .collect();
        entries.extend(user);

        tracing::debug!(count = entries.len(), skipped = skipped.len(), "Merged devices");

        Ok(MergedDevices {
            rules: entries.iter().map(DeviceEntry::cgroup_rule).collect(),
            devices: entries.into_iter().map(|e| e.device).collect(),
            skipped,
        })
    }
}
