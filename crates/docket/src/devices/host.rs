//! Host device inspection.

use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use docket_oci::runtime::{Device, DeviceCgroup};

use super::{MergedDevices, SkippedEntry};

/// Host `/dev` entries never passed to privileged containers.
const SKIPPED_DEV_DIRS: &[&str] = &["pts", "shm", "fd", "mqueue", ".lxc", ".lxd-mounts", ".udev"];

/// Device node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Character device.
    Char,
    /// Block device.
    Block,
}

impl DeviceKind {
    /// Type letter used in the runtime spec.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Char => "c",
            Self::Block => "b",
        }
    }
}

/// A device node found on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNode {
    /// Node kind.
    pub kind: DeviceKind,
    /// Major number.
    pub major: u32,
    /// Minor number.
    pub minor: u32,
    /// Permission bits.
    pub file_mode: u32,
    /// Owner.
    pub uid: u32,
    /// Group.
    pub gid: u32,
}

impl DeviceNode {
    /// Runtime-spec device entry placed at `path`.
    #[must_use]
    pub fn to_device(&self, path: PathBuf) -> Device {
        Device {
            path,
            device_type: self.kind.as_str().to_string(),
            major: i64::from(self.major),
            minor: i64::from(self.minor),
            file_mode: Some(self.file_mode),
            uid: Some(self.uid),
            gid: Some(self.gid),
        }
    }
}

/// What a host path turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbedPath {
    /// A character or block device node.
    Device(DeviceNode),
    /// A directory that may hold device nodes.
    Directory,
    /// Anything else.
    Other,
}

/// Read-only view of the host filesystem used to resolve devices.
pub trait DeviceProbe {
    /// Inspect `path` without following a final symlink.
    fn probe(&self, path: &Path) -> io::Result<ProbedPath>;

    /// Every path below `dir`, recursively, excluding `dir` itself.
    ///
    /// Entries that cannot be read are reported at their own path.
    fn walk(&self, dir: &Path) -> Vec<Result<PathBuf, SkippedEntry>>;
}

/// [`DeviceProbe`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl DeviceProbe for HostFs {
    fn probe(&self, path: &Path) -> io::Result<ProbedPath> {
        let meta = std::fs::symlink_metadata(path)?;
        let file_type = meta.file_type();

        let kind = if file_type.is_char_device() {
            DeviceKind::Char
        } else if file_type.is_block_device() {
            DeviceKind::Block
        } else if file_type.is_dir() {
            return Ok(ProbedPath::Directory);
        } else {
            return Ok(ProbedPath::Other);
        };

        let rdev = meta.rdev();
        Ok(ProbedPath::Device(DeviceNode {
            kind,
            major: rustix::fs::major(rdev),
            minor: rustix::fs::minor(rdev),
            file_mode: meta.mode() & 0o777,
            uid: meta.uid(),
            gid: meta.gid(),
        }))
    }

    fn walk(&self, dir: &Path) -> Vec<Result<PathBuf, SkippedEntry>> {
        walkdir::WalkDir::new(dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| {
                entry.map(walkdir::DirEntry::into_path).map_err(|e| {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    let reason = e
                        .into_io_error()
                        .map_or_else(|| "filesystem loop".to_string(), |io| io.to_string());
                    SkippedEntry { path, reason }
                })
            })
            .collect()
    }
}

/// Inventory of every device node under the host `/dev`.
///
/// Privileged containers receive this list verbatim together with a single
/// rule allowing access to every device.
pub struct HostDevices<'a> {
    probe: &'a dyn DeviceProbe,
    root: PathBuf,
}

impl<'a> HostDevices<'a> {
    /// Inventory rooted at `/dev`.
    pub fn new(probe: &'a dyn DeviceProbe) -> Self {
        Self::with_root(probe, "/dev")
    }

    /// Inventory rooted at `root`.
    pub fn with_root(probe: &'a dyn DeviceProbe, root: impl Into<PathBuf>) -> Self {
        Self {
            probe,
            root: root.into(),
        }
    }

    /// Collect the host devices.
    #[must_use]
    pub fn collect(&self) -> MergedDevices {
        let mut devices = Vec::new();
        let mut skipped = Vec::new();

        for entry in self.probe.walk(&self.root) {
            let path = match entry {
                Ok(path) => path,
                Err(entry) => {
                    skipped.push(entry);
                    continue;
                }
            };
            if self.is_excluded(&path) {
                continue;
            }
            match self.probe.probe(&path) {
                Ok(ProbedPath::Device(node)) => devices.push(node.to_device(path)),
                Ok(_) => {}
                Err(e) => skipped.push(SkippedEntry::from_io(&path, &e)),
            }
        }

        tracing::debug!(
            count = devices.len(),
            skipped = skipped.len(),
            "Collected host devices"
        );

        MergedDevices {
            devices,
            rules: vec![DeviceCgroup::allow_all()],
            skipped,
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return true;
        };
        if relative == Path::new("console") {
            return true;
        }
        relative
            .components()
            .next()
            .and_then(|c| c.as_os_str().to_str())
            .is_some_and(|first| SKIPPED_DEV_DIRS.contains(&first))
    }
}
