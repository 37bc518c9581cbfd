//! Integration tests for descriptor translation against a fake host.
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

use docket::devices::{DeviceKind, DeviceNode, DeviceProbe, ProbedPath, SkippedEntry};
use docket::identity::IdentityResolver;
use docket::runtime::{TranslateConfig, Translator};
use docket::security::SelinuxLabelPolicy;
use docket_common::{DocketError, DocketResult};
use docket_oci::ContainerInspect;
use docket_oci::runtime::{IdMapping, NamespaceType, Spec};

/// Identity table standing in for `/etc/passwd` and `/etc/group`.
#[derive(Default)]
struct Passwd {
    users: HashMap<&'static str, (u32, u32)>,
    groups: HashMap<&'static str, u32>,
}

impl IdentityResolver for Passwd {
    fn lookup_user(&self, name: &str) -> DocketResult<(u32, u32)> {
        self.users
            .get(name)
            .copied()
            .ok_or_else(|| DocketError::lookup("user", name, "unknown user"))
    }

    fn lookup_group(&self, name: &str) -> DocketResult<u32> {
        self.groups
            .get(name)
            .copied()
            .ok_or_else(|| DocketError::lookup("group", name, "unknown group"))
    }
}

/// Host `/dev` with a sound card directory.
struct FakeDev(BTreeMap<PathBuf, ProbedPath>);

impl FakeDev {
    fn new() -> Self {
        let node = |minor| {
            ProbedPath::Device(DeviceNode {
                kind: DeviceKind::Char,
                major: 116,
                minor,
                file_mode: 0o660,
                uid: 0,
                gid: 29,
            })
        };
        Self(BTreeMap::from([
            (PathBuf::from("/dev/snd"), ProbedPath::Directory),
            (PathBuf::from("/dev/snd/controlC0"), node(2)),
            (PathBuf::from("/dev/snd/timer"), node(33)),
            (PathBuf::from("/dev/snd/by-path"), ProbedPath::Directory),
            (PathBuf::from("/dev/fuse"), node(229)),
        ]))
    }
}

impl DeviceProbe for FakeDev {
    fn probe(&self, path: &Path) -> io::Result<ProbedPath> {
        self.0
            .get(path)
            .copied()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn walk(&self, dir: &Path) -> Vec<Result<PathBuf, SkippedEntry>> {
        self.0
            .keys()
            .filter(|p| p.starts_with(dir) && p.as_path() != dir)
            .cloned()
            .map(Ok)
            .collect()
    }
}

const INSPECT: &str = r#"[{
    "Id": "4f66ad9a0b2e6b3a7c1d8e9f0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8a9b",
    "Name": "/audio-player",
    "Path": "mpd",
    "Args": ["--no-daemon"],
    "AppArmorProfile": "",
    "HostsPath": "/var/lib/docker/containers/4f66ad9a0b2e/hosts",
    "ResolvConfPath": "/var/lib/docker/containers/4f66ad9a0b2e/resolv.conf",
    "Config": {
        "Hostname": "4f66ad9a0b2e",
        "User": "mpd",
        "Env": ["PATH=/usr/bin:/bin", "MPD_CONF=/etc/mpd.conf"],
        "WorkingDir": "/var/lib/mpd",
        "Tty": false
    },
    "HostConfig": {
        "Privileged": false,
        "ReadonlyRootfs": true,
        "NetworkMode": "bridge",
        "PidMode": "",
        "CapAdd": ["SYS_NICE"],
        "CapDrop": ["MKNOD"],
        "Devices": [
            {"PathOnHost": "/dev/snd", "PathInContainer": "/dev/snd", "CgroupPermissions": "rw"}
        ],
        "SecurityOpt": null,
        "GroupAdd": ["audio"],
        "Ulimits": [{"Name": "rtprio", "Soft": 95, "Hard": 95}],
        "Memory": 268435456,
        "MemorySwappiness": null,
        "CpuShares": 512,
        "PidsLimit": 64
    },
    "Mounts": [
        {"Type": "bind", "Source": "/srv/music", "Destination": "/var/lib/mpd/music", "Mode": "", "RW": false}
    ]
}]"#;

fn load() -> ContainerInspect {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inspect.json");
    std::fs::write(&path, INSPECT).unwrap();
    docket::engine::read_descriptor(&path).unwrap()
}

fn translator(config: TranslateConfig) -> Translator {
    let identity = Passwd {
        users: HashMap::from([("mpd", (107, 29))]),
        groups: HashMap::from([("audio", 29)]),
    };
    Translator::new(config)
        .with_identity(identity)
        .with_label_policy(SelinuxLabelPolicy::with_enabled(false))
        .with_device_probe(FakeDev::new())
}

fn remapped() -> Spec {
    translator(TranslateConfig::default().with_id_range(100_000, 65_536))
        .translate(&load())
        .unwrap()
}

#[test]
fn process_matches_descriptor() {
    let spec = remapped();
    let process = spec.process.unwrap();

    assert_eq!(process.args, ["mpd", "--no-daemon"]);
    assert_eq!(process.cwd, PathBuf::from("/var/lib/mpd"));
    assert_eq!((process.user.uid, process.user.gid), (107, 29));
    assert_eq!(process.user.additional_gids, [29]);
    assert!(!process.terminal);
    assert!(!process.env.iter().any(|e| e.starts_with("TERM=")));
    assert_eq!(process.rlimits.len(), 1);
    assert_eq!(process.rlimits[0].limit_type, "RLIMIT_RTPRIO");
    assert_eq!(process.apparmor_profile.as_deref(), Some("docker-default"));

    let caps = process.capabilities.unwrap();
    assert!(caps.bounding.contains(&"CAP_SYS_NICE".to_string()));
    assert!(!caps.bounding.contains(&"CAP_MKNOD".to_string()));
    assert_eq!(caps.bounding, caps.effective);
}

#[test]
fn hostname_uses_container_name() {
    assert_eq!(remapped().hostname.as_deref(), Some("audio-player"));
}

#[test]
fn remapped_container_gets_user_namespace() {
    let spec = remapped();
    let linux = spec.linux.unwrap();

    let kinds: Vec<NamespaceType> = linux.namespaces.iter().map(|n| n.ns_type).collect();
    assert_eq!(
        kinds,
        [
            NamespaceType::Mount,
            NamespaceType::Uts,
            NamespaceType::Ipc,
            NamespaceType::Network,
            NamespaceType::Pid,
            NamespaceType::User,
        ]
    );

    assert_eq!(linux.uid_mappings, [IdMapping::new(0, 100_000, 65_536)]);
    assert_eq!(
        linux.gid_mappings,
        [
            IdMapping::new(0, 100_000, 29),
            IdMapping::new(29, 29, 1),
            IdMapping::new(30, 100_030, 65_506),
        ]
    );
    assert!(linux.seccomp.is_some());
}

#[test]
fn sound_directory_expands_to_devices() {
    let linux = remapped().linux.unwrap();
    let paths: Vec<&Path> = linux.devices.iter().map(|d| d.path.as_path()).collect();

    assert!(paths.contains(&Path::new("/dev/snd/controlC0")));
    assert!(paths.contains(&Path::new("/dev/snd/timer")));
    assert!(!paths.contains(&Path::new("/dev/snd/by-path")));
    assert!(!paths.contains(&Path::new("/dev/tty")));
    assert!(paths.contains(&Path::new("/dev/null")));

    let resources = linux.resources.unwrap();
    assert_eq!(resources.devices.len(), linux.devices.len());
    let timer = linux
        .devices
        .iter()
        .position(|d| d.path == Path::new("/dev/snd/timer"))
        .unwrap();
    assert_eq!(resources.devices[timer].access.as_deref(), Some("rw"));
    assert_eq!(resources.devices[timer].minor, Some(33));

    assert_eq!(resources.memory.unwrap().limit, Some(268_435_456));
    assert_eq!(resources.cpu.unwrap().shares, Some(512));
    assert_eq!(resources.pids.unwrap().limit, 64);
}

#[test]
fn remapped_mounts_skip_host_only_options() {
    let spec = remapped();
    let destinations: Vec<&Path> = spec.mounts.iter().map(|m| m.destination.as_path()).collect();

    assert!(destinations.contains(&Path::new("/etc/hosts")));
    assert!(destinations.contains(&Path::new("/etc/resolv.conf")));
    assert!(destinations.contains(&Path::new("/var/lib/mpd/music")));

    let devpts = spec
        .mounts
        .iter()
        .find(|m| m.destination == Path::new("/dev/pts"))
        .unwrap();
    assert!(!devpts.options.contains(&"gid=5".to_string()));

    let music = spec
        .mounts
        .iter()
        .find(|m| m.destination == Path::new("/var/lib/mpd/music"))
        .unwrap();
    assert!(music.options.contains(&"ro".to_string()));
    assert!(spec.root.unwrap().readonly);
}

#[test]
fn host_network_disables_remapping() {
    let mut inspect = load();
    inspect.host_config.network_mode = "host".to_string();

    let spec = translator(TranslateConfig::default().with_id_range(100_000, 65_536))
        .translate(&inspect)
        .unwrap();
    let linux = spec.linux.unwrap();

    assert!(linux.uid_mappings.is_empty());
    assert!(linux.gid_mappings.is_empty());
    assert!(
        !linux
            .namespaces
            .iter()
            .any(|n| matches!(n.ns_type, NamespaceType::User | NamespaceType::Network))
    );
    assert!(
        !spec
            .mounts
            .iter()
            .any(|m| m.destination == Path::new("/etc/hosts"))
    );
}

#[test]
fn unknown_group_fails_translation() {
    let mut inspect = load();
    inspect.host_config.group_add = vec!["plugdev".to_string()];

    let err = translator(TranslateConfig::default())
        .translate(&inspect)
        .unwrap_err();
    assert!(matches!(err, DocketError::LookupFailure { kind: "group", .. }));
}

#[test]
fn missing_device_fails_translation() {
    let mut inspect = load();
    inspect.host_config.devices[0].path_on_host = "/dev/dri".to_string();

    let err = translator(TranslateConfig::default())
        .translate(&inspect)
        .unwrap_err();
    assert!(matches!(err, DocketError::DeviceResolution { .. }));
}

#[test]
fn spec_serializes_with_oci_field_names() {
    let json = serde_json::to_value(remapped()).unwrap();

    assert_eq!(json["hostname"], "audio-player");
    assert_eq!(json["process"]["user"]["additionalGids"][0], 29);
    assert_eq!(json["linux"]["gidMappings"][1]["containerID"], 29);
    assert_eq!(json["linux"]["gidMappings"][1]["hostID"], 29);
    assert_eq!(json["linux"]["namespaces"][0]["type"], "mount");
}
