//! Container descriptor to runtime spec translation.

use docket_common::DocketResult;
use docket_oci::inspect::{ContainerInspect, HostConfig, Ulimit};
use docket_oci::runtime::{
    BlockIoResources, Capabilities, CpuResources, Linux, MemoryResources, PidsResources, Process,
    Resources, Rlimit, Root, Spec,
};

use super::TranslateConfig;
use crate::devices::{DeviceMerger, DeviceProbe, HostDevices, HostFs, MergedDevices};
use crate::filesystem::{NetworkFiles, assemble_mounts};
use crate::identity::{IdentityResolver, SystemIdentity, resolve_group, resolve_user};
use crate::namespace::{NamespaceConfig, split_for_gids};
use crate::security::{CapabilitySet, LabelPolicy, SecurityResolver, SelinuxLabelPolicy};

/// Environment given to terminal containers that declare none.
pub const DEFAULT_TERMINAL_PATH: &str =
    "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// `TERM` value appended for terminal containers.
pub const DEFAULT_TERMINAL: &str = "xterm";

const DEFAULT_CWD: &str = "/";

/// Open file limit used when the container sets no ulimits.
const DEFAULT_NOFILE: u64 = 1024;

/// Translates container descriptors into runtime specs.
///
/// Host lookups (users and groups, SELinux labelling, device nodes) go
/// through replaceable collaborators so translation can run against a fake
/// host.
pub struct Translator {
    config: TranslateConfig,
    identity: Box<dyn IdentityResolver>,
    label_policy: Box<dyn LabelPolicy>,
    probe: Box<dyn DeviceProbe>,
}

impl Translator {
    /// Create a translator inspecting the current host.
    #[must_use]
    pub fn new(config: TranslateConfig) -> Self {
        Self {
            config,
            identity: Box::new(SystemIdentity),
            label_policy: Box::new(SelinuxLabelPolicy::detect()),
            probe: Box::new(HostFs),
        }
    }

    /// Use `identity` for user and group lookups.
    #[must_use]
    pub fn with_identity(mut self, identity: impl IdentityResolver + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    /// Use `policy` to compute SELinux labels.
    #[must_use]
    pub fn with_label_policy(mut self, policy: impl LabelPolicy + 'static) -> Self {
        self.label_policy = Box::new(policy);
        self
    }

    /// Use `probe` to inspect host device paths.
    #[must_use]
    pub fn with_device_probe(mut self, probe: impl DeviceProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &TranslateConfig {
        &self.config
    }

    /// Translate `inspect` into a runtime spec.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any stage. Nothing is produced for
    /// a failed translation.
    pub fn translate(&self, inspect: &ContainerInspect) -> DocketResult<Spec> {
        let host = &inspect.host_config;
        let privileged = host.privileged;
        let terminal = inspect.config.tty;

        tracing::debug!(container = %inspect.id, name = %inspect.trimmed_name(), privileged, "Translating container");

        let mut process = self.process(inspect)?;

        let namespaces = NamespaceConfig::for_container(host, self.config.id_range.is_enabled());
        let remapped = namespaces.user;
        let (uid_mappings, gid_mappings) = if remapped {
            (self.config.id_range.mappings(), self.config.id_range.mappings())
        } else {
            (Vec::new(), Vec::new())
        };

        let capabilities = CapabilitySet::new(host.cap_add.clone(), host.cap_drop.clone())
            .resolve(&self.config.capabilities, privileged);
        process.capabilities = Some(Capabilities::uniform(capabilities));

        let MergedDevices {
            devices,
            rules,
            skipped,
        } = if privileged {
            HostDevices::new(self.probe.as_ref()).collect()
        } else {
            DeviceMerger::new(self.probe.as_ref()).merge(&host.devices, terminal)?
        };
        for entry in &skipped {
            tracing::warn!(path = %entry.path.display(), reason = %entry.reason, "Skipped device entry");
        }

        let network = has_networking(host)
            .then(|| NetworkFiles::new(&inspect.hosts_path, &inspect.resolv_conf_path));
        let mounts = assemble_mounts(&inspect.mounts, network.as_ref(), remapped);

        let gid_mappings = if remapped {
            split_for_gids(gid_mappings, &process.user.additional_gids)
        } else {
            gid_mappings
        };

        let security = SecurityResolver::new(&self.config.apparmor_profile, self.label_policy.as_ref())
            .resolve(&host.security_opt, &inspect.app_armor_profile, privileged)?;
        process.apparmor_profile = security.apparmor_profile;
        process.selinux_label = security.selinux.process;

        let mut resources = resources(host);
        resources.devices = rules;

        let spec = Spec {
            root: Some(Root {
                path: self.config.rootfs.clone(),
                readonly: host.readonly_rootfs,
            }),
            process: Some(process),
            hostname: hostname(inspect),
            mounts,
            hooks: (!self.config.hooks.is_empty()).then(|| self.config.hooks.clone()),
            linux: Some(Linux {
                uid_mappings,
                gid_mappings,
                namespaces: namespaces.to_namespaces(),
                devices,
                resources: Some(resources),
                seccomp: security.seccomp,
                mount_label: security.selinux.mount,
                ..Linux::default()
            }),
            ..Spec::default()
        };

        tracing::debug!(
            mounts = spec.mounts.len(),
            remapped,
            "Translation complete"
        );
        Ok(spec)
    }

    fn process(&self, inspect: &ContainerInspect) -> DocketResult<Process> {
        let config = &inspect.config;

        let mut args = Vec::with_capacity(inspect.args.len() + 1);
        if !inspect.path.is_empty() {
            args.push(inspect.path.clone());
        }
        args.extend(inspect.args.iter().cloned());

        let mut user = resolve_user(self.identity.as_ref(), &config.user);
        user.additional_gids = inspect
            .host_config
            .group_add
            .iter()
            .map(|group| resolve_group(self.identity.as_ref(), group))
            .collect::<DocketResult<_>>()?;

        let cwd = if config.working_dir.is_empty() {
            DEFAULT_CWD
        } else {
            config.working_dir.as_str()
        };

        let oom_score_adj = inspect.host_config.oom_score_adj;

        Ok(Process {
            terminal: config.tty,
            user,
            args,
            env: process_env(&config.env, config.tty),
            cwd: cwd.into(),
            rlimits: rlimits(&inspect.host_config.ulimits),
            oom_score_adj: (oom_score_adj != 0).then_some(oom_score_adj),
            ..Process::default()
        })
    }
}

/// Process environment, with terminal defaults applied.
#[must_use]
pub fn process_env(env: &[String], terminal: bool) -> Vec<String> {
    let mut env = env.to_vec();
    if terminal {
        if env.is_empty() {
            env.push(DEFAULT_TERMINAL_PATH.to_string());
        }
        if !env.iter().any(|e| e.starts_with("TERM=")) {
            env.push(format!("TERM={DEFAULT_TERMINAL}"));
        }
    }
    env
}

/// Container hostname, preferring the container name over a generated one.
fn hostname(inspect: &ContainerInspect) -> Option<String> {
    let declared = inspect.config.hostname.as_str();
    let hostname = if inspect.id.is_default_hostname(declared) {
        inspect.trimmed_name()
    } else {
        declared
    };
    (!hostname.is_empty()).then(|| hostname.to_string())
}

/// Whether the container gets its own working network stack.
fn has_networking(host: &HostConfig) -> bool {
    !host.network_is_none() && !host.network_is_host() && !host.network_is_container()
}

fn rlimits(ulimits: &[Ulimit]) -> Vec<Rlimit> {
    if ulimits.is_empty() {
        return vec![Rlimit {
            limit_type: "RLIMIT_NOFILE".to_string(),
            hard: DEFAULT_NOFILE,
            soft: DEFAULT_NOFILE,
        }];
    }

    // Negative limits mean unlimited.
    let limit = |value: i64| u64::try_from(value).unwrap_or(u64::MAX);
    ulimits
        .iter()
        .map(|u| Rlimit {
            limit_type: format!("RLIMIT_{}", u.name.to_ascii_uppercase()),
            hard: limit(u.hard),
            soft: limit(u.soft),
        })
        .collect()
}

fn positive(value: i64) -> Option<u64> {
    u64::try_from(value).ok().filter(|v| *v > 0)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn resources(host: &HostConfig) -> Resources {
    let memory = MemoryResources {
        limit: (host.memory > 0).then_some(host.memory),
        reservation: (host.memory_reservation > 0).then_some(host.memory_reservation),
        swap: (host.memory_swap != 0).then_some(host.memory_swap),
        kernel: (host.kernel_memory > 0).then_some(host.kernel_memory),
        swappiness: host.memory_swappiness.and_then(|s| u64::try_from(s).ok()),
        disable_oom_killer: host.oom_kill_disable,
    };
    let cpu = CpuResources {
        shares: positive(host.cpu_shares),
        quota: (host.cpu_quota != 0).then_some(host.cpu_quota),
        period: positive(host.cpu_period),
        cpus: non_empty(&host.cpuset_cpus),
        mems: non_empty(&host.cpuset_mems),
    };

    Resources {
        devices: Vec::new(),
        memory: (memory != MemoryResources::default()).then_some(memory),
        cpu: (cpu != CpuResources::default()).then_some(cpu),
        pids: host
            .pids_limit
            .filter(|limit| *limit != 0)
            .map(|limit| PidsResources { limit }),
        block_io: (host.blkio_weight > 0).then(|| BlockIoResources {
            weight: Some(host.blkio_weight),
        }),
    }
}
