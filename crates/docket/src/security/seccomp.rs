//! Seccomp profiles for the runtime spec.
//!
//! The default profile denies every syscall with `EPERM` except an
//! allow-list of common ones. Inline profiles supplied through
//! `seccomp=<json>` replace it wholesale.

use docket_common::{DocketError, DocketResult};
use docket_oci::runtime::{Seccomp, SeccompAction, SeccompSyscall};

/// Marker that disables seccomp filtering.
pub const UNCONFINED: &str = "unconfined";

const EPERM: u32 = 1;

/// Syscalls the default profile allows.
const ALLOWED_SYSCALLS: &[&str] = &[
    "read",
    "write",
    "open",
    "close",
    "stat",
    "fstat",
    "lstat",
    "poll",
    "lseek",
    "mmap",
    "mprotect",
    "munmap",
    "brk",
    "rt_sigaction",
    "rt_sigprocmask",
    "rt_sigreturn",
    "ioctl",
    "access",
    "pipe",
    "select",
    "sched_yield",
    "mremap",
    "msync",
    "mincore",
    "madvise",
    "dup",
    "dup2",
    "pause",
    "nanosleep",
    "getitimer",
    "alarm",
    "setitimer",
    "getpid",
    "sendfile",
    "socket",
    "connect",
    "accept",
    "sendto",
    "recvfrom",
    "sendmsg",
    "recvmsg",
    "shutdown",
    "bind",
    "listen",
    "getsockname",
    "getpeername",
    "socketpair",
    "setsockopt",
    "getsockopt",
    "clone",
    "fork",
    "vfork",
    "execve",
    "exit",
    "wait4",
    "kill",
    "uname",
    "fcntl",
    "flock",
    "fsync",
    "fdatasync",
    "truncate",
    "ftruncate",
    "getdents",
    "getcwd",
    "chdir",
    "fchdir",
    "rename",
    "mkdir",
    "rmdir",
    "creat",
    "link",
    "unlink",
    "symlink",
    "readlink",
    "chmod",
    "fchmod",
    "chown",
    "fchown",
    "lchown",
    "umask",
    "gettimeofday",
    "getrlimit",
    "getrusage",
    "sysinfo",
    "times",
    "getuid",
    "getgid",
    "setuid",
    "setgid",
    "geteuid",
    "getegid",
    "setpgid",
    "getppid",
    "getpgrp",
    "setsid",
    "setreuid",
    "setregid",
    "getgroups",
    "setgroups",
    "setresuid",
    "getresuid",
    "setresgid",
    "getresgid",
    "getpgid",
    "setfsuid",
    "setfsgid",
    "getsid",
    "capget",
    "capset",
    "rt_sigpending",
    "rt_sigtimedwait",
    "rt_sigqueueinfo",
    "rt_sigsuspend",
    "sigaltstack",
    "utime",
    "mknod",
    "statfs",
    "fstatfs",
    "getpriority",
    "setpriority",
    "sched_setparam",
    "sched_getparam",
    "sched_setscheduler",
    "sched_getscheduler",
    "sched_get_priority_max",
    "sched_get_priority_min",
    "sched_rr_get_interval",
    "mlock",
    "munlock",
    "mlockall",
    "munlockall",
    "prctl",
    "arch_prctl",
    "setrlimit",
    "sync",
    "gettid",
    "readahead",
    "setxattr",
    "lsetxattr",
    "fsetxattr",
    "getxattr",
    "lgetxattr",
    "fgetxattr",
    "listxattr",
    "llistxattr",
    "flistxattr",
    "removexattr",
    "lremovexattr",
    "fremovexattr",
    "tkill",
    "time",
    "futex",
    "sched_setaffinity",
    "sched_getaffinity",
    "set_thread_area",
    "get_thread_area",
    "io_setup",
    "io_destroy",
    "io_getevents",
    "io_submit",
    "io_cancel",
    "exit_group",
    "epoll_create",
    "epoll_ctl",
    "epoll_wait",
    "set_tid_address",
    "fadvise64",
    "timer_create",
    "timer_settime",
    "timer_gettime",
    "timer_getoverrun",
    "timer_delete",
    "clock_settime",
    "clock_gettime",
    "clock_getres",
    "clock_nanosleep",
    "tgkill",
    "utimes",
    "openat",
    "mkdirat",
    "mknodat",
    "fchownat",
    "futimesat",
    "newfstatat",
    "unlinkat",
    "renameat",
    "linkat",
    "symlinkat",
    "readlinkat",
    "fchmodat",
    "faccessat",
    "pselect6",
    "ppoll",
    "set_robust_list",
    "get_robust_list",
    "splice",
    "tee",
    "sync_file_range",
    "vmsplice",
    "utimensat",
    "epoll_pwait",
    "signalfd",
    "timerfd_create",
    "eventfd",
    "fallocate",
    "timerfd_settime",
    "timerfd_gettime",
    "accept4",
    "signalfd4",
    "eventfd2",
    "epoll_create1",
    "dup3",
    "pipe2",
    "inotify_init1",
    "preadv",
    "pwritev",
    "rt_tgsigqueueinfo",
    "recvmmsg",
    "prlimit64",
    "syncfs",
    "sendmmsg",
    "getcpu",
    "getrandom",
    "memfd_create",
    "execveat",
    "mlock2",
    "copy_file_range",
    "preadv2",
    "pwritev2",
    "statx",
    "rseq",
    "pidfd_open",
    "clone3",
    "close_range",
    "pidfd_getfd",
    "faccessat2",
    "epoll_pwait2",
    "openat2",
    "futex_waitv",
    "getdents64",
    "seccomp",
    "pread64",
    "pwrite64",
];

/// Build the default seccomp profile.
#[must_use]
pub fn default_profile() -> Seccomp {
    Seccomp {
        default_action: SeccompAction::ScmpActErrno,
        default_errno_ret: Some(EPERM),
        architectures: native_architectures(),
        flags: Vec::new(),
        syscalls: vec![SeccompSyscall {
            names: ALLOWED_SYSCALLS.iter().map(|s| (*s).to_string()).collect(),
            action: SeccompAction::ScmpActAllow,
            errno_ret: None,
            args: Vec::new(),
        }],
    }
}

/// Parse an inline JSON seccomp profile.
///
/// # Errors
///
/// Returns [`DocketError::SeccompParse`] when `json` is not a valid profile.
pub fn parse_profile(json: &str) -> DocketResult<Seccomp> {
    serde_json::from_str(json).map_err(|e| DocketError::SeccompParse(e.to_string()))
}

/// Seccomp architectures for the host the profile is generated on.
fn native_architectures() -> Vec<String> {
    let arches: &[&str] = match std::env::consts::ARCH {
        "x86_64" => &["SCMP_ARCH_X86_64", "SCMP_ARCH_X86", "SCMP_ARCH_X32"],
        "aarch64" => &["SCMP_ARCH_AARCH64", "SCMP_ARCH_ARM"],
        "riscv64" => &["SCMP_ARCH_RISCV64"],
        "s390x" => &["SCMP_ARCH_S390X", "SCMP_ARCH_S390"],
        _ => &[],
    };
    arches.iter().map(|a| (*a).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = default_profile();
        assert_eq!(profile.default_action, SeccompAction::ScmpActErrno);
        assert_eq!(profile.default_errno_ret, Some(1));
        let allowed = &profile.syscalls[0];
        assert_eq!(allowed.action, SeccompAction::ScmpActAllow);
        assert!(allowed.names.iter().any(|n| n == "read"));
        assert!(!allowed.names.iter().any(|n| n == "mount"));
    }

    #[test]
    fn test_parse_inline_profile() {
        let profile = parse_profile(
            r#"{"defaultAction":"SCMP_ACT_ALLOW","syscalls":[{"names":["ptrace"],"action":"SCMP_ACT_ERRNO"}]}"#,
        )
        .unwrap();
        assert_eq!(profile.default_action, SeccompAction::ScmpActAllow);
        assert_eq!(profile.syscalls[0].names, vec!["ptrace"]);
    }

    #[test]
    fn test_parse_failure() {
        let err = parse_profile("{not json").unwrap_err();
        assert!(matches!(err, DocketError::SeccompParse(_)));
    }
}
