//! Filesystem layout for the container.
//!
//! This module handles:
//! - The default mount table
//! - User bind mounts
//! - `/etc/hosts` and `/etc/resolv.conf` for networked containers

mod mounts;

pub use mounts::{NetworkFiles, assemble_mounts, bind_mount, default_mounts};
