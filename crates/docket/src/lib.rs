//! # Docket
//!
//! Docket turns a container engine's inspect descriptor into an OCI runtime
//! spec (`config.json`) that a low-level runtime can start.
//!
//! ## Features
//!
//! - **Capabilities**: default set with add/drop overrides, or everything when privileged
//! - **Devices**: default allow-list merged with host device mappings and directories
//! - **User namespaces**: ID range remapping with 1:1 carve-outs for supplementary groups
//! - **Security**: AppArmor, SELinux labels and seccomp profiles
//! - **Mounts**: default mount table merged with bind mounts and network files
//!
//! ## Usage
//!
//! ```no_run
//! use docket::runtime::{TranslateConfig, Translator};
//! use docket_common::BundlePaths;
//!
//! # fn example() -> docket_common::DocketResult<()> {
//! let inspect = docket::engine::read_descriptor(std::path::Path::new("inspect.json"))?;
//!
//! let config = TranslateConfig::default().with_id_range(100_000, 65_536);
//! let spec = Translator::new(config).translate(&inspect)?;
//!
//! docket::bundle::write_spec(&spec, &BundlePaths::new("bundle"), false)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod bundle;
pub mod cli;
pub mod devices;
pub mod engine;
pub mod filesystem;
pub mod hooks;
pub mod identity;
pub mod namespace;
pub mod runtime;
pub mod security;

pub use runtime::{TranslateConfig, Translator};
