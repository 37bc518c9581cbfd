//! # docket-common
//!
//! Shared utilities and types for docket.
//!
//! This crate provides common functionality used across the docket crates:
//! - Engine container identifiers
//! - Bundle and engine socket paths
//! - Common error types

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod paths;

pub use error::{DocketError, DocketResult};
pub use id::ContainerId;
pub use paths::BundlePaths;
