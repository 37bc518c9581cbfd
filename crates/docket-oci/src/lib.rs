//! # docket-oci
//!
//! Document types on both sides of the translation:
//! - Engine container descriptor (`inspect` response)
//! - OCI Runtime Specification (config.json)

#![warn(missing_docs)]

pub mod inspect;
pub mod runtime;

pub use inspect::ContainerInspect;
pub use runtime::Spec;
