//! Common error types for docket.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`DocketError`].
pub type DocketResult<T> = Result<T, DocketError>;

/// Errors raised while translating a container descriptor into a runtime spec.
///
/// Every variant aborts the translation. The one degradation (a primary user
/// that cannot be looked up) is handled before an error is ever constructed.
#[derive(Error, Diagnostic, Debug)]
pub enum DocketError {
    /// A user or group name could not be resolved.
    #[error("Looking up {kind} ({name}) failed: {reason}")]
    #[diagnostic(
        code(docket::identity::lookup),
        help("Make sure the name exists in the host's passwd/group database")
    )]
    LookupFailure {
        /// What was being looked up ("user" or "group").
        kind: &'static str,
        /// The name that failed to resolve.
        name: String,
        /// Why the lookup failed.
        reason: String,
    },

    /// A security-opt or hook string was malformed.
    #[error("Invalid option {option:?}: {reason}")]
    #[diagnostic(code(docket::option::malformed))]
    MalformedOption {
        /// The raw option as supplied.
        option: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A requested host device is neither a device node nor a directory of devices.
    #[error(
        "Gathering device information while adding custom device ({}) failed: {reason}",
        .path.display()
    )]
    #[diagnostic(
        code(docket::device::resolution),
        help("Device mappings must point at a character/block device or a directory containing devices")
    )]
    DeviceResolution {
        /// The host-side path.
        path: PathBuf,
        /// Why resolution failed.
        reason: String,
    },

    /// An inline seccomp profile could not be parsed.
    #[error("Parsing seccomp profile failed: {0}")]
    #[diagnostic(code(docket::seccomp::parse))]
    SeccompParse(String),

    /// The destination file exists and overwriting was not requested.
    #[error("File {} exists, remove it", .path.display())]
    #[diagnostic(
        code(docket::bundle::collision),
        help("Pass --force to overwrite the existing file")
    )]
    OutputCollision {
        /// The existing file.
        path: PathBuf,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(docket::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(docket::serialization))]
    Serialization(String),

    /// The container engine could not produce a descriptor.
    #[error("Inspecting container ({target}) failed: {message}")]
    #[diagnostic(
        code(docket::engine),
        help("Check that the daemon socket is reachable and the container exists")
    )]
    Engine {
        /// Container name or ID that was requested.
        target: String,
        /// The error message.
        message: String,
    },
}

impl From<serde_json::Error> for DocketError {
    fn from(err: serde_json::Error) -> Self {
        DocketError::Serialization(err.to_string())
    }
}

impl DocketError {
    /// Shorthand for a [`DocketError::LookupFailure`].
    pub fn lookup(kind: &'static str, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LookupFailure {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`DocketError::MalformedOption`].
    pub fn malformed(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DocketError::LookupFailure {
            kind: "group",
            name: "audio".to_string(),
            reason: "no such group".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Looking up group (audio) failed: no such group"
        );
    }

    #[test]
    fn collision_display() {
        let err = DocketError::OutputCollision {
            path: PathBuf::from("config.json"),
        };
        assert_eq!(err.to_string(), "File config.json exists, remove it");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DocketError = io_err.into();
        assert!(matches!(err, DocketError::Io(_)));
    }

    #[test]
    fn error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DocketError = json_err.into();
        assert!(matches!(err, DocketError::Serialization(_)));
    }
}
