//! Writing the runtime spec into a bundle.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use docket_common::{BundlePaths, DocketError, DocketResult};
use docket_oci::Spec;

/// Serialize `spec` as JSON indented by four spaces.
///
/// # Errors
///
/// Fails only if serialization fails.
pub fn to_json(spec: &Spec) -> DocketResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    spec.serialize(&mut serializer)?;
    Ok(out)
}

/// Write `spec` to the bundle's `config.json`, returning the file path.
///
/// # Errors
///
/// Returns [`DocketError::OutputCollision`] if the file exists and `force`
/// is false, and [`DocketError::Io`] if the bundle directory is missing or
/// the write fails.
pub fn write_spec(spec: &Spec, bundle: &BundlePaths, force: bool) -> DocketResult<PathBuf> {
    let root = bundle.root();
    if !std::fs::metadata(root)?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("bundle path {} is not a directory", root.display()),
        )
        .into());
    }

    let path = bundle.config();
    if !force && path.try_exists()? {
        return Err(DocketError::OutputCollision { path });
    }

    std::fs::write(&path, to_json(spec)?)?;
    tracing::info!(path = %path.display(), "Runtime spec written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_space_indent() {
        let json = String::from_utf8(to_json(&Spec::default()).unwrap()).unwrap();
        assert!(json.starts_with("{\n    \"ociVersion\": \"1.2.0\""));
    }

    #[test]
    fn refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = BundlePaths::new(dir.path());

        let path = write_spec(&Spec::default(), &bundle, false).unwrap();
        assert_eq!(path, dir.path().join("config.json"));

        let err = write_spec(&Spec::default(), &bundle, false).unwrap_err();
        assert!(matches!(err, DocketError::OutputCollision { .. }));

        write_spec(&Spec::default(), &bundle, true).unwrap();
    }

    #[test]
    fn missing_bundle_dir() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = BundlePaths::new(dir.path().join("missing"));
        let err = write_spec(&Spec::default(), &bundle, false).unwrap_err();
        assert!(matches!(err, DocketError::Io(_)));
    }

    #[test]
    fn written_spec_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let spec = Spec {
            hostname: Some("web".to_string()),
            ..Spec::default()
        };
        let path = write_spec(&spec, &BundlePaths::new(dir.path()), false).unwrap();
        let read: Spec = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(read, spec);
    }
}
