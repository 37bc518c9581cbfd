//! OCI lifecycle hooks from the command line.
//!
//! Hooks are given as `<stage>:<command> [args...]`, for example
//! `prestart:netns --bridge br0`. The command is resolved through `PATH`.

use std::str::FromStr;

use docket_common::{DocketError, DocketResult};
use docket_oci::runtime::{Hook, Hooks};

/// Lifecycle stage a hook runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    /// Before the user process starts.
    Prestart,
    /// After the user process starts.
    Poststart,
    /// After the container is deleted.
    Poststop,
}

impl FromStr for HookStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prestart" => Ok(Self::Prestart),
            "poststart" => Ok(Self::Poststart),
            "poststop" => Ok(Self::Poststop),
            other => Err(format!(
                "{other} is not a valid hook, try 'prestart', 'poststart', or 'poststop'"
            )),
        }
    }
}

/// Parse a single hook specification.
///
/// # Errors
///
/// Fails on a missing separator, an unknown stage, an empty command, or a
/// command that cannot be found.
pub fn parse_hook(spec: &str) -> DocketResult<(HookStage, Hook)> {
    let Some((stage, command)) = spec.split_once(':') else {
        return Err(DocketError::malformed(spec, "expected hook_name:exec"));
    };
    let stage = stage
        .parse::<HookStage>()
        .map_err(|reason| DocketError::malformed(spec, reason))?;

    let args: Vec<String> = command.split_whitespace().map(String::from).collect();
    let Some(program) = args.first() else {
        return Err(DocketError::malformed(spec, "hook command is empty"));
    };

    let path = which::which(program)
        .map_err(|e| DocketError::lookup("executable", program.as_str(), e.to_string()))?;
    tracing::debug!(?stage, path = %path.display(), "Resolved hook");

    Ok((
        stage,
        Hook {
            path,
            args,
            env: Vec::new(),
            timeout: None,
        },
    ))
}

/// Parse every hook specification, grouping them by stage in order.
///
/// # Errors
///
/// Propagates the first specification that fails to parse.
pub fn parse_hooks<S: AsRef<str>>(specs: &[S]) -> DocketResult<Hooks> {
    let mut hooks = Hooks::default();
    for spec in specs {
        let (stage, hook) = parse_hook(spec.as_ref())?;
        match stage {
            HookStage::Prestart => hooks.prestart.push(hook),
            HookStage::Poststart => hooks.poststart.push(hook),
            HookStage::Poststop => hooks.poststop.push(hook),
        }
    }
    Ok(hooks)
}
