//! CLI definition and handler.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

use docket_common::BundlePaths;
use docket_common::paths::DEFAULT_ROOTFS;

use crate::bundle::write_spec;
use crate::engine::{EngineClient, read_descriptor};
use crate::hooks::parse_hooks;
use crate::runtime::{TranslateConfig, Translator};

/// Docket - convert a container's inspect output into an OCI runtime spec
#[derive(Parser, Debug)]
#[command(name = "docket")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Container name or ID
    #[arg(required_unless_present = "input")]
    pub container: Option<String>,

    /// Engine socket to connect to (defaults to $DOCKER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Read the descriptor from a JSON file instead of the engine ("-" for stdin)
    #[arg(long, short = 'i', conflicts_with = "host")]
    pub input: Option<PathBuf>,

    /// Path to the root of the bundle directory
    #[arg(long, short = 'b', env = "DOCKET_BUNDLE", default_value = ".")]
    pub bundle: PathBuf,

    /// Root filesystem path written into config.json
    #[arg(long, default_value = DEFAULT_ROOTFS)]
    pub rootfs: PathBuf,

    /// Hooks to prefill into config.json (ex. --hook prestart:netns)
    #[arg(long = "hook")]
    pub hooks: Vec<String>,

    /// Root UID/GID for user namespaces
    #[arg(long, default_value_t = 0)]
    pub idroot: u32,

    /// Length of the UID/GID range for user namespaces
    #[arg(long, default_value_t = 0)]
    pub idlen: u32,

    /// Overwrite an existing config.json
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    pub debug: bool,
}

impl Cli {
    /// Execute the translation.
    pub async fn execute(self) -> Result<()> {
        let hooks = parse_hooks(&self.hooks)?;

        let inspect = match (&self.input, &self.container) {
            (Some(path), _) => read_descriptor(path)?,
            (None, Some(container)) => {
                let client = match &self.host {
                    Some(host) => EngineClient::from_host(host)?,
                    None => EngineClient::from_env()?,
                };
                client.inspect(container).await?
            }
            (None, None) => color_eyre::eyre::bail!("pass the container name or ID"),
        };

        let config = TranslateConfig::default()
            .with_rootfs(&self.rootfs)
            .with_id_range(self.idroot, self.idlen)
            .with_hooks(hooks);
        let spec = Translator::new(config).translate(&inspect)?;

        let path = write_spec(&spec, &BundlePaths::new(&self.bundle), self.force)?;
        println!("{} has been saved.", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "docket",
            "--hook",
            "prestart:netns",
            "--hook",
            "poststop:cleanup",
            "--idroot",
            "100000",
            "--idlen",
            "65536",
            "-f",
            "-d",
            "web",
        ])
        .unwrap();

        assert_eq!(cli.container.as_deref(), Some("web"));
        assert_eq!(cli.hooks.len(), 2);
        assert_eq!((cli.idroot, cli.idlen), (100_000, 65_536));
        assert!(cli.force && cli.debug);
        assert_eq!(cli.rootfs, PathBuf::from("rootfs"));
    }

    #[test]
    fn container_or_input_required() {
        assert!(Cli::try_parse_from(["docket"]).is_err());
        let cli = Cli::try_parse_from(["docket", "--input", "inspect.json"]).unwrap();
        assert!(cli.container.is_none());
    }
}
