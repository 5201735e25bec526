//! The `zeroshot config` command for configuration management.

use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use zeroshot_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
///
/// `custom_path` is the `--config` flag; the platform default is used otherwise.
pub async fn execute(args: ConfigArgs, custom_path: Option<&Path>) -> anyhow::Result<()> {
    let path = config_path(custom_path);

    match args.command {
        ConfigCommand::Show => {
            let config = super::load_config(custom_path)?;
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            init(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn config_path(custom_path: Option<&Path>) -> PathBuf {
    custom_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path)
}

/// Write the default configuration to `path`.
fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, Config::default().to_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        init(&path, false).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.inference.load_policy, "shared");
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

        let err = init(&path, false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("9000"));

        init(&path, true).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_custom_path_wins() {
        let custom = Path::new("/tmp/zeroshot-custom.toml");
        assert_eq!(config_path(Some(custom)), custom.to_path_buf());
        assert_eq!(config_path(None), Config::default_path());
    }
}
