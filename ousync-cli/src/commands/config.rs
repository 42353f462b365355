//! `ousync config` — create and inspect the configuration file.

use anyhow::{Context, Result};
use clap::Subcommand;

use ousync_core::config as config_file;

use crate::GlobalArgs;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a config file with default settings.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration.
    Show,
}

pub fn run(command: ConfigCommand, global: &GlobalArgs) -> Result<()> {
    match command {
        ConfigCommand::Init { force } => init(global, force),
        ConfigCommand::Show => show(global),
    }
}

fn init(global: &GlobalArgs, force: bool) -> Result<()> {
    let path = match &global.config {
        Some(path) => path.clone(),
        None => config_file::config_path().context("could not determine config location")?,
    };
    let config = config_file::init_to(&path, force)?;
    println!("✓ Wrote {}", path.display());
    println!(
        "  Edit forest and bind_dn, then export the bind password in ${}.",
        config.directory.password_env
    );
    Ok(())
}

fn show(global: &GlobalArgs) -> Result<()> {
    let config = super::load_config(global)?;
    let text = serde_yaml::to_string(&config).context("failed to render config")?;
    print!("{text}");
    Ok(())
}
