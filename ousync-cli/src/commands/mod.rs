//! Subcommand implementations.

pub mod config;
pub mod domains;
pub mod sync;

use anyhow::{Context, Result};

use ousync_core::{config as config_file, Config};

use crate::GlobalArgs;

/// Load the config named by `--config`, or the default one.
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    match &global.config {
        Some(path) => config_file::load_from(path)
            .with_context(|| format!("failed to load config '{}'", path.display())),
        None => config_file::load().context("failed to load config"),
    }
}
