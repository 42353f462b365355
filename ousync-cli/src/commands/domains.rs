//! `ousync domains` — list the forest's domain partitions.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use ousync_directory::{Directory, LdapDirectory};

use crate::GlobalArgs;

/// Arguments for `ousync domains`.
#[derive(Args, Debug)]
pub struct DomainsArgs {}

#[derive(Tabled)]
struct DomainRow {
    #[tabled(rename = "Domain")]
    dns_name: String,
    #[tabled(rename = "NetBIOS")]
    netbios: String,
    #[tabled(rename = "Naming context")]
    naming_context: String,
    #[tabled(rename = "Server")]
    server: String,
}

impl DomainsArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = super::load_config(global)?;
        let mut dir = LdapDirectory::new(config.directory.clone())
            .context("directory integration unavailable")?;
        dir.connect().context("directory integration unavailable")?;

        let domains = dir
            .forest_domains()
            .context("failed to enumerate forest domains")?;
        if domains.is_empty() {
            println!("No domains found in forest {}.", config.directory.forest);
            return Ok(());
        }

        let rows: Vec<DomainRow> = domains
            .iter()
            .map(|d| DomainRow {
                dns_name: d.dns_name.clone(),
                netbios: d.netbios_name.clone().unwrap_or_else(|| "-".to_string()),
                naming_context: d.naming_context.clone(),
                server: config
                    .directory
                    .server_override(&d.dns_name)
                    .map(str::to_owned)
                    .unwrap_or_else(|| "(discover)".to_string()),
            })
            .collect();

        println!(
            "{} {}",
            "Forest".bold(),
            config.directory.forest.green().bold()
        );
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
