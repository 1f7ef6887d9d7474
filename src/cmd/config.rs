//! Configuration view and validation commands: `estate-crm config`.

use anyhow::Result;
use std::path::Path;

use estate_crm::config::{CrmConfig, DEFAULT_CONFIG_FILE};

use super::super::ConfigCommands;

pub fn cmd_config(
    config: &CrmConfig,
    explicit: Option<&Path>,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            match explicit {
                Some(path) => println!("# Config file: {}", path.display()),
                None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                    println!("# Config file: {}", DEFAULT_CONFIG_FILE)
                }
                None => println!("# No {} found; using defaults", DEFAULT_CONFIG_FILE),
            }
            println!("# Effective values (with environment overrides)");
            println!();
            print!("{}", config.to_toml_string()?);
        }
        Some(ConfigCommands::Validate) => {
            config.validate()?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
