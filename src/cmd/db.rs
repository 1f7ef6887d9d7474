//! Database setup commands: `estate-crm init-db` and `estate-crm seed`.

use anyhow::{Context, Result};
use estate_crm::config::CrmConfig;
use estate_crm::crm::db::CrmDb;
use estate_crm::crm::seed::seed_sample_data;

fn open(config: &CrmConfig) -> Result<CrmDb> {
    let path = &config.database.path;
    CrmDb::new(path).with_context(|| format!("Failed to open CRM database at {}", path.display()))
}

pub fn cmd_init_db(config: &CrmConfig) -> Result<()> {
    open(config)?;
    println!("Database initialized at {}", config.database.path.display());
    Ok(())
}

pub fn cmd_seed(config: &CrmConfig) -> Result<()> {
    let db = open(config)?;
    let summary = seed_sample_data(&db).context("Failed to seed sample data")?;
    println!("Seeded {}", config.database.path.display());
    println!("  {}", summary);
    Ok(())
}
