//! API server command: `estate-crm serve`.

use anyhow::Result;
use estate_crm::config::CrmConfig;

pub async fn cmd_serve(config: &CrmConfig) -> Result<()> {
    config.validate()?;
    estate_crm::crm::server::start_server(config.server_config()).await
}
