pub mod config;
pub mod task;

use anyhow::Result;
use core_logic::{CoreError, EthersWalletProvider, ProviderSession, Task, WalletConfig};
use crate::config::load_from;
use crate::task::{ScriptContext, UserScript};
use ethers::utils::to_checksum;
use std::sync::Arc;
use tracing::info;

pub use ::config::Map;

/// Load config from `vars` (process environment when `None`), then run.
///
/// Configuration errors surface before any network connection is attempted.
pub async fn launch(vars: Option<Map<String, String>>, handle_interrupt: bool) -> Result<()> {
    let config = load_from(vars).map_err(CoreError::from)?;
    run(config, handle_interrupt).await
}

/// Connect, enumerate accounts, run the extension point, then tear down.
pub async fn run(config: WalletConfig, handle_interrupt: bool) -> Result<()> {
    info!(endpoint = %config.endpoint.redacted(), "Connecting to provider");
    let provider = Arc::new(EthersWalletProvider::connect(&config).await?);

    ProviderSession::new(provider)
        .handle_interrupt(handle_interrupt)
        .run(|client| async move {
            let accounts = client.list_accounts().await?;
            if let Some(default) = accounts.first() {
                info!(
                    "Loaded {} account(s), default {}",
                    accounts.len(),
                    to_checksum(default, None)
                );
            }

            let script = UserScript;
            let result = script.run(ScriptContext { client, accounts }).await?;
            info!(task = script.name(), "{}", result.message);
            Ok(())
        })
        .await
}
