use anyhow::Result;
use async_trait::async_trait;
use core_logic::{ChainClient, Task, TaskResult};
use ethers::types::Address;

/// What a script gets to work with: a live client and the accounts it controls.
#[derive(Debug, Clone)]
pub struct ScriptContext {
    pub client: ChainClient,
    pub accounts: Vec<Address>,
}

/// Extension point. Put chain operations in `run`; the provider is still
/// live while it executes and is stopped right after it returns.
pub struct UserScript;

#[async_trait]
impl Task<ScriptContext> for UserScript {
    fn name(&self) -> &str {
        "user_script"
    }

    async fn run(&self, ctx: ScriptContext) -> Result<TaskResult> {
        let _ = ctx;

        Ok(TaskResult {
            success: true,
            message: "No operations configured".to_string(),
            tx_hash: None,
        })
    }
}
