use crate::error::{CoreError, NetworkError};
use anyhow::Result;
use async_trait::async_trait;
use ethers::types::{transaction::eip2718::TypedTransaction, Address, Signature, TxHash, U256};

/// A network connection that can also sign for the accounts it controls.
///
/// Implementations own some background resource (a poller, a socket) that
/// is only released by [`WalletProvider::stop`].
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Redacted endpoint, safe to log.
    fn endpoint(&self) -> &str;

    fn chain_id(&self) -> u64;

    fn is_stopped(&self) -> bool;

    /// Controlled accounts, signing account first.
    async fn accounts(&self) -> Result<Vec<Address>, NetworkError>;

    async fn block_number(&self) -> Result<u64, NetworkError>;

    async fn balance(&self, address: Address) -> Result<U256, NetworkError>;

    async fn transaction_count(&self, address: Address) -> Result<U256, NetworkError>;

    /// Sign locally with the default account. No network access.
    async fn sign_transaction(&self, tx: &TypedTransaction) -> Result<Signature, CoreError>;

    /// Fill, sign and broadcast. Returns once the node accepted the transaction.
    async fn send_transaction(&self, tx: TypedTransaction) -> Result<TxHash, NetworkError>;

    /// Release the background connection. Calling it again is a no-op.
    async fn stop(&self) -> Result<(), CoreError>;
}

#[derive(Debug, Clone)]
pub struct TaskResult {
    pub success: bool,
    pub message: String,
    pub tx_hash: Option<String>,
}

#[async_trait]
pub trait Task<Ctx>: Send + Sync {
    /// Returns the name of the task
    fn name(&self) -> &str;

    /// Executes the task
    async fn run(&self, ctx: Ctx) -> Result<TaskResult>;
}
