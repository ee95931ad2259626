//! # Chain Client
//!
//! Thin RPC facade over a shared [`WalletProvider`]. Cloning is cheap; all
//! clones stop working once the provider is stopped.

use crate::error::{CoreError, NetworkError};
use crate::traits::WalletProvider;
use ethers::types::{transaction::eip2718::TypedTransaction, Address, Signature, TxHash, U256};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct ChainClient {
    provider: Arc<dyn WalletProvider>,
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("endpoint", &self.provider.endpoint())
            .field("chain_id", &self.provider.chain_id())
            .finish()
    }
}

impl ChainClient {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self { provider }
    }

    pub fn chain_id(&self) -> u64 {
        self.provider.chain_id()
    }

    /// Accounts controlled by the signing secret, signing account first.
    pub async fn list_accounts(&self) -> Result<Vec<Address>, NetworkError> {
        self.ensure_live()?;
        let accounts = self.provider.accounts().await?;
        debug!(count = accounts.len(), "Listed accounts");
        Ok(accounts)
    }

    pub async fn block_number(&self) -> Result<u64, NetworkError> {
        self.ensure_live()?;
        self.provider.block_number().await
    }

    pub async fn balance(&self, address: Address) -> Result<U256, NetworkError> {
        self.ensure_live()?;
        self.provider.balance(address).await
    }

    pub async fn transaction_count(&self, address: Address) -> Result<U256, NetworkError> {
        self.ensure_live()?;
        self.provider.transaction_count(address).await
    }

    pub async fn sign_transaction(&self, tx: &TypedTransaction) -> Result<Signature, CoreError> {
        self.ensure_live()?;
        self.provider.sign_transaction(tx).await
    }

    pub async fn send_transaction(&self, tx: TypedTransaction) -> Result<TxHash, NetworkError> {
        self.ensure_live()?;
        self.provider.send_transaction(tx).await
    }

    fn ensure_live(&self) -> Result<(), NetworkError> {
        if self.provider.is_stopped() {
            return Err(NetworkError::ProviderStopped {
                endpoint: self.provider.endpoint().to_string(),
            });
        }
        Ok(())
    }
}
