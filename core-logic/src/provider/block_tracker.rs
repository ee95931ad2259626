//! Background poller that keeps the latest block number fresh.
//!
//! This is the long-lived resource a [`super::EthersWalletProvider`] owns:
//! a tokio task that must be cancelled and joined on shutdown.

use crate::error::CoreError;
use ethers::providers::Middleware;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const NO_BLOCK: u64 = u64::MAX;

#[derive(Debug)]
pub struct BlockTracker {
    token: CancellationToken,
    handle: JoinHandle<()>,
    latest: Arc<AtomicU64>,
}

impl BlockTracker {
    /// Spawn the poller. `interval` must be non-zero.
    pub fn spawn<M>(provider: M, interval: Duration) -> Self
    where
        M: Middleware + 'static,
    {
        let token = CancellationToken::new();
        let latest = Arc::new(AtomicU64::new(NO_BLOCK));

        let handle = tokio::spawn(poll_blocks(
            provider,
            interval,
            token.clone(),
            Arc::clone(&latest),
        ));

        Self {
            token,
            handle,
            latest,
        }
    }

    /// Latest block seen, if any poll has succeeded yet.
    pub fn latest_block(&self) -> Option<u64> {
        match self.latest.load(Ordering::SeqCst) {
            NO_BLOCK => None,
            n => Some(n),
        }
    }

    /// Signal the poller without waiting for it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel the poller and wait for the task to finish.
    pub async fn shutdown(self) -> Result<(), CoreError> {
        self.token.cancel();
        self.handle.await.map_err(|e| CoreError::Shutdown {
            reason: format!("block tracker task failed: {}", e),
        })
    }
}

async fn poll_blocks<M: Middleware>(
    provider: M,
    interval: Duration,
    token: CancellationToken,
    latest: Arc<AtomicU64>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = token.cancelled() => break,
            res = provider.get_block_number() => match res {
                Ok(number) => {
                    let number = number.as_u64();
                    let previous = latest.swap(number, Ordering::SeqCst);
                    if previous != number {
                        debug!(block = number, "New block");
                    }
                }
                Err(e) => warn!("Block poll failed: {}", e),
            },
        }
    }

    debug!("Block tracker stopped");
}
