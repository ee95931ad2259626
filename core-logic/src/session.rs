//! # Provider Session
//!
//! Scoped acquisition for a [`WalletProvider`]: the body gets a
//! [`ChainClient`], and `stop()` is awaited after it on every exit path.

use crate::client::ChainClient;
use crate::traits::WalletProvider;
use anyhow::{anyhow, Result};
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

pub struct ProviderSession {
    provider: Arc<dyn WalletProvider>,
    handle_interrupt: bool,
}

impl ProviderSession {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider,
            handle_interrupt: false,
        }
    }

    /// Race the body against Ctrl+C. An interrupt still tears the provider down.
    pub fn handle_interrupt(mut self, enabled: bool) -> Self {
        self.handle_interrupt = enabled;
        self
    }

    /// Run `body`, then stop the provider exactly once.
    ///
    /// The body's error wins over a teardown error; the latter is logged.
    pub async fn run<F, Fut, T>(self, body: F) -> Result<T>
    where
        F: FnOnce(ChainClient) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let client = ChainClient::new(Arc::clone(&self.provider));
        let work = body(client);

        let outcome = if self.handle_interrupt {
            race_interrupt(work, signal::ctrl_c()).await
        } else {
            work.await
        };

        let teardown = self.provider.stop().await;

        match (outcome, teardown) {
            (Ok(value), Ok(())) => {
                info!("Session finished SUCCESS");
                Ok(value)
            }
            (Ok(_), Err(stop_err)) => Err(stop_err.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(stop_err)) => {
                error!("Teardown also failed: {}", stop_err);
                Err(e)
            }
        }
    }
}

/// Run `work` unless `interrupt` fires first.
///
/// If the signal listener itself fails, the interrupt is ignored and `work`
/// runs to completion.
async fn race_interrupt<Fut, T, S>(work: Fut, interrupt: S) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
    S: Future<Output = io::Result<()>>,
{
    tokio::pin!(work);
    tokio::select! {
        res = &mut work => res,
        signal = interrupt => match signal {
            Ok(()) => {
                warn!("Received Ctrl+C. Stopping provider...");
                Err(anyhow!("Interrupted"))
            }
            Err(err) => {
                error!("Unable to listen for shutdown signal: {}", err);
                work.await
            }
        },
    }
}
