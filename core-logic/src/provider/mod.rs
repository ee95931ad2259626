//! # Wallet Provider
//!
//! ethers-backed [`WalletProvider`]: an HTTP or WebSocket JSON-RPC transport
//! wrapped in a [`SignerMiddleware`], plus a [`BlockTracker`] running in the
//! background until [`WalletProvider::stop`] is awaited.

pub mod block_tracker;

pub use block_tracker::BlockTracker;

use crate::config::{ProviderOptions, WalletConfig};
use crate::error::{ConnectionError, CoreError, NetworkError, WalletError};
use crate::traits::WalletProvider;
use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider, Ws};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{transaction::eip2718::TypedTransaction, Address, Signature, TxHash, U256};
use reqwest::Url;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type HttpClient = SignerMiddleware<Provider<Http>, LocalWallet>;
type WsClient = SignerMiddleware<Provider<Ws>, LocalWallet>;

/// Signing client over whichever transport the endpoint scheme selected.
#[derive(Clone)]
enum SignerClient {
    Http(Arc<HttpClient>),
    Ws(Arc<WsClient>),
}

/// Evaluates `$body` with `$c` bound to the inner client, whatever the transport.
macro_rules! with_client {
    ($client:expr, $c:ident => $body:expr) => {
        match $client {
            SignerClient::Http($c) => $body,
            SignerClient::Ws($c) => $body,
        }
    };
}

/// Live half of the provider; `None` once stopped.
///
/// Dropping the client together with the tracker releases the last transport
/// handle. For WebSocket endpoints that closes the socket.
struct Connection {
    client: SignerClient,
    tracker: BlockTracker,
}

pub struct EthersWalletProvider {
    endpoint: String,
    chain_id: u64,
    accounts: Vec<Address>,
    wallet: LocalWallet,
    connection: Mutex<Option<Connection>>,
    stopped: AtomicBool,
}

impl std::fmt::Debug for EthersWalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthersWalletProvider")
            .field("endpoint", &self.endpoint)
            .field("chain_id", &self.chain_id)
            .field("accounts", &self.accounts)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl EthersWalletProvider {
    /// Open a provider for `config`.
    ///
    /// The signing secret is parsed before any network traffic, so a bad key
    /// never reaches the endpoint. `http(s)://` endpoints get a reqwest
    /// transport, `ws(s)://` endpoints a WebSocket one. Reachability is proven
    /// by `eth_chainId`, whose answer is bound into every derived wallet.
    pub async fn connect(config: &WalletConfig) -> Result<Self, CoreError> {
        let endpoint = config.endpoint.redacted();
        let options = &config.options;

        let wallets = config
            .signing_secret
            .derive_wallets(options.address_index, options.num_addresses)?;

        let url = Url::parse(config.endpoint.as_str()).map_err(|e| {
            ConnectionError::InvalidEndpoint {
                url: endpoint.clone(),
                reason: e.to_string(),
            }
        })?;

        match url.scheme() {
            "http" | "https" => {
                let provider = http_provider(url, options)?;
                Self::bind(provider, wallets, endpoint, options, SignerClient::Http).await
            }
            "ws" | "wss" => {
                let provider = ws_provider(&url, &endpoint, options).await?;
                Self::bind(provider, wallets, endpoint, options, SignerClient::Ws).await
            }
            other => Err(ConnectionError::UnsupportedScheme {
                scheme: other.to_string(),
            }
            .into()),
        }
    }

    /// Probe the chain id, bind it into the wallets and start the tracker.
    async fn bind<T>(
        provider: Provider<T>,
        wallets: Vec<LocalWallet>,
        endpoint: String,
        options: &ProviderOptions,
        wrap: fn(Arc<SignerMiddleware<Provider<T>, LocalWallet>>) -> SignerClient,
    ) -> Result<Self, CoreError>
    where
        T: JsonRpcClient + Clone + 'static,
    {
        debug!(endpoint = %endpoint, "Requesting chain id");
        let chain_id = fetch_chain_id(&provider, &endpoint).await?;

        let wallets: Vec<LocalWallet> = wallets
            .into_iter()
            .map(|w| w.with_chain_id(chain_id))
            .collect();
        let accounts: Vec<Address> = wallets.iter().map(|w| w.address()).collect();
        let wallet = wallets
            .into_iter()
            .next()
            .ok_or(WalletError::InvalidKeyFormat)?;

        let tracker = BlockTracker::spawn(provider.clone(), options.polling_interval());
        let client = wrap(Arc::new(SignerMiddleware::new(provider, wallet.clone())));

        info!(
            endpoint = %endpoint,
            chain_id,
            accounts = accounts.len(),
            "Provider connected"
        );

        Ok(Self {
            endpoint,
            chain_id,
            accounts,
            wallet,
            connection: Mutex::new(Some(Connection { client, tracker })),
            stopped: AtomicBool::new(false),
        })
    }

    /// Latest block seen by the background tracker.
    pub async fn latest_block(&self) -> Option<u64> {
        self.connection
            .lock()
            .await
            .as_ref()
            .and_then(|c| c.tracker.latest_block())
    }

    async fn client(&self) -> Result<SignerClient, NetworkError> {
        self.connection
            .lock()
            .await
            .as_ref()
            .map(|c| c.client.clone())
            .ok_or_else(|| self.stopped_error())
    }

    fn stopped_error(&self) -> NetworkError {
        NetworkError::ProviderStopped {
            endpoint: self.endpoint.clone(),
        }
    }
}

#[async_trait]
impl WalletProvider for EthersWalletProvider {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    async fn accounts(&self) -> Result<Vec<Address>, NetworkError> {
        if self.is_stopped() {
            return Err(self.stopped_error());
        }
        Ok(self.accounts.clone())
    }

    async fn block_number(&self) -> Result<u64, NetworkError> {
        let client = self.client().await?;
        with_client!(client, c => c.get_block_number().await.map_err(|e| e.to_string()))
            .map(|n| n.as_u64())
            .map_err(|e| NetworkError::request_failed("eth_blockNumber", &self.endpoint, e))
    }

    async fn balance(&self, address: Address) -> Result<U256, NetworkError> {
        let client = self.client().await?;
        with_client!(client, c => c.get_balance(address, None).await.map_err(|e| e.to_string()))
            .map_err(|e| NetworkError::request_failed("eth_getBalance", &self.endpoint, e))
    }

    async fn transaction_count(&self, address: Address) -> Result<U256, NetworkError> {
        let client = self.client().await?;
        with_client!(client, c => {
            c.get_transaction_count(address, None)
                .await
                .map_err(|e| e.to_string())
        })
        .map_err(|e| NetworkError::request_failed("eth_getTransactionCount", &self.endpoint, e))
    }

    async fn sign_transaction(&self, tx: &TypedTransaction) -> Result<Signature, CoreError> {
        if self.is_stopped() {
            return Err(self.stopped_error().into());
        }
        let mut tx = tx.clone();
        if tx.chain_id().is_none() {
            tx.set_chain_id(self.chain_id);
        }
        self.wallet.sign_transaction(&tx).await.map_err(|e| {
            WalletError::SigningFailed {
                reason: e.to_string(),
            }
            .into()
        })
    }

    async fn send_transaction(&self, tx: TypedTransaction) -> Result<TxHash, NetworkError> {
        let client = self.client().await?;
        with_client!(client, c => {
            c.send_transaction(tx, None)
                .await
                .map(|pending| pending.tx_hash())
                .map_err(|e| e.to_string())
        })
        .map_err(|e| NetworkError::request_failed("eth_sendRawTransaction", &self.endpoint, e))
    }

    async fn stop(&self) -> Result<(), CoreError> {
        let connection = self.connection.lock().await.take();
        self.stopped.store(true, Ordering::SeqCst);

        match connection {
            Some(Connection { client, tracker }) => {
                drop(client);
                tracker.shutdown().await?;
                info!(endpoint = %self.endpoint, "Provider stopped");
                Ok(())
            }
            None => {
                debug!(endpoint = %self.endpoint, "Provider already stopped");
                Ok(())
            }
        }
    }
}

impl Drop for EthersWalletProvider {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.get_mut().take() {
            warn!(
                endpoint = %self.endpoint,
                "Provider dropped without stop(); cancelling block tracker"
            );
            connection.tracker.cancel();
        }
    }
}

fn http_provider(url: Url, options: &ProviderOptions) -> Result<Provider<Http>, ConnectionError> {
    let http_client = reqwest::Client::builder()
        .timeout(options.request_timeout())
        .build()
        .map_err(|e| ConnectionError::ClientBuild {
            reason: e.to_string(),
        })?;

    Ok(Provider::new(Http::new_with_client(url, http_client)).interval(options.polling_interval()))
}

/// Complete the WebSocket handshake within the request timeout.
async fn ws_provider(
    url: &Url,
    endpoint: &str,
    options: &ProviderOptions,
) -> Result<Provider<Ws>, ConnectionError> {
    let ws = tokio::time::timeout(options.request_timeout(), Ws::connect(url.as_str()))
        .await
        .map_err(|_| ConnectionError::Unreachable {
            endpoint: endpoint.to_string(),
            reason: format!("handshake timed out after {}ms", options.request_timeout_ms),
        })?
        .map_err(|e| ConnectionError::Unreachable {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    Ok(Provider::new(ws).interval(options.polling_interval()))
}

/// `eth_chainId`, rejected when the answer does not fit EIP-155's `u64`.
async fn fetch_chain_id<T: JsonRpcClient>(
    provider: &Provider<T>,
    endpoint: &str,
) -> Result<u64, ConnectionError> {
    let chain_id = provider
        .get_chainid()
        .await
        .map_err(|e| ConnectionError::Unreachable {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    if chain_id > U256::from(u64::MAX) {
        return Err(ConnectionError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: format!("chain id {} does not fit in 64 bits", chain_id),
        });
    }
    Ok(chain_id.as_u64())
}
