use core_logic::{
    ChainClient, ConnectionError, CoreError, EthersWalletProvider, NetworkError, ProviderOptions,
    WalletConfig, WalletError, WalletProvider,
};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{transaction::eip2718::TypedTransaction, Address, TransactionRequest, H256, U256};
use ethers::utils::{keccak256, rlp::Rlp};
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";
const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

fn dev_address() -> Address {
    DEV_ADDRESS.parse().unwrap()
}

fn config_for(secret: &str, endpoint: &str, options: ProviderOptions) -> WalletConfig {
    WalletConfig::from_parts(
        Some(secret.to_string()),
        Some(endpoint.to_string()),
        options,
    )
    .unwrap()
}

fn rpc_result(result: serde_json::Value) -> serde_json::Value {
    json!({ "jsonrpc": "2.0", "id": 0, "result": result })
}

/// A JSON-RPC node that knows `eth_chainId`, `eth_blockNumber` and `eth_getBalance`.
async fn dev_node(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("eth_chainId");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(rpc_result(json!("0x7a69")));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("eth_blockNumber");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(rpc_result(json!("0x10")));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("eth_getBalance");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(rpc_result(json!("0xde0b6b3a7640000")));
        })
        .await;
}

#[tokio::test]
async fn test_connect_lists_derived_account() {
    let server = MockServer::start_async().await;
    dev_node(&server).await;

    let config = config_for(DEV_KEY, &server.url("/"), ProviderOptions::default());
    let provider = EthersWalletProvider::connect(&config).await.unwrap();

    assert_eq!(provider.chain_id(), 31337);
    let accounts = provider.accounts().await.unwrap();
    assert!(!accounts.is_empty());
    assert!(accounts.contains(&dev_address()));

    provider.stop().await.unwrap();
}

#[tokio::test]
async fn test_chain_client_forwards_rpc_calls() {
    let server = MockServer::start_async().await;
    dev_node(&server).await;

    let config = config_for(DEV_KEY, &server.url("/"), ProviderOptions::default());
    let provider = Arc::new(EthersWalletProvider::connect(&config).await.unwrap());
    let client = ChainClient::new(provider.clone());

    assert_eq!(client.block_number().await.unwrap(), 16);
    let balance = client.balance(dev_address()).await.unwrap();
    assert_eq!(balance, ethers::utils::parse_ether(1).unwrap());

    provider.stop().await.unwrap();
}

#[tokio::test]
async fn test_transaction_count() {
    let server = MockServer::start_async().await;
    dev_node(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("eth_getTransactionCount")
                .body_contains(&DEV_ADDRESS.to_lowercase());
            then.status(200)
                .header("content-type", "application/json")
                .json_body(rpc_result(json!("0x5")));
        })
        .await;

    let config = config_for(DEV_KEY, &server.url("/"), ProviderOptions::default());
    let provider = Arc::new(EthersWalletProvider::connect(&config).await.unwrap());
    let client = ChainClient::new(provider.clone());

    assert_eq!(
        client.transaction_count(dev_address()).await.unwrap(),
        U256::from(5)
    );

    provider.stop().await.unwrap();
}

#[tokio::test]
async fn test_send_transaction_signs_locally_and_broadcasts() {
    let server = MockServer::start_async().await;
    dev_node(&server).await;
    for (method, result) in [
        ("eth_getTransactionCount", "0x5"),
        ("eth_gasPrice", "0x3b9aca00"),
        ("eth_estimateGas", "0x5208"),
    ] {
        server
            .mock_async(|when, then| {
                when.method(POST).body_contains(method);
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(rpc_result(json!(result)));
            })
            .await;
    }

    // Same request with every field the middleware fills in, signed offline.
    let recipient = Address::repeat_byte(0x22);
    let wallet = DEV_KEY.parse::<LocalWallet>().unwrap().with_chain_id(31337u64);
    let filled: TypedTransaction = TransactionRequest::new()
        .from(dev_address())
        .to(recipient)
        .value(1u64)
        .nonce(5u64)
        .gas_price(1_000_000_000u64)
        .gas(21_000u64)
        .chain_id(31337u64)
        .into();
    let raw = filled.rlp_signed(&wallet.sign_transaction_sync(&filled).unwrap());
    let tx_hash = H256::from(keccak256(&raw));

    let broadcast = server
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("eth_sendRawTransaction")
                .body_contains(&format!("0x{}", hex::encode(&raw)));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(rpc_result(json!(tx_hash)));
        })
        .await;

    let config = config_for(DEV_KEY, &server.url("/"), ProviderOptions::default());
    let provider = Arc::new(EthersWalletProvider::connect(&config).await.unwrap());
    let client = ChainClient::new(provider.clone());

    let tx: TypedTransaction = TransactionRequest::new().to(recipient).value(1u64).into();
    assert_eq!(client.send_transaction(tx).await.unwrap(), tx_hash);
    assert_eq!(broadcast.hits_async().await, 1);

    let (decoded, signature) = TypedTransaction::decode_signed(&Rlp::new(&raw)).unwrap();
    assert_eq!(decoded.chain_id(), Some(31337u64.into()));
    assert_eq!(signature.recover(decoded.sighash()).unwrap(), dev_address());

    provider.stop().await.unwrap();
}

#[tokio::test]
async fn test_mnemonic_derives_requested_accounts() {
    let server = MockServer::start_async().await;
    dev_node(&server).await;

    let options = ProviderOptions {
        num_addresses: 3,
        ..ProviderOptions::default()
    };
    let config = config_for(DEV_MNEMONIC, &server.url("/"), options);
    let provider = EthersWalletProvider::connect(&config).await.unwrap();

    let accounts = provider.accounts().await.unwrap();
    assert_eq!(accounts.len(), 3);
    assert_eq!(accounts[0], dev_address());

    provider.stop().await.unwrap();
}

#[tokio::test]
async fn test_calls_fail_after_stop() {
    let server = MockServer::start_async().await;
    dev_node(&server).await;

    let config = config_for(DEV_KEY, &server.url("/"), ProviderOptions::default());
    let provider = Arc::new(EthersWalletProvider::connect(&config).await.unwrap());
    let client = ChainClient::new(provider.clone());

    provider.stop().await.unwrap();
    assert!(provider.is_stopped());

    let err = client.list_accounts().await.unwrap_err();
    assert!(matches!(err, NetworkError::ProviderStopped { .. }));
    assert!(matches!(
        provider.block_number().await,
        Err(NetworkError::ProviderStopped { .. })
    ));

    let tx = TransactionRequest::new().to(dev_address()).value(1);
    assert!(client.sign_transaction(&tx.into()).await.is_err());
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let server = MockServer::start_async().await;
    dev_node(&server).await;

    let config = config_for(DEV_KEY, &server.url("/"), ProviderOptions::default());
    let provider = EthersWalletProvider::connect(&config).await.unwrap();

    provider.stop().await.unwrap();
    provider.stop().await.unwrap();
    assert!(provider.is_stopped());
}

#[tokio::test]
async fn test_block_tracker_polls_in_background() {
    let server = MockServer::start_async().await;
    dev_node(&server).await;

    let options = ProviderOptions {
        polling_interval_ms: 20,
        ..ProviderOptions::default()
    };
    let config = config_for(DEV_KEY, &server.url("/"), options);
    let provider = EthersWalletProvider::connect(&config).await.unwrap();

    let mut latest = None;
    for _ in 0..100 {
        latest = provider.latest_block().await;
        if latest.is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(latest, Some(16));

    provider.stop().await.unwrap();
    assert_eq!(provider.latest_block().await, None);
}

#[tokio::test]
async fn test_drop_without_stop_cancels_tracker() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("eth_chainId");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(rpc_result(json!("0x7a69")));
        })
        .await;
    let block_number = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("eth_blockNumber");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(rpc_result(json!("0x10")));
        })
        .await;

    let options = ProviderOptions {
        polling_interval_ms: 20,
        ..ProviderOptions::default()
    };
    let config = config_for(DEV_KEY, &server.url("/"), options);
    let provider = EthersWalletProvider::connect(&config).await.unwrap();

    for _ in 0..100 {
        if provider.latest_block().await.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(block_number.hits_async().await > 0);

    drop(provider);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = block_number.hits_async().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(block_number.hits_async().await, settled);
}

#[tokio::test]
async fn test_local_signing() {
    let server = MockServer::start_async().await;
    dev_node(&server).await;

    let config = config_for(DEV_KEY, &server.url("/"), ProviderOptions::default());
    let provider = EthersWalletProvider::connect(&config).await.unwrap();

    let tx: TypedTransaction = TransactionRequest::new()
        .to(Address::repeat_byte(0x22))
        .value(1u64)
        .nonce(0u64)
        .gas(21_000u64)
        .gas_price(1u64)
        .into();
    let signature = provider.sign_transaction(&tx).await.unwrap();
    let mut signed = tx.clone();
    signed.set_chain_id(31337u64);
    assert_eq!(signature.recover(signed.sighash()).unwrap(), dev_address());

    provider.stop().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let config = config_for(DEV_KEY, "http://127.0.0.1:1", ProviderOptions::default());
    let err = EthersWalletProvider::connect(&config).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::Connection(ConnectionError::Unreachable { .. })
    ));
}

#[tokio::test]
async fn test_malformed_endpoint() {
    let config = config_for(DEV_KEY, "not a url", ProviderOptions::default());
    let err = EthersWalletProvider::connect(&config).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::Connection(ConnectionError::InvalidEndpoint { .. })
    ));
}

#[tokio::test]
async fn test_unknown_scheme_rejected() {
    let config = config_for(DEV_KEY, "ftp://127.0.0.1:8545", ProviderOptions::default());
    let err = EthersWalletProvider::connect(&config).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::Connection(ConnectionError::UnsupportedScheme { scheme }) if scheme == "ftp"
    ));
}

#[tokio::test]
async fn test_oversized_chain_id_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("eth_chainId");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(rpc_result(json!("0x10000000000000000")));
        })
        .await;

    let config = config_for(DEV_KEY, &server.url("/"), ProviderOptions::default());
    let err = EthersWalletProvider::connect(&config).await.unwrap_err();

    match err {
        CoreError::Connection(ConnectionError::InvalidResponse { reason, .. }) => {
            assert!(reason.contains("64 bits"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_bad_key_never_reaches_endpoint() {
    let server = MockServer::start_async().await;
    let any_call = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(rpc_result(json!("0x1")));
        })
        .await;

    let config = config_for("0xdeadbeef", &server.url("/"), ProviderOptions::default());
    let err = EthersWalletProvider::connect(&config).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::Wallet(WalletError::InvalidKeyLength { length: 8 })
    ));
    assert_eq!(any_call.hits_async().await, 0);
}

/// Runs against a real node, e.g. `anvil`:
/// `TEST_PROVIDER=http://127.0.0.1:8545 cargo test -- --ignored`
#[tokio::test]
#[ignore]
async fn test_live_node_lists_accounts() {
    let endpoint =
        std::env::var("TEST_PROVIDER").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string());
    let config = config_for(DEV_KEY, &endpoint, ProviderOptions::default());
    let provider = EthersWalletProvider::connect(&config).await.unwrap();

    let accounts = provider.accounts().await.unwrap();
    assert!(accounts.contains(&dev_address()));
    provider.stop().await.unwrap();
}
