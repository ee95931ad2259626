//! # Core Logic - Wallet Provider Lifecycle
//!
//! Shared building blocks for scripts that sign and talk to an EVM node.
//! The one contract enforced here is the provider lifecycle: open once,
//! use through a [`ChainClient`], stop exactly once on every exit path.
//!
//! ## Modules
//!
//! - [`client`] - RPC facade bound to a wallet provider
//! - [`config`] - Explicit configuration model (secret, endpoint, options)
//! - [`error`] - Typed error handling with thiserror
//! - [`provider`] - ethers-backed wallet provider and block tracker
//! - [`security`] - Signing secret handling and wallet derivation
//! - [`session`] - Scoped acquisition guaranteeing teardown
//! - [`traits`] - Core trait definitions

pub mod client;
pub mod config;
pub mod error;
pub mod provider;
pub mod security;
pub mod session;
pub mod traits;
pub(crate) mod utils;

pub use client::ChainClient;
pub use config::{EndpointUrl, ProviderOptions, WalletConfig, PRIVATE_KEY_VAR, PROVIDER_VAR};
pub use error::{ConfigError, ConnectionError, CoreError, NetworkError, WalletError};
pub use provider::{BlockTracker, EthersWalletProvider};
pub use security::{SecretKind, SigningSecret};
pub use session::ProviderSession;
pub use traits::{Task, TaskResult, WalletProvider};

pub use utils::setup_logger;
