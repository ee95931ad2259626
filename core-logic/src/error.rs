//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.
//!
//! None of the messages below ever carry signing material. Endpoints are
//! reported in their redacted `scheme://host[:port]` form.

use thiserror::Error;

/// Unified error type for core-logic operations.
///
/// This enum wraps all specific error types and provides a unified
/// error interface for the application layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Wallet(WalletError),

    #[error(transparent)]
    Connection(ConnectionError),

    #[error(transparent)]
    Network(NetworkError),

    #[error("Provider shutdown failed: {reason}")]
    Shutdown { reason: String },
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Config(e)
    }
}

impl From<WalletError> for CoreError {
    fn from(e: WalletError) -> Self {
        CoreError::Wallet(e)
    }
}

impl From<ConnectionError> for CoreError {
    fn from(e: ConnectionError) -> Self {
        CoreError::Connection(e)
    }
}

impl From<NetworkError> for CoreError {
    fn from(e: NetworkError) -> Self {
        CoreError::Network(e)
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or blank.
    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Signing secret errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Invalid private key format: expected hex string")]
    InvalidKeyFormat,

    #[error("Invalid private key length: expected 64 hex chars, got {length}")]
    InvalidKeyLength { length: usize },

    #[error("Invalid mnemonic phrase: {reason}")]
    InvalidMnemonic { reason: String },

    #[error("Transaction signing failed: {reason}")]
    SigningFailed { reason: String },
}

/// Provider construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Invalid RPC URL format: '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Unsupported RPC URL scheme '{scheme}' (expected http, https, ws or wss)")]
    UnsupportedScheme { scheme: String },

    #[error("Failed to build HTTP client: {reason}")]
    ClientBuild { reason: String },

    #[error("RPC endpoint {endpoint} is unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    /// The endpoint answered, but not with something usable.
    #[error("RPC endpoint {endpoint} returned an invalid response: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Network and RPC-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("RPC call '{method}' to {endpoint} failed: {reason}")]
    RequestFailed {
        method: String,
        endpoint: String,
        reason: String,
    },

    #[error("Provider for {endpoint} has been stopped")]
    ProviderStopped { endpoint: String },
}

impl NetworkError {
    pub fn request_failed(
        method: &str,
        endpoint: &str,
        reason: impl std::fmt::Display,
    ) -> Self {
        NetworkError::RequestFailed {
            method: method.to_string(),
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }
}
