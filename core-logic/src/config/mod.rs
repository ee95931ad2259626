use crate::error::ConfigError;
use crate::security::SigningSecret;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";
pub const PROVIDER_VAR: &str = "PROVIDER";

/// RPC endpoint address. `Debug` and [`EndpointUrl::redacted`] drop the
/// path and query, which is where hosted nodes put their API keys.
#[derive(Clone, PartialEq, Eq)]
pub struct EndpointUrl(String);

impl EndpointUrl {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn redacted(&self) -> String {
        match reqwest::Url::parse(&self.0) {
            Ok(url) => match (url.host_str(), url.port()) {
                (Some(host), Some(port)) => format!("{}://{}:{}", url.scheme(), host, port),
                (Some(host), None) => format!("{}://{}", url.scheme(), host),
                _ => format!("{}://", url.scheme()),
            },
            Err(_) => "<invalid url>".to_string(),
        }
    }
}

impl fmt::Debug for EndpointUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EndpointUrl").field(&self.redacted()).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOptions {
    pub polling_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub address_index: u32,
    pub num_addresses: u32,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            polling_interval_ms: 4_000,
            request_timeout_ms: 30_000,
            address_index: 0,
            num_addresses: 1,
        }
    }
}

impl ProviderOptions {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling_interval_ms == 0 {
            return Err(invalid("POLLING_INTERVAL_MS", "must be greater than zero"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("REQUEST_TIMEOUT_MS", "must be greater than zero"));
        }
        if self.num_addresses == 0 {
            return Err(invalid("NUM_ADDRESSES", "must be at least 1"));
        }
        Ok(())
    }
}

/// Everything needed to open a wallet provider, loaded once at startup.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub signing_secret: SigningSecret,
    pub endpoint: EndpointUrl,
    pub options: ProviderOptions,
}

impl WalletConfig {
    /// Build a config from raw variable values.
    ///
    /// Absent and blank values are both reported as a missing field, the
    /// private key first.
    pub fn from_parts(
        private_key: Option<String>,
        provider: Option<String>,
        options: ProviderOptions,
    ) -> Result<Self, ConfigError> {
        let signing_secret = private_key
            .map(SigningSecret::new)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing(PRIVATE_KEY_VAR))?;

        let endpoint = provider
            .map(EndpointUrl::new)
            .filter(|e| !e.as_str().is_empty())
            .ok_or_else(|| missing(PROVIDER_VAR))?;

        options.validate()?;

        Ok(Self {
            signing_secret,
            endpoint,
            options,
        })
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingField {
        field: field.to_string(),
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
