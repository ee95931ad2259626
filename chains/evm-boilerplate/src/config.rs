use config::{Config, Environment, Map};
use core_logic::{ConfigError, ProviderOptions, WalletConfig};
use serde::Deserialize;

/// Raw variables as read from the environment. Deliberately not `Debug`.
#[derive(Default, Deserialize)]
struct EnvSettings {
    private_key: Option<String>,
    provider: Option<String>,
    polling_interval_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    address_index: Option<u32>,
    num_addresses: Option<u32>,
}

impl EnvSettings {
    fn into_wallet_config(self) -> Result<WalletConfig, ConfigError> {
        let defaults = ProviderOptions::default();
        let options = ProviderOptions {
            polling_interval_ms: self
                .polling_interval_ms
                .unwrap_or(defaults.polling_interval_ms),
            request_timeout_ms: self
                .request_timeout_ms
                .unwrap_or(defaults.request_timeout_ms),
            address_index: self.address_index.unwrap_or(defaults.address_index),
            num_addresses: self.num_addresses.unwrap_or(defaults.num_addresses),
        };

        WalletConfig::from_parts(self.private_key, self.provider, options)
    }
}

/// Load the wallet config from `vars`, or from the process environment when
/// `None`. Call `dotenv()` first if a `.env` file should be honoured.
pub fn load_from(vars: Option<Map<String, String>>) -> Result<WalletConfig, ConfigError> {
    let settings: EnvSettings = Config::builder()
        .add_source(Environment::default().source(vars))
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| ConfigError::InvalidValue {
            field: "environment".to_string(),
            reason: e.to_string(),
        })?;

    settings.into_wallet_config()
}
