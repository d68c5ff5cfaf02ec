use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use aidwallet_core::config::{Config, ConfigError};
use aidwallet_core::retry::RetryPolicy;
use aidwallet_domain::network::{Network, UnknownNetwork};

use crate::domain::types::DeployDefaults;
use crate::infra::cipher::SecretCipher;
use crate::infra::stellar;

/// Provisioning service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct ProvisioningConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3120). Env var: `PROVISIONING_PORT`.
    #[serde(default = "default_port")]
    pub provisioning_port: u16,
    /// Identity provider base URL.
    pub identity_api_url: String,
    /// Server-side API key for the identity provider.
    #[serde(deserialize_with = "secret")]
    pub identity_api_key: SecretString,
    /// Base64 of a 32-byte AES-256 key for secret custody.
    #[serde(default, deserialize_with = "optional_secret")]
    pub encryption_key: Option<SecretString>,
    #[serde(default)]
    pub registry_address: Option<String>,
    /// `C…` token contract, or `G…` USDC issuer.
    #[serde(default)]
    pub usdc_token_address: Option<String>,
    #[serde(default)]
    pub defindex_contract: Option<String>,
    /// Identity paying for deployments: a `G…` account or a name known to the RPC host.
    #[serde(default)]
    pub deploy_source_account: Option<String>,
    /// Wallet contract wasm, uploaded before each first deployment.
    #[serde(default)]
    pub wallet_wasm_path: Option<PathBuf>,
    #[serde(default = "default_network")]
    pub stellar_network: String,
    pub stellar_rpc_url: String,
    #[serde(default)]
    pub friendbot_url: Option<String>,
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default = "default_retry_initial_backoff_ms")]
    pub retry_initial_backoff_ms: u64,
    #[serde(default = "default_retry_max_backoff_ms")]
    pub retry_max_backoff_ms: u64,
    #[serde(default)]
    pub cookie_secure: bool,
}

impl Config for ProvisioningConfig {}

/// Checked runtime settings derived from [`ProvisioningConfig`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub network: Network,
    /// `None` when `ENCRYPTION_KEY` is unset or malformed.
    pub cipher: Option<SecretCipher>,
    pub deploy_defaults: DeployDefaults,
    pub friendbot_url: Option<String>,
    pub retry: RetryPolicy,
    pub upstream_timeout: Duration,
}

impl ProvisioningConfig {
    /// Validate everything that can be checked without I/O.
    ///
    /// A malformed encryption key is logged and treated as absent so the
    /// service can still sync and issue public keys.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let network: Network = self
            .stellar_network
            .parse()
            .map_err(|e: UnknownNetwork| ConfigError::invalid("STELLAR_NETWORK", e.to_string()))?;

        let cipher = match non_empty_secret(&self.encryption_key) {
            None => None,
            Some(key) => match SecretCipher::from_base64_key(key) {
                Ok(cipher) => Some(cipher),
                Err(e) => {
                    tracing::error!(error = %e, "ENCRYPTION_KEY is malformed; secret custody disabled");
                    None
                }
            },
        };

        check_address("REGISTRY_ADDRESS", &self.registry_address)?;
        check_address("USDC_TOKEN_ADDRESS", &self.usdc_token_address)?;
        check_address("DEFINDEX_CONTRACT", &self.defindex_contract)?;

        if self.retry_max_attempts == 0 {
            return Err(ConfigError::invalid("RETRY_MAX_ATTEMPTS", "must be at least 1"));
        }
        if self.retry_initial_backoff_ms > self.retry_max_backoff_ms {
            return Err(ConfigError::invalid(
                "RETRY_INITIAL_BACKOFF_MS",
                "must not exceed RETRY_MAX_BACKOFF_MS",
            ));
        }
        if self.upstream_timeout_secs == 0 {
            return Err(ConfigError::invalid("UPSTREAM_TIMEOUT_SECS", "must be positive"));
        }

        let friendbot_url = non_empty(&self.friendbot_url)
            .map(str::to_owned)
            .or_else(|| network.default_friendbot_url().map(str::to_owned));

        Ok(Settings {
            network,
            cipher,
            deploy_defaults: DeployDefaults {
                registry: non_empty(&self.registry_address).map(str::to_owned),
                usdc: non_empty(&self.usdc_token_address).map(str::to_owned),
                defindex: non_empty(&self.defindex_contract).map(str::to_owned),
                source: non_empty(&self.deploy_source_account).map(str::to_owned),
            },
            friendbot_url,
            retry: RetryPolicy {
                max_attempts: self.retry_max_attempts,
                initial_backoff: Duration::from_millis(self.retry_initial_backoff_ms),
                max_backoff: Duration::from_millis(self.retry_max_backoff_ms),
            },
            upstream_timeout: Duration::from_secs(self.upstream_timeout_secs),
        })
    }
}

fn check_address(var: &'static str, value: &Option<String>) -> Result<(), ConfigError> {
    match non_empty(value) {
        Some(v) if !stellar::is_address(v) => {
            Err(ConfigError::invalid(var, "not a Stellar account or contract address"))
        }
        _ => Ok(()),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn non_empty_secret(value: &Option<SecretString>) -> Option<&str> {
    value
        .as_ref()
        .map(|s| s.expose_secret().trim())
        .filter(|v| !v.is_empty())
}

fn secret<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
    String::deserialize(d).map(SecretString::from)
}

fn optional_secret<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SecretString>, D::Error> {
    Option::<String>::deserialize(d).map(|v| v.map(SecretString::from))
}

fn default_port() -> u16 {
    3120
}

fn default_network() -> String {
    "testnet".to_owned()
}

fn default_upstream_timeout_secs() -> u64 {
    15
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_initial_backoff_ms() -> u64 {
    200
}

fn default_retry_max_backoff_ms() -> u64 {
    5000
}
