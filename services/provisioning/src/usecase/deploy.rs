//! Wallet contract deployment.
//!
//! Installs the wallet wasm, then instantiates a contract bound to the user's
//! key with a fresh salt per attempt. Before each retry, and once more after
//! the last attempt fails, the ids predicted for earlier attempts are checked
//! on chain, so a timed-out instantiation that actually landed is adopted and
//! recorded instead of deployed twice.

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tracing::{error, info, warn};

use aidwallet_core::retry::{RetryPolicy, with_retry};
use aidwallet_domain::id::UserId;
use aidwallet_domain::network::Network;

use crate::domain::repository::{ContractChain, UserStore};
use crate::domain::types::{
    DEFINDEX_CONTRACT, DEPLOY_SOURCE_ACCOUNT, DeployDefaults, DeployOverrides, InstantiateRequest,
    REGISTRY_ADDRESS, USDC_TOKEN_ADDRESS, UserRecord, WALLET_WASM_PATH,
};
use crate::error::ProvisioningError;
use crate::infra::stellar;

/// How the caller names the user to deploy for.
#[derive(Debug, Clone)]
pub enum UserLookup {
    Id(UserId),
    Email(String),
}

pub struct DeployInput {
    pub user: UserLookup,
    /// When set, must equal the stored public key.
    pub public_key: Option<String>,
    pub overrides: DeployOverrides,
}

#[derive(Debug)]
pub struct DeployOutput {
    pub user: UserRecord,
    pub contract_id: String,
    /// Whether this call created the contract on record.
    pub deployed: bool,
}

pub struct DeployContractUseCase<S: UserStore, C: ContractChain> {
    pub store: S,
    pub chain: C,
    pub defaults: DeployDefaults,
    pub network: Network,
    /// Wallet contract wasm; `None` when `WALLET_WASM_PATH` is unset.
    pub wasm: Option<Arc<Vec<u8>>>,
    pub retry: RetryPolicy,
}

/// Addresses a deployment is bound to, after overrides and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddresses {
    pub registry: String,
    pub usdc: String,
    pub defindex: String,
    pub source: String,
}

#[derive(Default)]
struct Attempts {
    count: u32,
    /// Ids predicted for earlier attempts whose outcome is unknown.
    predicted: Vec<String>,
}

impl<S: UserStore, C: ContractChain> DeployContractUseCase<S, C> {
    pub async fn execute(&self, input: DeployInput) -> Result<DeployOutput, ProvisioningError> {
        let user = self.find(&input.user).await?;
        let owner = user
            .public_key
            .clone()
            .ok_or(ProvisioningError::PublicKeyRequired)?;
        if let Some(expected) = input.public_key.as_deref() {
            if expected.trim() != owner {
                return Err(ProvisioningError::PublicKeyMismatch);
            }
        }
        if let Some(contract_id) = user.wallet_contract_id.clone() {
            return Ok(DeployOutput {
                user,
                contract_id,
                deployed: false,
            });
        }

        let addresses = self.resolve(&input.overrides)?;
        let wasm = self
            .wasm
            .clone()
            .ok_or(ProvisioningError::ConfigMissing {
                var: WALLET_WASM_PATH,
            })?;
        let source = addresses.source.as_str();

        let source_exists = with_retry(&self.retry, "look up deploy source", || {
            self.chain.source_account_exists(source)
        })
        .await?;
        if !source_exists {
            return Err(ProvisioningError::DeploySourceNotFound(source.to_owned()));
        }

        let wasm_hash = with_retry(&self.retry, "install wallet wasm", || {
            self.chain.install_wasm(source, &wasm)
        })
        .await?;

        let template = InstantiateRequest {
            source: addresses.source.clone(),
            wasm_hash,
            salt: [0u8; 32],
            owner,
            registry: addresses.registry,
            usdc: addresses.usdc,
            defindex: addresses.defindex,
        };
        let attempts = Mutex::new(Attempts::default());
        let instantiated = with_retry(&self.retry, "instantiate wallet contract", || {
            self.instantiate_once(user.id, &template, &attempts)
        })
        .await;
        let contract_id = match instantiated {
            Ok(contract_id) => contract_id,
            Err(e) => {
                let predicted = attempts
                    .into_inner()
                    .unwrap_or_else(|e| e.into_inner())
                    .predicted;
                match self.find_landed(user.id, &predicted).await {
                    Some(contract_id) => contract_id,
                    None => {
                        error!(
                            user_id = %user.id,
                            ?predicted,
                            error = %e,
                            "instantiation failed with unresolved outcome, check predicted ids before redeploying"
                        );
                        return Err(e);
                    }
                }
            }
        };

        self.record(user.id, contract_id).await
    }

    /// Resolve addresses from call overrides first, then process defaults.
    pub fn resolve(&self, overrides: &DeployOverrides) -> Result<ResolvedAddresses, ProvisioningError> {
        let registry = pick(&overrides.registry, &self.defaults.registry)
            .filter(|v| stellar::is_address(v))
            .ok_or(ProvisioningError::ConfigMissing {
                var: REGISTRY_ADDRESS,
            })?;
        let usdc = pick(&overrides.usdc, &self.defaults.usdc)
            .and_then(|v| stellar::resolve_stable_asset(self.network, v))
            .ok_or(ProvisioningError::ConfigMissing {
                var: USDC_TOKEN_ADDRESS,
            })?;
        let defindex = pick(&overrides.defindex, &self.defaults.defindex)
            .filter(|v| stellar::is_address(v))
            .ok_or(ProvisioningError::ConfigMissing {
                var: DEFINDEX_CONTRACT,
            })?;
        let source = pick(&overrides.source, &self.defaults.source).ok_or(
            ProvisioningError::ConfigMissing {
                var: DEPLOY_SOURCE_ACCOUNT,
            },
        )?;
        Ok(ResolvedAddresses {
            registry: registry.to_owned(),
            usdc,
            defindex: defindex.to_owned(),
            source: source.to_owned(),
        })
    }

    async fn find(&self, lookup: &UserLookup) -> Result<UserRecord, ProvisioningError> {
        let user = match lookup {
            UserLookup::Id(id) => self.store.find_by_id(*id).await?,
            UserLookup::Email(email) => self.store.find_by_email(email.trim()).await?,
        };
        user.ok_or(ProvisioningError::UserNotFound)
    }

    async fn instantiate_once(
        &self,
        user_id: UserId,
        template: &InstantiateRequest,
        attempts: &Mutex<Attempts>,
    ) -> Result<String, ProvisioningError> {
        let (attempt, earlier) = {
            let mut state = attempts.lock().unwrap_or_else(|e| e.into_inner());
            state.count += 1;
            (state.count, state.predicted.clone())
        };

        for candidate in earlier {
            if self.chain.contract_exists(&candidate).await? {
                warn!(%user_id, contract_id = %candidate, "earlier instantiation landed, adopting it");
                return Ok(candidate);
            }
        }

        let mut request = template.clone();
        request.salt = stellar::random_salt();
        match stellar::predict_contract_id(self.network, &request.source, &request.salt) {
            Some(predicted) => {
                let mut state = attempts.lock().unwrap_or_else(|e| e.into_inner());
                state.predicted.push(predicted);
            }
            None if attempt > 1 => error!(
                %user_id,
                source = %request.source,
                attempt,
                "retrying instantiation without a predictable contract id, duplicate deployment possible"
            ),
            None => {}
        }

        self.chain.instantiate(&request).await
    }

    /// Look for any predicted id that landed despite a failed response.
    async fn find_landed(&self, user_id: UserId, predicted: &[String]) -> Option<String> {
        for candidate in predicted {
            let exists = with_retry(&self.retry, "check predicted contract", || {
                self.chain.contract_exists(candidate)
            })
            .await;
            match exists {
                Ok(true) => {
                    warn!(%user_id, contract_id = %candidate, "failed instantiation landed, adopting it");
                    return Some(candidate.clone());
                }
                Ok(false) => {}
                Err(e) => {
                    error!(%user_id, contract_id = %candidate, error = %e, "predicted contract not checked")
                }
            }
        }
        None
    }

    async fn record(
        &self,
        user_id: UserId,
        contract_id: String,
    ) -> Result<DeployOutput, ProvisioningError> {
        let won = match with_retry(&self.retry, "record wallet contract", || {
            self.store.set_wallet_contract_if_absent(user_id, &contract_id)
        })
        .await
        {
            Ok(won) => won,
            Err(e) => {
                error!(%user_id, contract_id = %contract_id, error = %e, "deployed contract not recorded");
                return Err(e);
            }
        };

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(ProvisioningError::UserNotFound)?;
        if won {
            info!(%user_id, contract_id = %contract_id, "wallet contract deployed");
            return Ok(DeployOutput {
                user,
                contract_id,
                deployed: true,
            });
        }

        let canonical = user
            .wallet_contract_id
            .clone()
            .ok_or_else(|| anyhow!("wallet contract missing after lost race"))?;
        warn!(
            %user_id,
            orphaned = %contract_id,
            canonical = %canonical,
            "lost deploy race, orphaned contract left on chain"
        );
        Ok(DeployOutput {
            user,
            contract_id: canonical,
            deployed: false,
        })
    }
}

fn pick<'a>(first: &'a Option<String>, fallback: &'a Option<String>) -> Option<&'a str> {
    [first, fallback]
        .into_iter()
        .filter_map(|v| v.as_deref().map(str::trim))
        .find(|v| !v.is_empty())
}
