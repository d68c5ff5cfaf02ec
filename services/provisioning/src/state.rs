use std::sync::Arc;

use sea_orm::DatabaseConnection;

use aidwallet_core::retry::RetryPolicy;
use aidwallet_domain::network::Network;
use aidwallet_session_types::cookie::CookieOptions;

use crate::domain::types::DeployDefaults;
use crate::infra::cipher::SecretCipher;
use crate::infra::db::DbUserStore;
use crate::infra::faucet::FriendbotFunder;
use crate::infra::identity::HttpIdentityProvider;
use crate::infra::rpc::RpcChainClient;
use crate::usecase::deploy::DeployContractUseCase;
use crate::usecase::fund::FundAccountUseCase;
use crate::usecase::keypair::IssueKeypairUseCase;
use crate::usecase::onboarding::OnboardingUseCase;
use crate::usecase::session::SyncSessionUseCase;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub identity: HttpIdentityProvider,
    pub chain: RpcChainClient,
    pub funder: FriendbotFunder,
    pub cipher: Option<SecretCipher>,
    pub network: Network,
    pub deploy_defaults: DeployDefaults,
    pub wasm: Option<Arc<Vec<u8>>>,
    pub retry: RetryPolicy,
    pub cookies: CookieOptions,
}

pub type Onboarding =
    OnboardingUseCase<DbUserStore, HttpIdentityProvider, RpcChainClient, FriendbotFunder>;

impl AppState {
    pub fn user_store(&self) -> DbUserStore {
        DbUserStore {
            db: self.db.clone(),
        }
    }

    pub fn sync_session(&self) -> SyncSessionUseCase<DbUserStore, HttpIdentityProvider> {
        SyncSessionUseCase {
            store: self.user_store(),
            identity: self.identity.clone(),
            retry: self.retry,
        }
    }

    pub fn issue_keypair(&self) -> IssueKeypairUseCase<DbUserStore> {
        IssueKeypairUseCase {
            store: self.user_store(),
            cipher: self.cipher.clone(),
        }
    }

    pub fn deploy_contract(&self) -> DeployContractUseCase<DbUserStore, RpcChainClient> {
        DeployContractUseCase {
            store: self.user_store(),
            chain: self.chain.clone(),
            defaults: self.deploy_defaults.clone(),
            network: self.network,
            wasm: self.wasm.clone(),
            retry: self.retry,
        }
    }

    pub fn fund_account(&self) -> FundAccountUseCase<DbUserStore, FriendbotFunder> {
        FundAccountUseCase {
            store: self.user_store(),
            funder: self.funder.clone(),
            retry: self.retry,
        }
    }

    pub fn onboarding(&self) -> Onboarding {
        OnboardingUseCase {
            sync: self.sync_session(),
            keys: self.issue_keypair(),
            deploy: self.deploy_contract(),
            fund: self.fund_account(),
        }
    }
}
