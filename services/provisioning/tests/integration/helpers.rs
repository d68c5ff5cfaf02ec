use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;

use aidwallet_core::retry::RetryPolicy;
use aidwallet_domain::id::UserId;
use aidwallet_domain::network::Network;
use aidwallet_domain::user::{AccountStatus, DeployStatus};

use aidwallet_provisioning::domain::repository::{
    AccountFunding, ContractChain, IdentityProvider, UserStore,
};
use aidwallet_provisioning::domain::types::{
    DeployDefaults, FundingOutcome, InstantiateRequest, ProviderProfile, ProviderSession,
    UserRecord,
};
use aidwallet_provisioning::error::ProvisioningError;
use aidwallet_provisioning::infra::cipher::SecretCipher;
use aidwallet_provisioning::infra::stellar;
use aidwallet_provisioning::usecase::deploy::DeployContractUseCase;
use aidwallet_provisioning::usecase::fund::FundAccountUseCase;
use aidwallet_provisioning::usecase::keypair::IssueKeypairUseCase;
use aidwallet_provisioning::usecase::onboarding::OnboardingUseCase;
use aidwallet_provisioning::usecase::session::SyncSessionUseCase;

pub const NETWORK: Network = Network::Testnet;
pub const EXTERNAL_ID: &str = "ext-user-1";
pub const EMAIL: &str = "patient@example.com";

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

pub fn test_cipher() -> SecretCipher {
    SecretCipher::from_base64_key(&BASE64.encode([7u8; 32])).unwrap()
}

/// Open a stored secret and return the account key it signs for.
pub fn account_of_sealed(sealed: &str) -> [u8; 32] {
    let secret = String::from_utf8(test_cipher().decrypt(sealed).unwrap()).unwrap();
    assert!(secret.starts_with('S'));
    let seed = stellar_strkey::ed25519::PrivateKey::from_string(&secret)
        .unwrap()
        .0;
    ed25519_dalek::SigningKey::from_bytes(&seed)
        .verifying_key()
        .to_bytes()
}

fn address() -> String {
    stellar::generate_keypair().public_key
}

/// Defaults with every address set. The source is a `G…` account so contract
/// ids are predictable.
pub fn full_defaults() -> DeployDefaults {
    DeployDefaults {
        registry: Some(address()),
        usdc: Some(address()),
        defindex: Some(address()),
        source: Some(address()),
    }
}

pub fn test_user(external_id: &str, email: &str) -> UserRecord {
    let now = Utc::now();
    UserRecord {
        id: UserId::generate(),
        external_id: external_id.to_owned(),
        email: email.to_owned(),
        public_key: None,
        secret_ciphertext: None,
        wallet_contract_id: None,
        deploy_status: DeployStatus::None,
        account_status: AccountStatus::None,
        created_at: now,
        updated_at: now,
    }
}

pub fn keyed_user() -> UserRecord {
    UserRecord {
        public_key: Some(address()),
        account_status: AccountStatus::Created,
        ..test_user(EXTERNAL_ID, EMAIL)
    }
}

pub fn deployed_user() -> UserRecord {
    UserRecord {
        wallet_contract_id: Some(stellar::predict_contract_id(NETWORK, &address(), &[1u8; 32]).unwrap()),
        deploy_status: DeployStatus::Deployed,
        ..keyed_user()
    }
}

// ── MemoryUserStore ──────────────────────────────────────────────────────────

/// In-memory store with the same single-winner semantics as the database.
/// Each call yields first so concurrent callers interleave.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    pub users: Arc<Mutex<HashMap<UserId, UserRecord>>>,
    pub writes: Arc<AtomicU32>,
}

impl MemoryUserStore {
    pub fn new(users: Vec<UserRecord>) -> Self {
        let store = Self::default();
        {
            let mut map = store.users.lock().unwrap();
            for user in users {
                map.insert(user.id, user);
            }
        }
        store
    }

    pub fn get(&self, id: UserId) -> Option<UserRecord> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    fn update<F>(&self, id: UserId, apply: F) -> bool
    where
        F: FnOnce(&mut UserRecord) -> bool,
    {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(&id) else {
            return false;
        };
        if !apply(user) {
            return false;
        }
        user.updated_at = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        true
    }
}

impl UserStore for MemoryUserStore {
    async fn upsert_by_external_id(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<UserRecord, ProvisioningError> {
        tokio::task::yield_now().await;
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.values_mut().find(|u| u.external_id == external_id) {
            user.email = email.to_owned();
            user.updated_at = Utc::now();
            return Ok(user.clone());
        }
        let user = test_user(external_id, email);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, ProvisioningError> {
        tokio::task::yield_now().await;
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ProvisioningError> {
        tokio::task::yield_now().await;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn set_public_key_if_absent(
        &self,
        id: UserId,
        public_key: &str,
    ) -> Result<bool, ProvisioningError> {
        tokio::task::yield_now().await;
        Ok(self.update(id, |u| {
            if u.public_key.is_some() || u.account_status != AccountStatus::None {
                return false;
            }
            u.public_key = Some(public_key.to_owned());
            u.account_status = AccountStatus::Created;
            true
        }))
    }

    async fn set_secret_ciphertext_if_absent(
        &self,
        id: UserId,
        public_key: &str,
        ciphertext: &str,
    ) -> Result<bool, ProvisioningError> {
        tokio::task::yield_now().await;
        Ok(self.update(id, |u| {
            if u.public_key.as_deref() != Some(public_key) || u.secret_ciphertext.is_some() {
                return false;
            }
            u.secret_ciphertext = Some(ciphertext.to_owned());
            true
        }))
    }

    async fn set_wallet_contract_if_absent(
        &self,
        id: UserId,
        contract_id: &str,
    ) -> Result<bool, ProvisioningError> {
        tokio::task::yield_now().await;
        Ok(self.update(id, |u| {
            if u.public_key.is_none() || u.wallet_contract_id.is_some() {
                return false;
            }
            u.wallet_contract_id = Some(contract_id.to_owned());
            u.deploy_status = DeployStatus::Deployed;
            true
        }))
    }

    async fn advance_account_status(
        &self,
        id: UserId,
        status: AccountStatus,
    ) -> Result<bool, ProvisioningError> {
        tokio::task::yield_now().await;
        Ok(self.update(id, |u| {
            if u.public_key.is_none() || !status.predecessors().contains(&u.account_status) {
                return false;
            }
            u.account_status = status;
            true
        }))
    }
}

// ── FakeIdentity ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeIdentity {
    pub external_id: String,
    pub email: Option<String>,
    /// Tokens handed back on refresh, if the provider rotates.
    pub rotate_to: Option<(String, String)>,
    /// Refresh tokens the provider rejects.
    pub revoked: Vec<String>,
    /// Profile fetches that fail before one succeeds.
    pub profile_failures: Arc<AtomicU32>,
    pub refresh_calls: Arc<AtomicU32>,
    pub profile_calls: Arc<AtomicU32>,
}

impl FakeIdentity {
    pub fn new(external_id: &str, email: &str) -> Self {
        Self {
            external_id: external_id.to_owned(),
            email: Some(email.to_owned()),
            rotate_to: None,
            revoked: vec![],
            profile_failures: Arc::new(AtomicU32::new(0)),
            refresh_calls: Arc::new(AtomicU32::new(0)),
            profile_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn rotating(mut self, bearer: &str, refresh: &str) -> Self {
        self.rotate_to = Some((bearer.to_owned(), refresh.to_owned()));
        self
    }

    pub fn without_email(mut self) -> Self {
        self.email = None;
        self
    }

    pub fn failing_profile(self, times: u32) -> Self {
        self.profile_failures.store(times, Ordering::SeqCst);
        self
    }
}

impl IdentityProvider for FakeIdentity {
    async fn refresh_session(
        &self,
        _bearer: Option<&str>,
        refresh: &str,
    ) -> Result<ProviderSession, ProvisioningError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.revoked.iter().any(|r| r == refresh) {
            return Err(ProvisioningError::Unauthenticated);
        }
        let (bearer, refresh) = match &self.rotate_to {
            Some((b, r)) => (Some(b.clone()), Some(r.clone())),
            None => (None, None),
        };
        Ok(ProviderSession {
            external_id: self.external_id.clone(),
            bearer,
            refresh,
        })
    }

    async fn fetch_profile(&self, _external_id: &str) -> Result<ProviderProfile, ProvisioningError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .profile_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ProvisioningError::UpstreamUnavailable(anyhow::anyhow!(
                "profile endpoint timed out"
            )));
        }
        Ok(ProviderProfile {
            email: self.email.clone(),
        })
    }
}

// ── FakeChain ────────────────────────────────────────────────────────────────

/// Chain node double. Contract ids are derived the way the network derives
/// them, so adoption of a landed instantiation can be exercised.
#[derive(Clone)]
pub struct FakeChain {
    pub source_exists: bool,
    pub deployed: Arc<Mutex<HashSet<String>>>,
    pub source_lookups: Arc<AtomicU32>,
    pub installs: Arc<AtomicU32>,
    pub instantiations: Arc<AtomicU32>,
    /// Instantiations that land on chain but report a timeout to the caller.
    pub lost_responses: Arc<AtomicU32>,
    /// Instantiations that fail without landing.
    pub failures: Arc<AtomicU32>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self {
            source_exists: true,
            deployed: Arc::default(),
            source_lookups: Arc::default(),
            installs: Arc::default(),
            instantiations: Arc::default(),
            lost_responses: Arc::default(),
            failures: Arc::default(),
        }
    }
}

impl FakeChain {
    pub fn without_source() -> Self {
        Self {
            source_exists: false,
            ..Self::default()
        }
    }

    pub fn losing_responses(self, times: u32) -> Self {
        self.lost_responses.store(times, Ordering::SeqCst);
        self
    }

    pub fn failing(self, times: u32) -> Self {
        self.failures.store(times, Ordering::SeqCst);
        self
    }

    /// Calls that touch the chain, lookups excluded.
    pub fn side_effects(&self) -> u32 {
        self.installs.load(Ordering::SeqCst) + self.instantiations.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> u32 {
        self.side_effects() + self.source_lookups.load(Ordering::SeqCst)
    }

    pub fn deployed_count(&self) -> usize {
        self.deployed.lock().unwrap().len()
    }
}

fn take(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl ContractChain for FakeChain {
    async fn source_account_exists(&self, _source: &str) -> Result<bool, ProvisioningError> {
        self.source_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.source_exists)
    }

    async fn install_wasm(&self, _source: &str, wasm: &[u8]) -> Result<String, ProvisioningError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{:064x}", wasm.len()))
    }

    async fn instantiate(&self, request: &InstantiateRequest) -> Result<String, ProvisioningError> {
        let n = self.instantiations.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if take(&self.failures) {
            return Err(ProvisioningError::UpstreamUnavailable(anyhow::anyhow!(
                "rpc node unreachable"
            )));
        }
        let contract_id = stellar::predict_contract_id(NETWORK, &request.source, &request.salt)
            .unwrap_or_else(|| format!("contract-{n}"));
        self.deployed.lock().unwrap().insert(contract_id.clone());
        if take(&self.lost_responses) {
            return Err(ProvisioningError::UpstreamUnavailable(anyhow::anyhow!(
                "rpc response timed out"
            )));
        }
        Ok(contract_id)
    }

    async fn contract_exists(&self, contract_id: &str) -> Result<bool, ProvisioningError> {
        Ok(self.deployed.lock().unwrap().contains(contract_id))
    }
}

// ── FakeFunder ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeFunder {
    pub funded: Arc<Mutex<HashSet<String>>>,
    pub calls: Arc<AtomicU32>,
    /// Calls that fail before the faucet recovers.
    pub failures: Arc<AtomicU32>,
}

impl FakeFunder {
    pub fn failing(self, times: u32) -> Self {
        self.failures.store(times, Ordering::SeqCst);
        self
    }

    /// Simulate an account the network already knows about.
    pub fn with_funded(self, public_key: &str) -> Self {
        self.funded.lock().unwrap().insert(public_key.to_owned());
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AccountFunding for FakeFunder {
    async fn fund(&self, public_key: &str) -> Result<FundingOutcome, ProvisioningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if take(&self.failures) {
            return Err(ProvisioningError::FundingServiceUnavailable(anyhow::anyhow!(
                "faucet returned 503"
            )));
        }
        if self.funded.lock().unwrap().insert(public_key.to_owned()) {
            Ok(FundingOutcome::Funded)
        } else {
            Ok(FundingOutcome::AlreadyFunded)
        }
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

/// Shared fakes from which each use case is assembled, so every step of a run
/// sees the same store and the same chain.
#[derive(Clone)]
pub struct Harness {
    pub store: MemoryUserStore,
    pub identity: FakeIdentity,
    pub chain: FakeChain,
    pub funder: FakeFunder,
    pub cipher: Option<SecretCipher>,
    pub defaults: DeployDefaults,
    pub wasm: Option<Arc<Vec<u8>>>,
}

impl Harness {
    pub fn new(store: MemoryUserStore) -> Self {
        Self {
            store,
            identity: FakeIdentity::new(EXTERNAL_ID, EMAIL),
            chain: FakeChain::default(),
            funder: FakeFunder::default(),
            cipher: Some(test_cipher()),
            defaults: full_defaults(),
            wasm: Some(Arc::new(b"\0asm\x01\0\0\0wallet".to_vec())),
        }
    }

    pub fn empty() -> Self {
        Self::new(MemoryUserStore::default())
    }

    pub fn sync(&self) -> SyncSessionUseCase<MemoryUserStore, FakeIdentity> {
        SyncSessionUseCase {
            store: self.store.clone(),
            identity: self.identity.clone(),
            retry: fast_retry(),
        }
    }

    pub fn keys(&self) -> IssueKeypairUseCase<MemoryUserStore> {
        IssueKeypairUseCase {
            store: self.store.clone(),
            cipher: self.cipher.clone(),
        }
    }

    pub fn deploy(&self) -> DeployContractUseCase<MemoryUserStore, FakeChain> {
        DeployContractUseCase {
            store: self.store.clone(),
            chain: self.chain.clone(),
            defaults: self.defaults.clone(),
            network: NETWORK,
            wasm: self.wasm.clone(),
            retry: fast_retry(),
        }
    }

    pub fn fund(&self) -> FundAccountUseCase<MemoryUserStore, FakeFunder> {
        FundAccountUseCase {
            store: self.store.clone(),
            funder: self.funder.clone(),
            retry: fast_retry(),
        }
    }

    pub fn onboarding(
        &self,
    ) -> OnboardingUseCase<MemoryUserStore, FakeIdentity, FakeChain, FakeFunder> {
        OnboardingUseCase {
            sync: self.sync(),
            keys: self.keys(),
            deploy: self.deploy(),
            fund: self.fund(),
        }
    }
}
