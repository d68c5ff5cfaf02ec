use std::sync::Arc;

use sea_orm::Database;
use tracing::{info, warn};

use aidwallet_core::config::Config;
use aidwallet_core::tracing::init_tracing;
use aidwallet_session_types::cookie::CookieOptions;

use aidwallet_provisioning::config::ProvisioningConfig;
use aidwallet_provisioning::infra::faucet::FriendbotFunder;
use aidwallet_provisioning::infra::identity::HttpIdentityProvider;
use aidwallet_provisioning::infra::rpc::RpcChainClient;
use aidwallet_provisioning::router::build_router;
use aidwallet_provisioning::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing("info");

    let config = ProvisioningConfig::from_env();
    let settings = config.validate().expect("invalid provisioning config");

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let wasm = match &config.wallet_wasm_path {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .expect("failed to read wallet contract wasm");
            info!(path = %path.display(), size = bytes.len(), "loaded wallet contract wasm");
            Some(Arc::new(bytes))
        }
        None => {
            warn!("WALLET_WASM_PATH not set; contract deployment is disabled");
            None
        }
    };

    let identity = HttpIdentityProvider::new(
        &config.identity_api_url,
        config.identity_api_key,
        settings.upstream_timeout,
    )
    .expect("failed to build identity client");
    let chain = RpcChainClient::new(&config.stellar_rpc_url, settings.upstream_timeout)
        .expect("failed to build rpc client");
    let funder = FriendbotFunder::new(settings.friendbot_url, settings.upstream_timeout)
        .expect("failed to build faucet client");

    let state = AppState {
        db: Arc::new(db),
        identity,
        chain,
        funder,
        cipher: settings.cipher,
        network: settings.network,
        deploy_defaults: settings.deploy_defaults,
        wasm,
        retry: settings.retry,
        cookies: CookieOptions {
            secure: config.cookie_secure,
        },
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.provisioning_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!(network = ?settings.network, "provisioning service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
