//! JSON-RPC 2.0 client for the deployment node.
//!
//! The node holds the deployment signing identity, so requests name the source
//! account and never carry key material.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::domain::repository::ContractChain;
use crate::domain::types::InstantiateRequest;
use crate::error::ProvisioningError;

/// The source account does not exist on the network.
pub const ACCOUNT_NOT_FOUND: i64 = -32001;
/// The node has no signing identity for the source.
pub const IDENTITY_NOT_CONFIGURED: i64 = -32002;
/// No contract instance at the requested id.
pub const CONTRACT_NOT_FOUND: i64 = -32003;

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;
const SERVER_ERRORS: std::ops::RangeInclusive<i64> = -32099..=-32000;

#[derive(Clone)]
pub struct RpcChainClient {
    client: Client,
    endpoint: String,
    next_id: Arc<AtomicU64>,
}

impl RpcChainClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ProvisioningError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProvisioningError::Internal(e.into()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    async fn call<P, R>(&self, method: &'static str, params: P) -> Result<R, RpcFailure>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(anyhow!(e).context(method)))?;
        if !resp.status().is_success() {
            return Err(RpcFailure::Transport(anyhow!(
                "{method}: node returned {}",
                resp.status()
            )));
        }
        let body: RpcResponse<R> = resp
            .json()
            .await
            .map_err(|e| RpcFailure::Transport(anyhow!(e).context(method)))?;
        match (body.result, body.error) {
            (_, Some(error)) => Err(RpcFailure::Rpc {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RpcFailure::Transport(anyhow!("{method}: empty response"))),
        }
    }
}

#[derive(Serialize)]
struct RpcRequest<P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug)]
enum RpcFailure {
    Transport(anyhow::Error),
    Rpc { code: i64, message: String },
}

impl RpcFailure {
    fn is_missing_source(&self) -> bool {
        matches!(
            self,
            Self::Rpc { code, .. } if *code == ACCOUNT_NOT_FOUND || *code == IDENTITY_NOT_CONFIGURED
        )
    }

    fn into_error(self, source: &str) -> ProvisioningError {
        if self.is_missing_source() {
            return ProvisioningError::DeploySourceNotFound(source.to_owned());
        }
        match self {
            Self::Transport(e) => ProvisioningError::UpstreamUnavailable(e),
            Self::Rpc { code, message }
                if code == INTERNAL_ERROR || SERVER_ERRORS.contains(&code) =>
            {
                ProvisioningError::UpstreamUnavailable(anyhow!("rpc error {code}: {message}"))
            }
            // Malformed requests, bad params and contract-level rejections
            // fail the same way on every attempt.
            Self::Rpc { code, message } => {
                let class = match code {
                    PARSE_ERROR | INVALID_REQUEST => "malformed request",
                    METHOD_NOT_FOUND => "unsupported method",
                    INVALID_PARAMS => "invalid params",
                    _ => "rejected",
                };
                ProvisioningError::ChainRejected(format!("{class} ({code}): {message}"))
            }
        }
    }
}

// ── Params and results ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct GetAccountParams<'a> {
    account: &'a str,
}

#[derive(Serialize)]
struct UploadWasmParams<'a> {
    source: &'a str,
    /// Base64 of the wasm module.
    wasm: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadWasmResult {
    wasm_hash: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateContractParams<'a> {
    source: &'a str,
    wasm_hash: &'a str,
    /// Base64 of the 32-byte salt.
    salt: String,
    constructor_args: ConstructorArgs<'a>,
}

#[derive(Serialize)]
struct ConstructorArgs<'a> {
    user: &'a str,
    registry: &'a str,
    usdc: &'a str,
    defindex: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateContractResult {
    contract_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetContractParams<'a> {
    contract_id: &'a str,
}

impl ContractChain for RpcChainClient {
    async fn source_account_exists(&self, source: &str) -> Result<bool, ProvisioningError> {
        match self
            .call::<_, IgnoredAny>("getAccount", GetAccountParams { account: source })
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_missing_source() => Ok(false),
            Err(e) => Err(e.into_error(source)),
        }
    }

    async fn install_wasm(&self, source: &str, wasm: &[u8]) -> Result<String, ProvisioningError> {
        let result: UploadWasmResult = self
            .call(
                "uploadContractWasm",
                UploadWasmParams {
                    source,
                    wasm: BASE64.encode(wasm),
                },
            )
            .await
            .map_err(|e| e.into_error(source))?;
        Ok(result.wasm_hash)
    }

    async fn instantiate(
        &self,
        request: &InstantiateRequest,
    ) -> Result<String, ProvisioningError> {
        let result: CreateContractResult = self
            .call(
                "createCustomContract",
                CreateContractParams {
                    source: &request.source,
                    wasm_hash: &request.wasm_hash,
                    salt: BASE64.encode(request.salt),
                    constructor_args: ConstructorArgs {
                        user: &request.owner,
                        registry: &request.registry,
                        usdc: &request.usdc,
                        defindex: &request.defindex,
                    },
                },
            )
            .await
            .map_err(|e| e.into_error(&request.source))?;
        Ok(result.contract_id)
    }

    async fn contract_exists(&self, contract_id: &str) -> Result<bool, ProvisioningError> {
        match self
            .call::<_, IgnoredAny>("getContractInstance", GetContractParams { contract_id })
            .await
        {
            Ok(_) => Ok(true),
            Err(RpcFailure::Rpc { code, .. }) if code == CONTRACT_NOT_FOUND => Ok(false),
            Err(e) => Err(e.into_error(contract_id)),
        }
    }
}
