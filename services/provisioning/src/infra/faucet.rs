use std::time::Duration;

use anyhow::anyhow;
use reqwest::Client;

use crate::domain::repository::AccountFunding;
use crate::domain::types::{FRIENDBOT_URL, FundingOutcome};
use crate::error::ProvisioningError;

/// Friendbot-style faucet: `POST {url}?addr=<G…>`.
#[derive(Clone)]
pub struct FriendbotFunder {
    client: Client,
    /// `None` on networks without a faucet.
    url: Option<String>,
}

impl FriendbotFunder {
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self, ProvisioningError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProvisioningError::Internal(e.into()))?;
        Ok(Self { client, url })
    }
}

/// Friendbot rejects a second funding with `op_already_exists`.
fn is_already_funded(body: &str) -> bool {
    let body = body.to_ascii_lowercase();
    body.contains("op_already_exists")
        || body.contains("createaccountalreadyexist")
        || body.contains("already funded")
}

impl AccountFunding for FriendbotFunder {
    async fn fund(&self, public_key: &str) -> Result<FundingOutcome, ProvisioningError> {
        let url = self
            .url
            .as_deref()
            .ok_or(ProvisioningError::ConfigMissing { var: FRIENDBOT_URL })?;
        let mut url = reqwest::Url::parse(url)
            .map_err(|_| ProvisioningError::ConfigMissing { var: FRIENDBOT_URL })?;
        url.query_pairs_mut().append_pair("addr", public_key);
        let resp = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| {
                ProvisioningError::FundingServiceUnavailable(anyhow!(e).context("friendbot request"))
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(FundingOutcome::Funded);
        }
        let body = resp.text().await.unwrap_or_default();
        if status.is_client_error() && is_already_funded(&body) {
            return Ok(FundingOutcome::AlreadyFunded);
        }
        Err(ProvisioningError::FundingServiceUnavailable(anyhow!(
            "friendbot returned {status}"
        )))
    }
}
