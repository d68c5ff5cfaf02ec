//! HTTP client for the external identity provider.
//!
//! `POST {base}/sessions/refresh` validates (and may rotate) a session;
//! `GET {base}/users/{id}` returns the profile. Both carry the server API key.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::repository::IdentityProvider;
use crate::domain::types::{ProviderProfile, ProviderSession};
use crate::error::ProvisioningError;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    api_key: Arc<SecretString>,
}

impl HttpIdentityProvider {
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, ProvisioningError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProvisioningError::Internal(e.into()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: Arc::new(api_key),
        })
    }

    fn user_url(&self, external_id: &str) -> Result<reqwest::Url, ProvisioningError> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| anyhow!(e))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("identity api url cannot carry a path"))?
            .pop_if_empty()
            .push("users")
            .push(external_id);
        Ok(url)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    jwt: Option<&'a str>,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    user_id: Option<String>,
    jwt: Option<String>,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct ProfileResponse {
    email: Option<String>,
}

fn transport_error(e: reqwest::Error) -> ProvisioningError {
    ProvisioningError::UpstreamUnavailable(anyhow!(e).context("identity provider request"))
}

fn unexpected_status(status: StatusCode) -> ProvisioningError {
    ProvisioningError::UpstreamUnavailable(anyhow!("identity provider returned {status}"))
}

impl IdentityProvider for HttpIdentityProvider {
    async fn refresh_session(
        &self,
        bearer: Option<&str>,
        refresh: &str,
    ) -> Result<ProviderSession, ProvisioningError> {
        let resp = self
            .client
            .post(format!("{}/sessions/refresh", self.base_url))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&RefreshRequest {
                jwt: bearer,
                refresh_token: refresh,
            })
            .send()
            .await
            .map_err(transport_error)?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProvisioningError::Unauthenticated);
            }
            s => return Err(unexpected_status(s)),
        }

        let body: RefreshResponse = resp.json().await.map_err(transport_error)?;
        let external_id = body
            .user_id
            .filter(|id| !id.is_empty())
            .ok_or(ProvisioningError::Unauthenticated)?;
        Ok(ProviderSession {
            external_id,
            bearer: body.jwt,
            refresh: body.refresh_token,
        })
    }

    async fn fetch_profile(&self, external_id: &str) -> Result<ProviderProfile, ProvisioningError> {
        let resp = self
            .client
            .get(self.user_url(external_id)?)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(ProvisioningError::ProfileIncomplete),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProvisioningError::Unauthenticated);
            }
            s => return Err(unexpected_status(s)),
        }

        let body: ProfileResponse = resp.json().await.map_err(transport_error)?;
        Ok(ProviderProfile {
            email: body.email.filter(|e| !e.trim().is_empty()),
        })
    }
}
