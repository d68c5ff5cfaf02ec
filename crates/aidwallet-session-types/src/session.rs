//! Session token pair carried in cookies.

use std::convert::Infallible;
use std::fmt;

use axum::extract::FromRequestParts;
use axum_extra::extract::cookie::CookieJar;
use http::request::Parts;

use crate::cookie::{SESSION_JWT, SESSION_REFRESH_TOKEN};

/// Bearer + refresh pair issued by the identity provider.
///
/// Either half may be absent; the refresh token is what a sync requires.
/// Empty cookie values count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionTokens {
    pub bearer: Option<String>,
    pub refresh: Option<String>,
}

impl SessionTokens {
    pub fn new(bearer: Option<String>, refresh: Option<String>) -> Self {
        Self {
            bearer: bearer.filter(|v| !v.is_empty()),
            refresh: refresh.filter(|v| !v.is_empty()),
        }
    }

    pub fn from_jar(jar: &CookieJar) -> Self {
        Self::new(
            jar.get(SESSION_JWT).map(|c| c.value().to_owned()),
            jar.get(SESSION_REFRESH_TOKEN).map(|c| c.value().to_owned()),
        )
    }
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("bearer", &self.bearer.as_ref().map(|_| "[redacted]"))
            .field("refresh", &self.refresh.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Tokens the provider rotated during a sync. Callers must persist these
/// before the next call; the previous pair may already be invalid.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RotatedTokens {
    pub bearer: Option<String>,
    pub refresh: Option<String>,
}

impl RotatedTokens {
    /// Keep only values that differ from what the caller already holds.
    pub fn diff(previous: &SessionTokens, bearer: Option<String>, refresh: Option<String>) -> Self {
        Self {
            bearer: bearer.filter(|b| !b.is_empty() && previous.bearer.as_ref() != Some(b)),
            refresh: refresh.filter(|r| !r.is_empty() && previous.refresh.as_ref() != Some(r)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bearer.is_none() && self.refresh.is_none()
    }
}

impl fmt::Debug for RotatedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatedTokens")
            .field("bearer", &self.bearer.is_some())
            .field("refresh", &self.refresh.is_some())
            .finish()
    }
}

impl<S> FromRequestParts<S> for SessionTokens
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    // Read the cookies synchronously and hand back a 'static future; an
    // `async fn` here would capture `parts` and trip E0195 under axum-core 0.5.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let tokens = Self::from_jar(&CookieJar::from_headers(&parts.headers));
        async move { Ok(tokens) }
    }
}
