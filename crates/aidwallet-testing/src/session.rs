//! Session cookie helpers for router tests.
//!
//! The provisioning service reads the identity provider's tokens from cookies.
//! `MockSession` produces the `Cookie` header a browser would send.

use axum::http::{HeaderMap, HeaderValue, header};

use aidwallet_session_types::cookie::{SESSION_JWT, SESSION_REFRESH_TOKEN};

/// Token pair a test request carries.
pub struct MockSession {
    pub bearer: Option<String>,
    pub refresh: Option<String>,
}

impl MockSession {
    pub fn new(bearer: &str, refresh: &str) -> Self {
        Self {
            bearer: Some(bearer.to_owned()),
            refresh: Some(refresh.to_owned()),
        }
    }

    /// A session that has lost its refresh token.
    pub fn without_refresh(bearer: &str) -> Self {
        Self {
            bearer: Some(bearer.to_owned()),
            refresh: None,
        }
    }

    /// Return the `Cookie` header value, or `None` when no token is set.
    pub fn cookie_value(&self) -> Option<String> {
        let mut pairs = Vec::new();
        if let Some(bearer) = &self.bearer {
            pairs.push(format!("{SESSION_JWT}={bearer}"));
        }
        if let Some(refresh) = &self.refresh {
            pairs.push(format!("{SESSION_REFRESH_TOKEN}={refresh}"));
        }
        (!pairs.is_empty()).then(|| pairs.join("; "))
    }

    /// Return headers as a browser holding these cookies would send them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(value) = self.cookie_value() {
            map.insert(header::COOKIE, HeaderValue::from_str(&value).unwrap());
        }
        map
    }
}
