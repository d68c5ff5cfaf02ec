//! Cookie builders for the identity provider's session tokens.
//!
//! Both cookies are `HttpOnly`, `SameSite=Lax`, path `/`. They are rewritten
//! whenever the provider rotates the pair.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::session::RotatedTokens;

/// Cookie name for the bearer (session JWT).
pub const SESSION_JWT: &str = "session-jwt";

/// Cookie name for the refresh token.
pub const SESSION_REFRESH_TOKEN: &str = "session-refresh-token";

/// Attributes that vary per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CookieOptions {
    /// Emit the `Secure` attribute (HTTPS deployments).
    pub secure: bool,
}

fn session_cookie(name: &'static str, value: String, options: CookieOptions) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(options.secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Write whichever rotated tokens are present onto the jar.
///
/// ```
/// use axum_extra::extract::cookie::{CookieJar, SameSite};
/// use aidwallet_session_types::cookie::{
///     set_session_cookies, CookieOptions, SESSION_JWT, SESSION_REFRESH_TOKEN,
/// };
/// use aidwallet_session_types::session::RotatedTokens;
///
/// let rotated = RotatedTokens {
///     bearer: Some("jwt".to_string()),
///     refresh: Some("refresh".to_string()),
/// };
/// let jar = set_session_cookies(CookieJar::new(), &rotated, CookieOptions::default());
/// let bearer = jar.get(SESSION_JWT).unwrap();
/// assert_eq!(bearer.value(), "jwt");
/// assert_eq!(bearer.path(), Some("/"));
/// assert_eq!(bearer.same_site(), Some(SameSite::Lax));
/// assert!(bearer.http_only().unwrap_or(false));
/// assert_eq!(jar.get(SESSION_REFRESH_TOKEN).unwrap().value(), "refresh");
/// ```
pub fn set_session_cookies(
    jar: CookieJar,
    rotated: &RotatedTokens,
    options: CookieOptions,
) -> CookieJar {
    let mut jar = jar;
    if let Some(bearer) = &rotated.bearer {
        jar = jar.add(session_cookie(SESSION_JWT, bearer.clone(), options));
    }
    if let Some(refresh) = &rotated.refresh {
        jar = jar.add(session_cookie(SESSION_REFRESH_TOKEN, refresh.clone(), options));
    }
    jar
}

/// Clear both session cookies by setting Max-Age to 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use aidwallet_session_types::cookie::{
///     clear_session_cookies, CookieOptions, SESSION_JWT, SESSION_REFRESH_TOKEN,
/// };
///
/// let jar = clear_session_cookies(CookieJar::new(), CookieOptions::default());
/// let bearer = jar.get(SESSION_JWT).unwrap();
/// let refresh = jar.get(SESSION_REFRESH_TOKEN).unwrap();
/// assert_eq!(bearer.max_age(), Some(time::Duration::ZERO));
/// assert_eq!(refresh.max_age(), Some(time::Duration::ZERO));
/// assert_eq!(refresh.value(), "");
/// ```
pub fn clear_session_cookies(jar: CookieJar, options: CookieOptions) -> CookieJar {
    let mut bearer = session_cookie(SESSION_JWT, String::new(), options);
    bearer.set_max_age(Duration::ZERO);
    let mut refresh = session_cookie(SESSION_REFRESH_TOKEN, String::new(), options);
    refresh.set_max_age(Duration::ZERO);
    jar.add(bearer).add(refresh)
}
