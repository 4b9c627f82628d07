//! Session bootstrap, request-scoped identity context, and session cookies.
//!
//! ARCHITECTURE
//! ============
//! Every page request is bootstrapped exactly once: the session cookies are
//! read, the gateway resolves them to an identity, and the result is frozen
//! into a `SessionContext` that handlers and renderers receive by value. The
//! identity sits behind an `Arc` and is never mutated, so every component of
//! one render pass sees the same snapshot even if the gateway changes
//! underneath.
//!
//! TRADE-OFFS
//! ==========
//! Bootstrap fails open: a transient gateway failure renders the page as
//! anonymous instead of failing the request. Cookies are only cleared when
//! the gateway positively rejects them, so a blip does not log users out.

use std::convert::Infallible;
use std::fmt::Write;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use time::Duration;

use crate::gateway::{Identity, IdentityGateway, SessionTokens};

pub const ACCESS_COOKIE: &str = "sb_access_token";
pub const REFRESH_COOKIE: &str = "sb_refresh_token";

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

// =============================================================================
// SESSION CONTEXT
// =============================================================================

/// Per-request snapshot of the current identity.
///
/// Extracted in handlers as a plain argument; a request that skipped the
/// bootstrap layer is treated as anonymous.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    identity: Option<Arc<Identity>>,
}

impl SessionContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    #[must_use]
    pub fn signed_in(identity: Identity) -> Self {
        Self { identity: Some(Arc::new(identity)) }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_deref()
    }

    /// Shared handle to the snapshot, for components that outlive a borrow.
    #[must_use]
    pub fn shared_identity(&self) -> Option<Arc<Identity>> {
        self.identity.clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_default())
    }
}

// =============================================================================
// BOOTSTRAP
// =============================================================================

/// What the bootstrap wants done with the browser's session cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieUpdate {
    Keep,
    Replace(SessionTokens),
    Clear,
}

/// Result of bootstrapping one request.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub context: SessionContext,
    /// Tokens valid for the rest of this request (refreshed if needed).
    pub tokens: Option<SessionTokens>,
    pub cookies: CookieUpdate,
}

impl Bootstrap {
    fn anonymous(cookies: CookieUpdate) -> Self {
        Self { context: SessionContext::anonymous(), tokens: None, cookies }
    }
}

/// Resolve the request's session tokens into a `SessionContext`.
///
/// At most two gateway round trips: the identity read, and one refresh when
/// the access token has been rejected.
pub async fn bootstrap(gateway: &dyn IdentityGateway, tokens: Option<SessionTokens>) -> Bootstrap {
    let Some(tokens) = tokens else {
        return Bootstrap::anonymous(CookieUpdate::Keep);
    };

    match gateway.current_identity(&tokens.access_token).await {
        Ok(Some(identity)) => Bootstrap {
            context: SessionContext::signed_in(identity),
            tokens: Some(tokens),
            cookies: CookieUpdate::Keep,
        },
        Ok(None) => match tokens.refresh_token.as_deref() {
            Some(refresh_token) => refresh(gateway, refresh_token).await,
            None => Bootstrap::anonymous(CookieUpdate::Clear),
        },
        Err(e) => {
            tracing::warn!(error = %e, "identity lookup failed, rendering as anonymous");
            Bootstrap::anonymous(CookieUpdate::Keep)
        }
    }
}

async fn refresh(gateway: &dyn IdentityGateway, refresh_token: &str) -> Bootstrap {
    match gateway.refresh(refresh_token).await {
        Ok(session) => {
            tracing::debug!(user_id = %session.identity.id, "session refreshed");
            Bootstrap {
                context: SessionContext::signed_in(session.identity),
                tokens: Some(session.tokens.clone()),
                cookies: CookieUpdate::Replace(session.tokens),
            }
        }
        Err(e) if e.is_transient() => {
            tracing::warn!(error = %e, "session refresh failed, rendering as anonymous");
            Bootstrap::anonymous(CookieUpdate::Keep)
        }
        Err(e) => {
            tracing::debug!(error = %e, "refresh token rejected, clearing session");
            Bootstrap::anonymous(CookieUpdate::Clear)
        }
    }
}

// =============================================================================
// COOKIES
// =============================================================================

pub(crate) fn http_only_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub(crate) fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

/// Read the session tokens the browser sent, if any.
#[must_use]
pub fn tokens_from_jar(jar: &CookieJar) -> Option<SessionTokens> {
    let access_token = jar
        .get(ACCESS_COOKIE)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())?;
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(str::to_owned);
    Some(SessionTokens { access_token: access_token.to_owned(), refresh_token })
}

/// Persist a session in the browser.
#[must_use]
pub fn with_session_cookies(jar: CookieJar, tokens: &SessionTokens, secure: bool) -> CookieJar {
    let jar = jar.add(http_only_cookie(ACCESS_COOKIE, tokens.access_token.clone(), secure));
    match &tokens.refresh_token {
        Some(refresh) => jar.add(http_only_cookie(REFRESH_COOKIE, refresh.clone(), secure)),
        None => jar.add(expired_cookie(REFRESH_COOKIE, secure)),
    }
}

/// Expire both session cookies.
#[must_use]
pub fn without_session_cookies(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(expired_cookie(ACCESS_COOKIE, secure))
        .add(expired_cookie(REFRESH_COOKIE, secure))
}

/// Whether a handler already wrote the session cookies on this response.
/// A handler's sign-in or sign-out wins over the bootstrap's cookie update.
#[must_use]
pub fn response_sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{ACCESS_COOKIE}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
