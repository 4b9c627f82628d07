//! PKCE helpers for the social sign-in flow.
//!
//! The verifier lives in a short-lived HttpOnly cookie set when the flow
//! starts; only its S256 challenge is sent to the gateway. A callback that
//! arrives without the cookie cannot complete the exchange, which binds the
//! one-time code to the browser that started the flow.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};
use time::Duration;

use super::session::expired_cookie;

pub const VERIFIER_COOKIE: &str = "pkce_verifier";
const VERIFIER_TTL_MINUTES: i64 = 10;

/// 32 random bytes, base64url encoded: 43 characters, within RFC 7636 bounds.
#[must_use]
pub fn generate_verifier() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 code challenge for a verifier.
#[must_use]
pub fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[must_use]
pub fn with_verifier_cookie(jar: CookieJar, verifier: String, secure: bool) -> CookieJar {
    let cookie = Cookie::build((VERIFIER_COOKIE, verifier))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::minutes(VERIFIER_TTL_MINUTES));
    jar.add(cookie)
}

#[must_use]
pub fn verifier_from_jar(jar: &CookieJar) -> Option<String> {
    jar.get(VERIFIER_COOKIE)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[must_use]
pub fn without_verifier_cookie(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(expired_cookie(VERIFIER_COOKIE, secure))
}

#[cfg(test)]
#[path = "oauth_test.rs"]
mod tests;
