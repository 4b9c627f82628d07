//! Route guard: which pages need an identity, and what to do without one.
//!
//! Every page declares its access level in `PAGES`. The guard middleware
//! evaluates it once per request against the bootstrap snapshot and either
//! lets the request through or answers with a redirect. Handlers never
//! redirect for auth reasons themselves; the `SignedIn` extractor is a
//! backstop for handlers reached without the middleware.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::gateway::{Identity, SessionTokens};
use crate::services::session::SessionContext;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Render unconditionally.
    Public,
    /// Render only without an identity; signed-in users go home.
    AnonymousOnly,
    /// Render only with an identity; anonymous visitors go to login.
    IdentityRequired,
}

/// Outcome of the pre-render check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Continue,
    RedirectTo(&'static str),
}

#[derive(Debug)]
pub struct PageRoute {
    pub path: &'static str,
    pub access: Access,
}

pub const PAGES: &[PageRoute] = &[
    PageRoute { path: "/", access: Access::Public },
    PageRoute { path: "/products", access: Access::Public },
    PageRoute { path: "/login", access: Access::AnonymousOnly },
    PageRoute { path: "/register", access: Access::AnonymousOnly },
    PageRoute { path: "/logout", access: Access::Public },
    PageRoute { path: "/auth/callback", access: Access::Public },
    PageRoute { path: "/profile", access: Access::IdentityRequired },
    PageRoute { path: "/profile/general", access: Access::IdentityRequired },
    PageRoute { path: "/profile/address", access: Access::IdentityRequired },
    PageRoute { path: "/profile/orders", access: Access::IdentityRequired },
];

/// Access level for a request path. Paths not in the table are public.
#[must_use]
pub fn access_for(path: &str) -> Access {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    PAGES
        .iter()
        .find(|page| page.path == path)
        .map_or(Access::Public, |page| page.access)
}

#[must_use]
pub fn evaluate(access: Access, ctx: &SessionContext) -> Guard {
    match (access, ctx.is_signed_in()) {
        (Access::IdentityRequired, false) => Guard::RedirectTo(LOGIN_PATH),
        (Access::AnonymousOnly, true) => Guard::RedirectTo(HOME_PATH),
        _ => Guard::Continue,
    }
}

/// Middleware: must run inside the session bootstrap layer.
pub async fn guard_routes(request: Request, next: Next) -> Response {
    let ctx = request
        .extensions()
        .get::<SessionContext>()
        .cloned()
        .unwrap_or_default();
    let path = request.uri().path();
    match evaluate(access_for(path), &ctx) {
        Guard::Continue => next.run(request).await,
        Guard::RedirectTo(target) => {
            tracing::debug!(%path, %target, "route guard redirect");
            Redirect::to(target).into_response()
        }
    }
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// Identity and tokens of a signed-in request.
/// Use as a handler parameter to require an identity.
pub struct SignedIn {
    pub identity: Arc<Identity>,
    pub tokens: SessionTokens,
}

impl<S> FromRequestParts<S> for SignedIn
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<SessionContext>()
            .and_then(SessionContext::shared_identity);
        let tokens = parts.extensions.get::<SessionTokens>().cloned();
        match (identity, tokens) {
            (Some(identity), Some(tokens)) => Ok(Self { identity, tokens }),
            _ => Err(Redirect::to(LOGIN_PATH)),
        }
    }
}

/// Session tokens the bootstrap accepted for this request, if any.
pub struct CurrentTokens(pub Option<SessionTokens>);

impl<S> FromRequestParts<S> for CurrentTokens
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<SessionTokens>().cloned()))
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
