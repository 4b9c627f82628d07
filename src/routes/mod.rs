//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page route passes through two middleware layers, outermost first:
//! the session bootstrap (resolve cookies into a `SessionContext`, once per
//! request) and the route guard (redirect based on that snapshot). Handlers
//! then receive the snapshot as an extractor. `/healthz` is mounted outside
//! both layers so health checks never touch the gateway.

pub mod auth;
pub mod guard;
pub mod pages;
pub mod profile;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum_extra::extract::cookie::CookieJar;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::services::session::{self, CookieUpdate};
use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/products", get(pages::products))
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/register", get(auth::register_page).post(auth::register_submit))
        .route("/logout", get(auth::logout))
        .route("/auth/callback", get(auth::oauth_callback))
        .route("/auth/{provider}", get(auth::oauth_start))
        .route("/profile", get(profile::profile_index))
        .route("/profile/general", get(profile::general_page).post(profile::general_submit))
        .route("/profile/address", get(profile::address_page).post(profile::address_submit))
        .route("/profile/orders", get(profile::orders_page))
        .layer(middleware::from_fn(guard::guard_routes))
        .layer(middleware::from_fn_with_state(state.clone(), bootstrap_session))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Middleware: resolve the session once and publish it to the request.
///
/// The refreshed or cleared cookies decided by the bootstrap are applied to
/// the response unless the handler wrote session cookies itself (sign-in,
/// sign-out), in which case the handler wins.
async fn bootstrap_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = session::bootstrap(state.gateway.as_ref(), session::tokens_from_jar(&jar)).await;
    request.extensions_mut().insert(outcome.context);
    if let Some(tokens) = outcome.tokens {
        request.extensions_mut().insert(tokens);
    }

    let response = next.run(request).await;
    if session::response_sets_session_cookie(&response) {
        return response;
    }

    let secure = state.cookie_secure();
    match outcome.cookies {
        CookieUpdate::Keep => response,
        CookieUpdate::Replace(tokens) => {
            (session::with_session_cookies(CookieJar::new(), &tokens, secure), response).into_response()
        }
        CookieUpdate::Clear => (session::without_session_cookies(CookieJar::new(), secure), response).into_response(),
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
