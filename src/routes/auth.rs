//! Auth routes: password login/register, logout, and social sign-in (PKCE).

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::guard::{CurrentTokens, HOME_PATH, LOGIN_PATH};
use crate::forms::schemas::{LOGIN, REGISTER};
use crate::forms::{FormState, Values};
use crate::gateway::{GatewayError, OAuthProvider};
use crate::render;
use crate::services::notice::{self, Flash, Notification};
use crate::services::{oauth, session};
use crate::services::session::SessionContext;
use crate::state::AppState;

/// Map gateway errors to the status of the re-rendered page.
pub(crate) fn gateway_status(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::InvalidCredentials(_) | GatewayError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GatewayError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        GatewayError::Unexpected(_) => StatusCode::BAD_GATEWAY,
        GatewayError::PartialSignup { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log a gateway failure at a level matching how surprising it is.
pub(crate) fn log_gateway_error(err: &GatewayError, action: &str) {
    match err {
        GatewayError::InvalidCredentials(_) => tracing::info!(error = %err, %action, "gateway refused credentials"),
        GatewayError::Rejected(_) | GatewayError::Transient(_) => {
            tracing::warn!(error = %err, %action, "gateway request failed");
        }
        GatewayError::PartialSignup { identity_id, reason } => {
            tracing::error!(%identity_id, %reason, %action, "identity created without profile row");
        }
        GatewayError::Unexpected(_) => tracing::error!(error = %err, %action, "unexpected gateway response"),
    }
}

// =============================================================================
// LOGIN
// =============================================================================

/// `GET /login`
pub async fn login_page(State(state): State<AppState>, ctx: SessionContext, jar: CookieJar) -> impl IntoResponse {
    let (jar, notice) = notice::take_flash(jar, state.cookie_secure());
    let form = FormState::new(&LOGIN, Values::new());
    (jar, Html(render::login_page(&ctx, &form, notice.as_ref())))
}

/// `POST /login`: validate, sign in, set session cookies, go home.
pub async fn login_submit(
    State(state): State<AppState>,
    ctx: SessionContext,
    jar: CookieJar,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let mut form = FormState::from_submission(&LOGIN, Values::new(), &[], &fields);
    if let Err(blocked) = form.begin_submit() {
        tracing::debug!(reason = %blocked, "login submit refused");
        return (StatusCode::UNPROCESSABLE_ENTITY, Html(render::login_page(&ctx, &form, None))).into_response();
    }

    let email = form.value("email").to_owned();
    let password = form.value("password").to_owned();
    match state.gateway.sign_in(&email, &password).await {
        Ok(session) => {
            tracing::info!(user_id = %session.identity.id, "signed in");
            let secure = state.cookie_secure();
            let jar = session::with_session_cookies(jar, &session.tokens, secure);
            let jar = notice::with_saved(jar, form.succeed(), secure);
            (jar, Redirect::to(HOME_PATH)).into_response()
        }
        Err(e) => {
            log_gateway_error(&e, "sign-in");
            let notice = form.fail(e.user_message());
            (gateway_status(&e), Html(render::login_page(&ctx, &form, Some(&notice)))).into_response()
        }
    }
}

// =============================================================================
// REGISTER
// =============================================================================

/// `GET /register`
pub async fn register_page(ctx: SessionContext) -> Html<String> {
    let form = FormState::new(&REGISTER, Values::new());
    Html(render::register_page(&ctx, &form, None))
}

/// `POST /register`: create the account, then send the user to log in.
pub async fn register_submit(
    State(state): State<AppState>,
    ctx: SessionContext,
    jar: CookieJar,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let mut form = FormState::from_submission(&REGISTER, Values::new(), &[], &fields);
    if let Err(blocked) = form.begin_submit() {
        tracing::debug!(reason = %blocked, "register submit refused");
        return (StatusCode::UNPROCESSABLE_ENTITY, Html(render::register_page(&ctx, &form, None))).into_response();
    }

    let email = form.value("email").to_owned();
    let password = form.value("password").to_owned();
    match state.gateway.sign_up(&email, &password).await {
        Ok(identity) => {
            tracing::info!(user_id = %identity.id, "account created");
            let jar = notice::with_saved(jar, form.succeed(), state.cookie_secure());
            (jar, Redirect::to(LOGIN_PATH)).into_response()
        }
        Err(e) => {
            log_gateway_error(&e, "sign-up");
            let notice = form.fail(e.user_message());
            (gateway_status(&e), Html(render::register_page(&ctx, &form, Some(&notice)))).into_response()
        }
    }
}

// =============================================================================
// LOGOUT
// =============================================================================

/// `GET /logout`: revoke the session (if any), clear cookies, go home.
/// Succeeds for already signed-out visitors.
pub async fn logout(State(state): State<AppState>, CurrentTokens(tokens): CurrentTokens, jar: CookieJar) -> Response {
    if let Some(tokens) = tokens {
        if let Err(e) = state.gateway.sign_out(&tokens.access_token).await {
            log_gateway_error(&e, "sign-out");
        }
    }
    let secure = state.cookie_secure();
    let jar = session::without_session_cookies(jar, secure);
    let jar = notice::with_flash(jar, Flash::SignedOut, secure);
    (jar, Redirect::to(HOME_PATH)).into_response()
}

// =============================================================================
// SOCIAL SIGN-IN
// =============================================================================

/// `GET /auth/{provider}`: stash a PKCE verifier and send the browser to
/// the gateway's authorize endpoint.
pub async fn oauth_start(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Response {
    let Some(provider) = OAuthProvider::parse(&provider) else {
        return (StatusCode::NOT_FOUND, "unknown sign-in provider").into_response();
    };

    let verifier = oauth::generate_verifier();
    let challenge = oauth::challenge_for(&verifier);
    let callback = state.config.oauth_callback_url();
    match state.gateway.authorize_url(provider, &callback, &challenge).await {
        Ok(url) => {
            let jar = oauth::with_verifier_cookie(jar, verifier, state.cookie_secure());
            (jar, Redirect::temporary(&url)).into_response()
        }
        Err(e) => {
            log_gateway_error(&e, "oauth authorize");
            login_error(&ctx, gateway_status(&e), e.user_message())
        }
    }
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error_description: Option<String>,
}

/// `GET /auth/callback`: exchange the one-time code for a session, set
/// cookies, go home.
pub async fn oauth_callback(
    State(state): State<AppState>,
    ctx: SessionContext,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let secure = state.cookie_secure();
    if let Some(description) = params.error_description {
        tracing::info!(%description, "provider declined sign-in");
        let jar = oauth::without_verifier_cookie(jar, secure);
        return (jar, login_error(&ctx, StatusCode::BAD_REQUEST, description)).into_response();
    }
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Redirect::to(HOME_PATH).into_response();
    };

    // Without the verifier the code cannot be bound to this browser.
    let Some(verifier) = oauth::verifier_from_jar(&jar) else {
        tracing::warn!("oauth callback without verifier cookie");
        return login_error(&ctx, StatusCode::BAD_REQUEST, "Sign-in session expired, please try again".into());
    };

    let jar = oauth::without_verifier_cookie(jar, secure);
    match state.gateway.exchange_code(&code, &verifier).await {
        Ok(session) => {
            tracing::info!(user_id = %session.identity.id, provider = %session.identity.provider, "signed in");
            let jar = session::with_session_cookies(jar, &session.tokens, secure);
            (jar, Redirect::to(HOME_PATH)).into_response()
        }
        Err(e) => {
            log_gateway_error(&e, "oauth code exchange");
            (jar, login_error(&ctx, gateway_status(&e), e.user_message())).into_response()
        }
    }
}

/// Login page with an error toast, for flows that fail outside the form.
fn login_error(ctx: &SessionContext, status: StatusCode, message: String) -> Response {
    let form = FormState::new(&LOGIN, Values::new());
    let notice = Notification::error(message);
    (status, Html(render::login_page(ctx, &form, Some(&notice)))).into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
