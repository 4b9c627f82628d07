//! Profile routes. All of them sit behind the identity guard.

use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;

use super::auth::{gateway_status, log_gateway_error};
use super::guard::SignedIn;
use crate::forms::FormState;
use crate::forms::schemas::{self, ADDRESS, PROFILE_GENERAL};
use crate::gateway::{Identity, ProfileUpdate};
use crate::render;
use crate::services::notice::{self, Notification};
use crate::services::session::SessionContext;
use crate::state::AppState;

const GENERAL_PATH: &str = "/profile/general";

type SectionRenderer = fn(&SessionContext, &Identity, &FormState, Option<&Notification>) -> String;

/// An editable profile section: where it lives and how it renders.
struct Section {
    path: &'static str,
    render: SectionRenderer,
}

const GENERAL_SECTION: Section = Section { path: GENERAL_PATH, render: render::general_page };
const ADDRESS_SECTION: Section = Section { path: "/profile/address", render: render::address_page };

/// `GET /profile`
pub async fn profile_index() -> Redirect {
    Redirect::to(GENERAL_PATH)
}

// =============================================================================
// GENERAL
// =============================================================================

fn general_form(signed_in: &SignedIn) -> FormState {
    let mut form = FormState::new(&PROFILE_GENERAL, schemas::profile_initial(&signed_in.identity));
    for name in schemas::profile_locked(&signed_in.identity) {
        form.lock(name);
    }
    form
}

/// `GET /profile/general`
pub async fn general_page(
    State(state): State<AppState>,
    ctx: SessionContext,
    signed_in: SignedIn,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, notice) = notice::take_flash(jar, state.cookie_secure());
    let form = general_form(&signed_in);
    (jar, Html(render::general_page(&ctx, &signed_in.identity, &form, notice.as_ref())))
}

/// `POST /profile/general`: send the changed fields to the gateway.
pub async fn general_submit(
    State(state): State<AppState>,
    ctx: SessionContext,
    signed_in: SignedIn,
    jar: CookieJar,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let identity = &signed_in.identity;
    let form = FormState::from_submission(
        &PROFILE_GENERAL,
        schemas::profile_initial(identity),
        schemas::profile_locked(identity),
        &fields,
    );
    let update = schemas::profile_update(form.values(), identity);
    submit_update(&state, &ctx, &signed_in, form, &update, &GENERAL_SECTION, jar).await
}

// =============================================================================
// ADDRESS
// =============================================================================

/// `GET /profile/address`
pub async fn address_page(
    State(state): State<AppState>,
    ctx: SessionContext,
    signed_in: SignedIn,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, notice) = notice::take_flash(jar, state.cookie_secure());
    let form = FormState::new(&ADDRESS, schemas::address_initial(&signed_in.identity));
    (jar, Html(render::address_page(&ctx, &signed_in.identity, &form, notice.as_ref())))
}

/// `POST /profile/address`: replace the stored address.
pub async fn address_submit(
    State(state): State<AppState>,
    ctx: SessionContext,
    signed_in: SignedIn,
    jar: CookieJar,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let identity = &signed_in.identity;
    let form = FormState::from_submission(&ADDRESS, schemas::address_initial(identity), &[], &fields);
    let update = ProfileUpdate { address: Some(schemas::address_from(form.values())), ..ProfileUpdate::default() };
    submit_update(&state, &ctx, &signed_in, form, &update, &ADDRESS_SECTION, jar).await
}

/// Validate and send an update. Success redirects back with a flash, so
/// the next page load bootstraps a fresh snapshot; failure re-renders the
/// form with the gateway's message.
async fn submit_update(
    state: &AppState,
    ctx: &SessionContext,
    signed_in: &SignedIn,
    mut form: FormState,
    update: &ProfileUpdate,
    section: &Section,
    jar: CookieJar,
) -> Response {
    if let Err(blocked) = form.begin_submit() {
        tracing::debug!(reason = %blocked, section = %section.path, "profile submit refused");
        let page = (section.render)(ctx, &signed_in.identity, &form, None);
        return (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response();
    }

    match state.gateway.update_profile(&signed_in.tokens.access_token, update).await {
        Ok(identity) => {
            tracing::info!(user_id = %identity.id, section = %section.path, "profile updated");
            let jar = notice::with_saved(jar, form.succeed(), state.cookie_secure());
            (jar, Redirect::to(section.path)).into_response()
        }
        Err(e) => {
            log_gateway_error(&e, "profile update");
            let notice = form.fail(e.user_message());
            let page = (section.render)(ctx, &signed_in.identity, &form, Some(&notice));
            (gateway_status(&e), Html(page)).into_response()
        }
    }
}

// =============================================================================
// ORDERS
// =============================================================================

/// `GET /profile/orders`
pub async fn orders_page(ctx: SessionContext, signed_in: SignedIn) -> Html<String> {
    Html(render::orders_page(&ctx, &signed_in.identity))
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
