//! Public storefront pages.

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum_extra::extract::cookie::CookieJar;

use crate::render;
use crate::services::notice;
use crate::services::session::SessionContext;
use crate::state::AppState;

/// `GET /`
pub async fn home(State(state): State<AppState>, ctx: SessionContext, jar: CookieJar) -> impl IntoResponse {
    let (jar, notice) = notice::take_flash(jar, state.cookie_secure());
    (jar, Html(render::home_page(&ctx, notice.as_ref())))
}

/// `GET /products`
pub async fn products(ctx: SessionContext) -> Html<String> {
    Html(render::products_page(&ctx))
}
