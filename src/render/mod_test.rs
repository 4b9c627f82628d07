use leptos::prelude::*;
use uuid::Uuid;

use super::test_helpers::{has_flag, start_tag, submit_button};
use super::*;
use crate::forms::Values;
use crate::forms::schemas::{LOGIN, PROFILE_GENERAL, profile_initial};
use crate::gateway::memory::MemoryGateway;
use crate::gateway::{IdentityGateway, ProfileUpdate};
use crate::services::session::bootstrap;

fn alice() -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: "alice@example.com".into(),
        full_name: Some("Alice Liddell".into()),
        phone: Some("+48123456789".into()),
        address: None,
        avatar_url: Some("https://avatars.example/alice.png".into()),
        provider: "github".into(),
    }
}

fn nav(ctx: &SessionContext) -> String {
    let identity = ctx.shared_identity();
    render(move || view! { <Nav identity=identity /> })
}

// =============================================================================
// shell
// =============================================================================

#[test]
fn document_has_title_styles_and_form_script() {
    let html = home_page(&SessionContext::anonymous(), None);
    assert!(html.contains("<title>Home | Watch Store</title>"));
    assert!(html.contains("Welcome to Our Watch Store"));
    assert!(html.contains("button:disabled"), "stylesheet is inlined");
    assert!(html.contains(r#"addEventListener("submit""#), "form script is inlined");
    assert!(!html.contains("&quot;use strict&quot;"), "script is not escaped");
}

#[test]
fn nav_anonymous_offers_login_and_register() {
    let html = nav(&SessionContext::anonymous());
    assert!(html.contains(r#"href="/login""#));
    assert!(html.contains(r#"href="/register""#));
    assert!(!html.contains("/logout"));
}

#[test]
fn nav_signed_in_shows_avatar_name_and_logout() {
    let html = nav(&SessionContext::signed_in(alice()));
    assert!(html.contains("https://avatars.example/alice.png"));
    assert!(html.contains("Alice Liddell"));
    assert!(html.contains(r#"href="/logout""#));
    assert!(!html.contains(r#"href="/login""#));
}

#[test]
fn nav_escapes_display_name() {
    let mut identity = alice();
    identity.full_name = Some("<script>x</script>".into());
    let html = nav(&SessionContext::signed_in(identity));
    assert!(!html.contains("<script>x"));
    assert!(html.contains("&lt;script&gt;x"));
}

#[test]
fn toast_renders_level_and_message() {
    let notice = Notification::error("Invalid login credentials");
    let html = home_page(&SessionContext::anonymous(), Some(&notice));
    assert!(html.contains(r#"class="toast error""#));
    assert!(html.contains("Invalid login credentials"));

    let html = home_page(&SessionContext::anonymous(), None);
    assert!(!html.contains(r#"class="toast"#));
}

// =============================================================================
// pages
// =============================================================================

#[test]
fn products_page_lists_catalogue() {
    let html = products_page(&SessionContext::anonymous());
    for product in PRODUCTS {
        assert!(html.contains(product.name));
    }
    assert!(html.contains("$249.00"));
}

#[test]
fn login_page_offers_social_providers() {
    let state = FormState::new(&LOGIN, Values::new());
    let html = login_page(&SessionContext::anonymous(), &state, None);
    assert!(html.contains(r#"href="/auth/github""#));
    assert!(html.contains(r#"href="/auth/google""#));
}

#[test]
fn login_page_for_short_password_disables_submit() {
    let mut state = FormState::new(&LOGIN, Values::new());
    state.change("email", "a@b.co".into());
    state.change("password", "abcd".into());
    let html = login_page(&SessionContext::anonymous(), &state, None);
    assert!(html.contains("Password must be at least 5 characters"));
    assert!(has_flag(submit_button(&html), "disabled"));
}

#[test]
fn general_page_locks_email_for_social_identity() {
    let identity = alice();
    let mut state = FormState::new(&PROFILE_GENERAL, profile_initial(&identity));
    state.lock("email");
    let ctx = SessionContext::signed_in(identity.clone());
    let html = general_page(&ctx, &identity, &state, None);
    let email = start_tag(&html, r#"name="email""#);
    assert!(has_flag(email, "readonly"));
    assert!(email.contains(r#"value="alice@example.com""#));
    assert!(!has_flag(start_tag(&html, r#"name="fullName""#), "readonly"));
}

#[test]
fn orders_page_highlights_active_section() {
    let identity = alice();
    let ctx = SessionContext::signed_in(identity.clone());
    let html = orders_page(&ctx, &identity);
    assert!(html.contains("Hello Alice Liddell!"));
    assert!(start_tag(&html, r#"href="/profile/orders""#).contains(r#"aria-current="page""#));
    assert!(!start_tag(&html, r#"href="/profile/general""#).contains("aria-current"));
    assert!(html.contains("You have no orders yet."));
}

#[tokio::test]
async fn one_render_pass_sees_one_identity_snapshot() {
    let gateway = MemoryGateway::new();
    gateway.sign_up("alice@example.com", "secret1").await.unwrap();
    let session = gateway.sign_in("alice@example.com", "secret1").await.unwrap();
    let rename = ProfileUpdate { full_name: Some("Alice Before".into()), ..ProfileUpdate::default() };
    gateway.update_profile(&session.tokens.access_token, &rename).await.unwrap();

    let ctx = bootstrap(&gateway, Some(session.tokens.clone())).await.context;
    let header = nav(&ctx);

    // The gateway changes between drawing the header and the page body.
    let rename = ProfileUpdate { full_name: Some("Alice After".into()), ..ProfileUpdate::default() };
    gateway.update_profile(&session.tokens.access_token, &rename).await.unwrap();

    let identity = ctx.shared_identity().unwrap();
    let page = orders_page(&ctx, &identity);
    assert!(header.contains("Alice Before"));
    assert!(page.contains("Hello Alice Before!"));
    assert!(!page.contains("Alice After"));
}
