//! Server-rendered HTML pages.
//!
//! Pages are Leptos components rendered to a string per request. Every page
//! sits in the `Document` shell (head, navigation, optional toast, and the
//! form script). Renderers take the request's `SessionContext` by reference
//! and never consult the gateway, so one response is always drawn from a
//! single identity snapshot.

pub mod form;

use std::sync::Arc;

use leptos::prelude::*;

use self::form::{FORM_SCRIPT, FormView, ValidatedForm};
use crate::forms::FormState;
use crate::gateway::{Identity, OAuthProvider};
use crate::services::notice::Notification;
use crate::services::session::SessionContext;

const SITE_CSS: &str = include_str!("../../assets/site.css");

/// Render a page to HTML inside a fresh reactive owner.
fn render<V: IntoView>(page: impl FnOnce() -> V) -> String {
    Owner::new().with(|| page().to_html())
}

// =============================================================================
// SHELL
// =============================================================================

#[component]
fn Document(
    #[prop(into)] title: String,
    identity: Option<Arc<Identity>>,
    notice: Option<Notification>,
    children: Children,
) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <title>{format!("{title} | Watch Store")}</title>
                <style inner_html=SITE_CSS></style>
            </head>
            <body>
                <Nav identity=identity />
                <main>{children()}</main>
                {notice.map(|notice| view! { <Toast notice=notice /> })}
                <script inner_html=FORM_SCRIPT></script>
            </body>
        </html>
    }
}

/// Top navigation. Anonymous visitors get login/register links; signed-in
/// users get their avatar, name, and a logout link.
#[component]
fn Nav(identity: Option<Arc<Identity>>) -> impl IntoView {
    let account = match identity {
        Some(identity) => {
            let avatar = identity.avatar_url.clone();
            let name = identity.display_name().to_owned();
            view! {
                <a href="/profile" class="user">
                    {avatar.map(|src| view! { <img class="avatar" src=src alt="" /> })}
                    <span>{name}</span>
                </a>
                <a href="/logout">"Logout"</a>
            }
            .into_any()
        }
        None => view! {
            <a href="/login">"Login"</a>
            <a href="/register">"Register"</a>
        }
        .into_any(),
    };
    view! {
        <header>
            <a href="/">
                <strong>"Watch Store"</strong>
            </a>
            <a href="/products">"Products"</a>
            <span class="spacer"></span>
            {account}
        </header>
    }
}

#[component]
fn Toast(notice: Notification) -> impl IntoView {
    view! {
        <div class=format!("toast {}", notice.level.as_str()) role="status">
            {notice.message}
        </div>
    }
}

// =============================================================================
// STOREFRONT
// =============================================================================

pub struct Product {
    pub name: &'static str,
    pub description: &'static str,
    pub price_cents: u32,
}

pub const PRODUCTS: &[Product] = &[
    Product { name: "Chronograph Classic", description: "Steel case, leather strap, 42 mm.", price_cents: 24_900 },
    Product { name: "Diver 300", description: "Water resistant to 300 m, ceramic bezel.", price_cents: 39_900 },
    Product { name: "Field Automatic", description: "Self-winding movement, canvas strap.", price_cents: 18_500 },
    Product { name: "Dress Slim", description: "6 mm profile, sapphire crystal.", price_cents: 31_000 },
];

fn format_price(cents: u32) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

#[must_use]
pub fn home_page(ctx: &SessionContext, notice: Option<&Notification>) -> String {
    let identity = ctx.shared_identity();
    let notice = notice.cloned();
    render(move || {
        view! {
            <Document title="Home" identity=identity notice=notice>
                <section>
                    <h1>"Welcome to Our Watch Store"</h1>
                    <p>"Discover the finest collection of watches crafted with precision and style."</p>
                    <p>"Explore our range of luxury timepieces that blend elegance with functionality."</p>
                    <p>
                        <a href="/products">"Browse products"</a>
                    </p>
                </section>
            </Document>
        }
    })
}

#[must_use]
pub fn products_page(ctx: &SessionContext) -> String {
    let identity = ctx.shared_identity();
    render(move || {
        view! {
            <Document title="Products" identity=identity notice=None>
                <h1>"Products"</h1>
                <div class="products">
                    {PRODUCTS
                        .iter()
                        .map(|product| {
                            view! {
                                <article>
                                    <h2>{product.name}</h2>
                                    <p>{product.description}</p>
                                    <strong>{format_price(product.price_cents)}</strong>
                                </article>
                            }
                        })
                        .collect_view()}
                </div>
            </Document>
        }
    })
}

// =============================================================================
// AUTH
// =============================================================================

#[component]
fn SocialLinks() -> impl IntoView {
    view! {
        <div class="social">
            {OAuthProvider::ALL
                .iter()
                .map(|provider| {
                    view! {
                        <p>
                            <a href=format!("/auth/{}", provider.as_str())>
                                {format!("Continue with {}", provider.label())}
                            </a>
                        </p>
                    }
                })
                .collect_view()}
        </div>
    }
}

#[must_use]
pub fn login_page(ctx: &SessionContext, state: &FormState, notice: Option<&Notification>) -> String {
    let identity = ctx.shared_identity();
    let notice = notice.cloned();
    let form = FormView::new(state, "/login", "Login");
    render(move || {
        view! {
            <Document title="Login" identity=identity notice=notice>
                <h1>"Login"</h1>
                <ValidatedForm form=form />
                <SocialLinks />
                <p>
                    "No account yet? "
                    <a href="/register">"Register"</a>
                </p>
            </Document>
        }
    })
}

#[must_use]
pub fn register_page(ctx: &SessionContext, state: &FormState, notice: Option<&Notification>) -> String {
    let identity = ctx.shared_identity();
    let notice = notice.cloned();
    let form = FormView::new(state, "/register", "Register");
    render(move || {
        view! {
            <Document title="Register" identity=identity notice=notice>
                <h1>"Register"</h1>
                <ValidatedForm form=form />
                <p>
                    "Already registered? "
                    <a href="/login">"Login"</a>
                </p>
            </Document>
        }
    })
}

// =============================================================================
// PROFILE
// =============================================================================

/// Sections of the profile area, in sidebar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSection {
    General,
    Address,
    Orders,
}

impl ProfileSection {
    const ALL: [Self; 3] = [Self::General, Self::Address, Self::Orders];

    fn path(self) -> &'static str {
        match self {
            Self::General => "/profile/general",
            Self::Address => "/profile/address",
            Self::Orders => "/profile/orders",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Address => "Address",
            Self::Orders => "Orders",
        }
    }
}

/// Greeting and section sidebar around a section's content.
#[component]
fn ProfileShell(name: String, active: ProfileSection, children: Children) -> impl IntoView {
    view! {
        <div class="profile">
            <aside>
                <h2>{format!("Hello {name}!")}</h2>
                <nav>
                    {ProfileSection::ALL
                        .into_iter()
                        .map(|section| {
                            view! {
                                <a href=section.path() aria-current=(section == active).then_some("page")>
                                    {section.label()}
                                </a>
                            }
                        })
                        .collect_view()}
                </nav>
            </aside>
            <section>{children()}</section>
        </div>
    }
}

fn profile_page(
    ctx: &SessionContext,
    identity: &Identity,
    active: ProfileSection,
    notice: Option<&Notification>,
    form: Option<FormView>,
) -> String {
    let shared = ctx.shared_identity();
    let notice = notice.cloned();
    let name = identity.display_name().to_owned();
    render(move || {
        view! {
            <Document title=active.label() identity=shared notice=notice>
                <ProfileShell name=name active=active>
                    <h1>{active.label()}</h1>
                    {match form {
                        Some(form) => view! { <ValidatedForm form=form /> }.into_any(),
                        None => view! { <p>"You have no orders yet."</p> }.into_any(),
                    }}
                </ProfileShell>
            </Document>
        }
    })
}

#[must_use]
pub fn general_page(
    ctx: &SessionContext,
    identity: &Identity,
    state: &FormState,
    notice: Option<&Notification>,
) -> String {
    let form = FormView::new(state, "/profile/general", "Save");
    profile_page(ctx, identity, ProfileSection::General, notice, Some(form))
}

#[must_use]
pub fn address_page(
    ctx: &SessionContext,
    identity: &Identity,
    state: &FormState,
    notice: Option<&Notification>,
) -> String {
    let form = FormView::new(state, "/profile/address", "Save");
    profile_page(ctx, identity, ProfileSection::Address, notice, Some(form))
}

#[must_use]
pub fn orders_page(ctx: &SessionContext, identity: &Identity) -> String {
    profile_page(ctx, identity, ProfileSection::Orders, None, None)
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
