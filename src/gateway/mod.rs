//! Identity gateway: the external authentication/database service of record.
//!
//! DESIGN
//! ======
//! Route handlers and the session bootstrap reach the gateway only through
//! the `IdentityGateway` trait. Production wires in the Supabase-compatible
//! HTTP client; tests and local development use the in-memory gateway, which
//! honours the same contract (single-use codes, idempotent sign-out,
//! non-transactional sign-up).
//!
//! ERROR HANDLING
//! ==============
//! `GatewayError` separates auth failures (shown verbatim to the user) from
//! transient transport failures (treated as "anonymous" during bootstrap).

pub mod memory;
pub mod supabase;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// IDENTITY
// =============================================================================

/// Postal address stored in the identity's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub street: String,
    #[serde(default, rename = "postalCode")]
    pub postal_code: String,
    #[serde(default)]
    pub state: String,
}

/// The authenticated user's profile as known to the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub avatar_url: Option<String>,
    /// Auth provider that created the identity (`"email"`, `"github"`, ...).
    pub provider: String,
}

impl Identity {
    /// Name shown in navigation and greetings. Falls back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }

    /// Only password identities may change their email from the profile form.
    #[must_use]
    pub fn uses_email_provider(&self) -> bool {
        self.provider == "email"
    }
}

// =============================================================================
// SESSIONS
// =============================================================================

/// Opaque session tokens. The application forwards them, never parses them.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A freshly issued session together with the identity it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub tokens: SessionTokens,
    pub identity: Identity,
}

/// Partial profile update. `None` fields are left untouched by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.full_name.is_none() && self.phone.is_none() && self.address.is_none()
    }
}

/// Social sign-in providers offered on the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Github,
    Google,
}

impl OAuthProvider {
    pub const ALL: [Self; 2] = [Self::Github, Self::Google];

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "github" => Some(Self::Github),
            "google" => Some(Self::Google),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Google => "google",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Github => "GitHub",
            Self::Google => "Google",
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Wrong email/password, or an unknown refresh token.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Any other request the gateway refused; message is the gateway's own.
    #[error("{0}")]
    Rejected(String),

    /// Transport failure, timeout, or 5xx from the gateway.
    #[error("identity service unavailable: {0}")]
    Transient(String),

    /// Sign-up created the identity but the profile row insert failed.
    /// The identity is left orphaned in the gateway.
    #[error("account {identity_id} was created but its profile could not be saved: {reason}")]
    PartialSignup { identity_id: Uuid, reason: String },

    /// The gateway answered with a body we could not decode.
    #[error("unexpected identity service response: {0}")]
    Unexpected(String),
}

const PARTIAL_SIGNUP_MESSAGE: &str =
    "Your account was created, but your profile could not be set up. Please contact support.";

impl GatewayError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Text for the toast. Gateway messages pass through verbatim; a partial
    /// sign-up keeps the orphaned id and storage error out of the page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::PartialSignup { .. } => PARTIAL_SIGNUP_MESSAGE.to_owned(),
            _ => self.to_string(),
        }
    }
}

// =============================================================================
// GATEWAY TRAIT
// =============================================================================

/// Contract with the external identity service. Enables mocking in tests.
#[async_trait::async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Resolve the identity behind an access token.
    ///
    /// Returns `Ok(None)` when the token is missing, expired, or revoked;
    /// "not logged in" is never an error.
    async fn current_identity(&self, access_token: &str) -> Result<Option<Identity>, GatewayError>;

    /// Trade a refresh token for a new session.
    async fn refresh(&self, refresh_token: &str) -> Result<Session, GatewayError>;

    /// Password sign-in.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError>;

    /// Create an identity, then its profile row. The two writes are not
    /// transactional; a failed second write yields [`GatewayError::PartialSignup`].
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, GatewayError>;

    /// Invalidate the session. Signing out an already invalid session succeeds.
    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError>;

    /// Merge the provided fields into the identity and return the result.
    async fn update_profile(&self, access_token: &str, update: &ProfileUpdate) -> Result<Identity, GatewayError>;

    /// Exchange a one-time OAuth authorization code (PKCE) for a session.
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Session, GatewayError>;

    /// URL the browser is sent to when starting a social sign-in.
    async fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        challenge: &str,
    ) -> Result<String, GatewayError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
