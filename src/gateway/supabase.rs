//! Supabase-compatible gateway client (GoTrue auth + PostgREST).
//!
//! Thin HTTP wrapper. Response decoding and error mapping are pure functions
//! so they can be tested without a network.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{Address, GatewayError, Identity, IdentityGateway, OAuthProvider, ProfileUpdate, Session, SessionTokens};
use crate::config::GatewayConfig;

const PROFILE_TABLE: &str = "users";

// =============================================================================
// CLIENT
// =============================================================================

pub struct SupabaseGateway {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl SupabaseGateway {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| GatewayError::Unexpected(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            base_url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            service_key: config.service_key.clone(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(StatusCode, String), GatewayError> {
        let response = request
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| GatewayError::Transient(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transient(e.to_string()))?;
        Ok((status, body))
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, GatewayError> {
        let request = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .json(&body);
        let (status, text) = self.send(request).await?;
        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &text));
        }
        parse_session(&text)
    }

    async fn insert_profile_row(&self, id: Uuid) -> Result<(), String> {
        let response = self
            .http
            .post(format!("{}/rest/v1/{PROFILE_TABLE}", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=minimal")
            .json(&json!({ "id": id }))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status.as_u16(), &body).to_string())
    }
}

#[async_trait::async_trait]
impl IdentityGateway for SupabaseGateway {
    async fn current_identity(&self, access_token: &str) -> Result<Option<Identity>, GatewayError> {
        let request = self
            .http
            .get(self.auth_url("user"))
            .bearer_auth(access_token);
        let (status, text) = self.send(request).await?;
        match status {
            s if s.is_success() => parse_user(&text).map(Some),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            s => Err(error_from_response(s.as_u16(), &text)),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, GatewayError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, GatewayError> {
        let request = self
            .http
            .post(self.auth_url("signup"))
            .json(&json!({ "email": email, "password": password }));
        let (status, text) = self.send(request).await?;
        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &text));
        }
        let identity = parse_signup(&text)?;

        // Not transactional: a failure here leaves the identity without a row.
        if let Err(reason) = self.insert_profile_row(identity.id).await {
            return Err(GatewayError::PartialSignup { identity_id: identity.id, reason });
        }
        Ok(identity)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        let request = self
            .http
            .post(self.auth_url("logout"))
            .bearer_auth(access_token);
        let (status, text) = self.send(request).await?;
        if status.is_success() || is_already_signed_out(status) {
            return Ok(());
        }
        Err(error_from_response(status.as_u16(), &text))
    }

    async fn update_profile(&self, access_token: &str, update: &ProfileUpdate) -> Result<Identity, GatewayError> {
        let request = self
            .http
            .put(self.auth_url("user"))
            .bearer_auth(access_token)
            .json(&update_body(update));
        let (status, text) = self.send(request).await?;
        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &text));
        }
        parse_user(&text)
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Session, GatewayError> {
        self.token_grant("pkce", json!({ "auth_code": code, "code_verifier": verifier }))
            .await
    }

    async fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        challenge: &str,
    ) -> Result<String, GatewayError> {
        build_authorize_url(&self.base_url, provider, redirect_to, challenge)
    }
}

fn is_already_signed_out(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND)
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct WireUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    user_metadata: WireUserMetadata,
    #[serde(default)]
    app_metadata: WireAppMetadata,
}

#[derive(Deserialize, Default)]
struct WireUserMetadata {
    full_name: Option<String>,
    phone: Option<String>,
    address: Option<Address>,
    avatar_url: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireAppMetadata {
    provider: Option<String>,
}

#[derive(Deserialize)]
struct WireSession {
    access_token: String,
    refresh_token: Option<String>,
    user: WireUser,
}

#[derive(Deserialize, Default)]
struct WireError {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<WireUser> for Identity {
    fn from(user: WireUser) -> Self {
        let meta = user.user_metadata;
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            full_name: non_empty(meta.full_name),
            phone: non_empty(meta.phone).or_else(|| non_empty(user.phone)),
            address: meta.address,
            avatar_url: non_empty(meta.avatar_url),
            provider: user
                .app_metadata
                .provider
                .unwrap_or_else(|| "email".to_owned()),
        }
    }
}

// =============================================================================
// PURE HELPERS
// =============================================================================

/// Decode a GoTrue user object.
pub(crate) fn parse_user(body: &str) -> Result<Identity, GatewayError> {
    serde_json::from_str::<WireUser>(body)
        .map(Identity::from)
        .map_err(|e| GatewayError::Unexpected(e.to_string()))
}

/// Decode a GoTrue token response.
pub(crate) fn parse_session(body: &str) -> Result<Session, GatewayError> {
    let wire: WireSession = serde_json::from_str(body).map_err(|e| GatewayError::Unexpected(e.to_string()))?;
    Ok(Session {
        tokens: SessionTokens { access_token: wire.access_token, refresh_token: non_empty(wire.refresh_token) },
        identity: wire.user.into(),
    })
}

/// Sign-up answers with a bare user when email confirmation is required, or a
/// full session (with `user` nested) when it is not.
pub(crate) fn parse_signup(body: &str) -> Result<Identity, GatewayError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| GatewayError::Unexpected(e.to_string()))?;
    let user = match value.get("user") {
        Some(user) if value.get("access_token").is_some() => user.clone(),
        _ => value,
    };
    serde_json::from_value::<WireUser>(user)
        .map(Identity::from)
        .map_err(|e| GatewayError::Unexpected(e.to_string()))
}

/// Map a non-success gateway response to a `GatewayError`, keeping the
/// gateway's own message.
pub(crate) fn error_from_response(status: u16, body: &str) -> GatewayError {
    let wire: WireError = serde_json::from_str(body).unwrap_or_default();
    let code = wire.error_code.clone().or_else(|| wire.error.clone());
    let message = wire
        .msg
        .or(wire.message)
        .or(wire.error_description)
        .or(wire.error)
        .unwrap_or_else(|| format!("identity service returned status {status}"));

    if status == 429 || status >= 500 {
        return GatewayError::Transient(message);
    }
    match code.as_deref() {
        Some("invalid_credentials" | "invalid_grant") => GatewayError::InvalidCredentials(message),
        _ => GatewayError::Rejected(message),
    }
}

/// Request body for `PUT /auth/v1/user`. Only provided fields are sent; the
/// gateway merges `data` keys into the existing metadata.
pub(crate) fn update_body(update: &ProfileUpdate) -> serde_json::Value {
    let mut data = serde_json::Map::new();
    if let Some(full_name) = &update.full_name {
        data.insert("full_name".into(), json!(full_name));
    }
    if let Some(phone) = &update.phone {
        data.insert("phone".into(), json!(phone));
    }
    if let Some(address) = &update.address {
        data.insert("address".into(), json!(address));
    }

    let mut body = serde_json::Map::new();
    if let Some(email) = &update.email {
        body.insert("email".into(), json!(email));
    }
    if !data.is_empty() {
        body.insert("data".into(), serde_json::Value::Object(data));
    }
    serde_json::Value::Object(body)
}

pub(crate) fn build_authorize_url(
    base_url: &str,
    provider: OAuthProvider,
    redirect_to: &str,
    challenge: &str,
) -> Result<String, GatewayError> {
    let mut url = Url::parse(&format!("{base_url}/auth/v1/authorize"))
        .map_err(|e| GatewayError::Unexpected(format!("invalid gateway url: {e}")))?;
    url.query_pairs_mut()
        .append_pair("provider", provider.as_str())
        .append_pair("redirect_to", redirect_to)
        .append_pair("code_challenge", challenge)
        .append_pair("code_challenge_method", "s256");
    Ok(url.into())
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
