//! In-memory identity gateway for tests and local development.
//!
//! DESIGN
//! ======
//! Mirrors the observable contract of the hosted gateway: password rules and
//! error messages match what users would see in production, authorization
//! codes are single-use, refresh tokens rotate, and sign-up writes the
//! identity and the profile row as two separate steps so the partial-failure
//! path can be reproduced.
//!
//! Social sign-in is simulated: `authorize_url` issues a code for a synthetic
//! provider account and points straight back at the callback.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{GatewayError, Identity, IdentityGateway, OAuthProvider, ProfileUpdate, Session, SessionTokens};
use crate::services::oauth::challenge_for;
use crate::services::session::{bytes_to_hex, generate_token};

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    identity: Identity,
    /// `None` for accounts created through a social provider.
    password_hash: Option<String>,
}

struct PendingCode {
    user_id: Uuid,
    challenge: String,
}

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    by_email: HashMap<String, Uuid>,
    access: HashMap<String, Uuid>,
    refresh: HashMap<String, Uuid>,
    codes: HashMap<String, PendingCode>,
    /// Rows of the application's own `users` table.
    profiles: HashSet<Uuid>,
}

impl Tables {
    fn issue_session(&mut self, user_id: Uuid) -> Result<Session, GatewayError> {
        let identity = self
            .accounts
            .get(&user_id)
            .map(|a| a.identity.clone())
            .ok_or_else(|| GatewayError::Rejected("User not found".into()))?;
        let access_token = generate_token();
        let refresh_token = generate_token();
        self.access.insert(access_token.clone(), user_id);
        self.refresh.insert(refresh_token.clone(), user_id);
        Ok(Session { tokens: SessionTokens { access_token, refresh_token: Some(refresh_token) }, identity })
    }

    fn user_for_access(&self, access_token: &str) -> Option<Uuid> {
        self.access.get(access_token).copied()
    }

    fn create_account(&mut self, email: &str, provider: &str, password_hash: Option<String>, id: Uuid) -> Identity {
        let identity = Identity {
            id,
            email: email.to_owned(),
            full_name: None,
            phone: None,
            address: None,
            avatar_url: None,
            provider: provider.to_owned(),
        };
        self.by_email.insert(email.to_owned(), id);
        self.accounts.insert(id, Account { identity: identity.clone(), password_hash });
        identity
    }
}

#[derive(Default)]
pub struct MemoryGateway {
    tables: Mutex<Tables>,
    fail_profile_insert: AtomicBool,
    unavailable: AtomicBool,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn hash_password(user_id: Uuid, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(password.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

impl MemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(GatewayError::Transient("connection refused".into()));
        }
        Ok(())
    }

    /// Make the profile-row insert of subsequent sign-ups fail.
    pub fn fail_profile_inserts(&self, fail: bool) {
        self.fail_profile_insert.store(fail, Ordering::Relaxed);
    }

    /// Simulate an outage: every call fails with a transient error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Whether the identity has a row in the application's `users` table.
    #[must_use]
    pub fn has_profile(&self, user_id: Uuid) -> bool {
        self.tables().profiles.contains(&user_id)
    }

    /// Look up an identity by email, bypassing sessions.
    #[must_use]
    pub fn identity_by_email(&self, email: &str) -> Option<Identity> {
        let tables = self.tables();
        let id = tables.by_email.get(&normalize_email(email))?;
        tables.accounts.get(id).map(|a| a.identity.clone())
    }

    /// Issue a one-time authorization code for a provider account, creating
    /// the account on first use.
    pub fn issue_code(&self, email: &str, provider: OAuthProvider, challenge: &str) -> String {
        let email = normalize_email(email);
        let mut tables = self.tables();
        let user_id = match tables.by_email.get(&email) {
            Some(id) => *id,
            None => {
                let id = Uuid::new_v4();
                tables.create_account(&email, provider.as_str(), None, id);
                tables.profiles.insert(id);
                id
            }
        };
        let code = generate_token();
        tables
            .codes
            .insert(code.clone(), PendingCode { user_id, challenge: challenge.to_owned() });
        code
    }
}

#[async_trait::async_trait]
impl IdentityGateway for MemoryGateway {
    async fn current_identity(&self, access_token: &str) -> Result<Option<Identity>, GatewayError> {
        self.check_available()?;
        let tables = self.tables();
        Ok(tables
            .user_for_access(access_token)
            .and_then(|id| tables.accounts.get(&id))
            .map(|a| a.identity.clone()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, GatewayError> {
        self.check_available()?;
        let mut tables = self.tables();
        let Some(user_id) = tables.refresh.remove(refresh_token) else {
            return Err(GatewayError::InvalidCredentials("Invalid Refresh Token: Refresh Token Not Found".into()));
        };
        tables.issue_session(user_id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError> {
        self.check_available()?;
        let mut tables = self.tables();
        let user_id = tables
            .by_email
            .get(&normalize_email(email))
            .copied()
            .filter(|id| {
                tables
                    .accounts
                    .get(id)
                    .and_then(|a| a.password_hash.as_deref())
                    .is_some_and(|hash| hash == hash_password(*id, password))
            })
            .ok_or_else(|| GatewayError::InvalidCredentials("Invalid login credentials".into()))?;
        tables.issue_session(user_id)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, GatewayError> {
        self.check_available()?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(GatewayError::Rejected(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters."
            )));
        }
        let email = normalize_email(email);
        let mut tables = self.tables();
        if tables.by_email.contains_key(&email) {
            return Err(GatewayError::Rejected("User already registered".into()));
        }

        let id = Uuid::new_v4();
        let identity = tables.create_account(&email, "email", Some(hash_password(id, password)), id);

        // Second, independent write. No compensation on failure.
        if self.fail_profile_insert.load(Ordering::Relaxed) {
            return Err(GatewayError::PartialSignup {
                identity_id: id,
                reason: "insert into users failed".into(),
            });
        }
        tables.profiles.insert(id);
        Ok(identity)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        self.check_available()?;
        let mut tables = self.tables();
        if let Some(user_id) = tables.access.remove(access_token) {
            tables.access.retain(|_, id| *id != user_id);
            tables.refresh.retain(|_, id| *id != user_id);
        }
        Ok(())
    }

    async fn update_profile(&self, access_token: &str, update: &ProfileUpdate) -> Result<Identity, GatewayError> {
        self.check_available()?;
        let mut tables = self.tables();
        let user_id = tables
            .user_for_access(access_token)
            .ok_or_else(|| GatewayError::Rejected("Auth session missing!".into()))?;

        if let Some(email) = update.email.as_deref().map(normalize_email) {
            let owner = tables.by_email.get(&email).copied();
            match owner {
                Some(owner) if owner != user_id => {
                    return Err(GatewayError::Rejected(
                        "A user with this email address has already been registered".into(),
                    ));
                }
                Some(_) => {}
                None => {
                    tables.by_email.retain(|_, id| *id != user_id);
                    tables.by_email.insert(email.clone(), user_id);
                }
            }
            if let Some(account) = tables.accounts.get_mut(&user_id) {
                account.identity.email = email;
            }
        }

        let account = tables
            .accounts
            .get_mut(&user_id)
            .ok_or_else(|| GatewayError::Rejected("User not found".into()))?;
        if let Some(full_name) = &update.full_name {
            account.identity.full_name = Some(full_name.clone());
        }
        if let Some(phone) = &update.phone {
            account.identity.phone = Some(phone.clone());
        }
        if let Some(address) = &update.address {
            account.identity.address = Some(address.clone());
        }
        Ok(account.identity.clone())
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Session, GatewayError> {
        self.check_available()?;
        let mut tables = self.tables();
        // Consumed whether or not the verifier matches.
        let Some(pending) = tables.codes.remove(code) else {
            return Err(GatewayError::Rejected("invalid flow state, no valid flow state found".into()));
        };
        if pending.challenge != challenge_for(verifier) {
            return Err(GatewayError::Rejected(
                "code challenge does not match previously saved code verifier".into(),
            ));
        }
        tables.issue_session(pending.user_id)
    }

    async fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        challenge: &str,
    ) -> Result<String, GatewayError> {
        self.check_available()?;
        let email = format!("demo@{}.example", provider.as_str());
        let code = self.issue_code(&email, provider, challenge);
        Ok(format!("{redirect_to}?code={code}"))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
