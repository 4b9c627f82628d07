//! Transient user notifications (toasts) and the one-shot flash cookie.
//!
//! Errors are rendered on the re-displayed form in the same response, so
//! only success notices ever cross a redirect. The flash cookie carries a
//! fixed key rather than free text.

use axum_extra::extract::cookie::{Cookie, CookieJar};

use super::session::{expired_cookie, http_only_cookie};

const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

impl Level {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: Level::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into() }
    }
}

/// Success notices that survive one redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    SignedUp,
    SignedOut,
    ProfileUpdated,
    AddressUpdated,
}

impl Flash {
    const ALL: [Self; 4] = [Self::SignedUp, Self::SignedOut, Self::ProfileUpdated, Self::AddressUpdated];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::SignedUp => "signed-up",
            Self::SignedOut => "signed-out",
            Self::ProfileUpdated => "profile-updated",
            Self::AddressUpdated => "address-updated",
        }
    }

    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    #[must_use]
    pub fn notification(self) -> Notification {
        Notification::success(match self {
            Self::SignedUp => "Account created. Please log in.",
            Self::SignedOut => "You have been signed out",
            Self::ProfileUpdated => "Profile updated successfully",
            Self::AddressUpdated => "Address updated successfully",
        })
    }
}

#[must_use]
pub fn with_flash(jar: CookieJar, flash: Flash, secure: bool) -> CookieJar {
    jar.add(http_only_cookie(FLASH_COOKIE, flash.key().to_owned(), secure))
}

/// Carry a form's saved notice, if it has one, across the redirect.
#[must_use]
pub fn with_saved(jar: CookieJar, saved: Option<Flash>, secure: bool) -> CookieJar {
    match saved {
        Some(flash) => with_flash(jar, flash, secure),
        None => jar,
    }
}

/// Read and expire the flash cookie. Unknown keys are dropped silently.
#[must_use]
pub fn take_flash(jar: CookieJar, secure: bool) -> (CookieJar, Option<Notification>) {
    let Some(key) = jar.get(FLASH_COOKIE).map(Cookie::value).map(str::to_owned) else {
        return (jar, None);
    };
    let notification = Flash::parse(&key).map(Flash::notification);
    (jar.add(expired_cookie(FLASH_COOKIE, secure)), notification)
}

#[cfg(test)]
#[path = "notice_test.rs"]
mod tests;
