//! Server configuration parsed from environment variables.
//!
//! `.env` files are loaded by `main` before this runs. Parsing goes through a
//! lookup function so tests never touch the process environment.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GATEWAY_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GATEWAY_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT: {0}")]
    InvalidPort(String),
    #[error("invalid SITE_URL: {0} (expected http:// or https://)")]
    InvalidSiteUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Connection details for the Supabase-compatible identity gateway.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub url: String,
    pub anon_key: String,
    pub service_key: String,
    pub timeouts: GatewayTimeouts,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Public origin, used to build the OAuth callback URL.
    pub site_url: String,
    pub cookie_secure: bool,
    /// `None` when the gateway env vars are missing; the server then runs
    /// against the in-memory gateway.
    pub gateway: Option<GatewayConfig>,
}

impl AppConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `SITE_URL`: default `http://localhost:{PORT}`
    /// - `COOKIE_SECURE`: default inferred from an `https://` `SITE_URL`
    /// - `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `SUPABASE_SERVICE_KEY`: all three
    ///   or none
    /// - `GATEWAY_REQUEST_TIMEOUT_SECS`: default 30
    /// - `GATEWAY_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` or `SITE_URL` is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` or `SITE_URL` is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let site_url = lookup("SITE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim()
            .trim_end_matches('/')
            .to_owned();
        if !site_url.starts_with("http://") && !site_url.starts_with("https://") {
            return Err(ConfigError::InvalidSiteUrl(site_url));
        }

        let cookie_secure = lookup("COOKIE_SECURE")
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or_else(|| site_url.starts_with("https://"));

        let gateway = gateway_from_lookup(&lookup);

        Ok(Self { port, site_url, cookie_secure, gateway })
    }

    /// Absolute URL the gateway redirects back to after social sign-in.
    #[must_use]
    pub fn oauth_callback_url(&self) -> String {
        format!("{}/auth/callback", self.site_url)
    }
}

fn gateway_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Option<GatewayConfig> {
    let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
    let url = non_empty("SUPABASE_URL")?.trim_end_matches('/').to_owned();
    let anon_key = non_empty("SUPABASE_ANON_KEY")?;
    let service_key = non_empty("SUPABASE_SERVICE_KEY")?;
    let timeouts = GatewayTimeouts {
        request_secs: parse_u64(lookup("GATEWAY_REQUEST_TIMEOUT_SECS"), DEFAULT_GATEWAY_REQUEST_TIMEOUT_SECS),
        connect_secs: parse_u64(lookup("GATEWAY_CONNECT_TIMEOUT_SECS"), DEFAULT_GATEWAY_CONNECT_TIMEOUT_SECS),
    };
    Some(GatewayConfig { url, anon_key, service_key, timeouts })
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
