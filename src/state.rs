//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the identity gateway behind a trait object and the parsed
//! configuration. Nothing per-user lives here: identity is resolved per
//! request by the session bootstrap.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::gateway::IdentityGateway;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn IdentityGateway>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: Arc<dyn IdentityGateway>, config: AppConfig) -> Self {
        Self { gateway, config: Arc::new(config) }
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.config.cookie_secure
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
