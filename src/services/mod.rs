//! Request-scoped services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own session and OAuth plumbing so route handlers can stay
//! focused on form handling and rendering.

pub mod notice;
pub mod oauth;
pub mod session;
