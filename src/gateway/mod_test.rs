use super::*;

fn identity(full_name: Option<&str>, provider: &str) -> Identity {
    Identity {
        id: Uuid::nil(),
        email: "alice@example.com".into(),
        full_name: full_name.map(str::to_owned),
        phone: None,
        address: None,
        avatar_url: None,
        provider: provider.into(),
    }
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn display_name_prefers_full_name() {
    assert_eq!(identity(Some("Alice Liddell"), "email").display_name(), "Alice Liddell");
}

#[test]
fn display_name_falls_back_to_email() {
    assert_eq!(identity(None, "email").display_name(), "alice@example.com");
    assert_eq!(identity(Some("   "), "email").display_name(), "alice@example.com");
}

#[test]
fn uses_email_provider_only_for_email() {
    assert!(identity(None, "email").uses_email_provider());
    assert!(!identity(None, "github").uses_email_provider());
}

#[test]
fn address_uses_camel_case_postal_code() {
    let address = Address { postal_code: "00-950".into(), ..Address::default() };
    let json = serde_json::to_value(&address).unwrap();
    assert_eq!(json["postalCode"], "00-950");
    assert!(json.get("postal_code").is_none());
}

#[test]
fn address_missing_fields_default_to_empty() {
    let address: Address = serde_json::from_str(r#"{"city":"Kraków"}"#).unwrap();
    assert_eq!(address.city, "Kraków");
    assert!(address.country.is_empty());
    assert!(address.postal_code.is_empty());
}

// =============================================================================
// SessionTokens / ProfileUpdate / OAuthProvider
// =============================================================================

#[test]
fn session_tokens_debug_redacts_secrets() {
    let tokens = SessionTokens { access_token: "secret-access".into(), refresh_token: Some("secret-refresh".into()) };
    let debug = format!("{tokens:?}");
    assert!(!debug.contains("secret-access"));
    assert!(!debug.contains("secret-refresh"));
    assert!(debug.contains("redacted"));
}

#[test]
fn profile_update_default_is_empty() {
    assert!(ProfileUpdate::default().is_empty());
    let update = ProfileUpdate { phone: Some("+48123456789".into()), ..ProfileUpdate::default() };
    assert!(!update.is_empty());
}

#[test]
fn oauth_provider_parse_is_case_insensitive() {
    assert_eq!(OAuthProvider::parse("GitHub"), Some(OAuthProvider::Github));
    assert_eq!(OAuthProvider::parse(" google "), Some(OAuthProvider::Google));
    assert_eq!(OAuthProvider::parse("gitlab"), None);
}

#[test]
fn oauth_provider_as_str_round_trips_through_parse() {
    for provider in OAuthProvider::ALL {
        assert_eq!(OAuthProvider::parse(provider.as_str()), Some(provider));
    }
}

// =============================================================================
// GatewayError
// =============================================================================

#[test]
fn auth_errors_display_verbatim() {
    let err = GatewayError::InvalidCredentials("Invalid login credentials".into());
    assert_eq!(err.to_string(), "Invalid login credentials");
    let err = GatewayError::Rejected("User already registered".into());
    assert_eq!(err.to_string(), "User already registered");
}

#[test]
fn only_transport_failures_are_transient() {
    assert!(GatewayError::Transient("timeout".into()).is_transient());
    assert!(!GatewayError::Rejected("nope".into()).is_transient());
    assert!(!GatewayError::Unexpected("garbage".into()).is_transient());
}

#[test]
fn partial_signup_mentions_identity() {
    let err = GatewayError::PartialSignup { identity_id: Uuid::nil(), reason: "insert failed".into() };
    let text = err.to_string();
    assert!(text.contains("00000000-0000-0000-0000-000000000000"));
    assert!(text.contains("insert failed"));
}

#[test]
fn partial_signup_user_message_hides_internals() {
    let id = Uuid::new_v4();
    let err = GatewayError::PartialSignup { identity_id: id, reason: "insert into users failed".into() };
    let text = err.user_message();
    assert!(!text.contains(&id.to_string()));
    assert!(!text.contains("insert into users"));
    assert!(text.contains("contact support"));
}

#[test]
fn gateway_user_messages_pass_through() {
    let err = GatewayError::Rejected("User already registered".into());
    assert_eq!(err.user_message(), "User already registered");
}
