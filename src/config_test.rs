use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

const GATEWAY_VARS: [(&str, &str); 3] = [
    ("SUPABASE_URL", "https://project.supabase.co/"),
    ("SUPABASE_ANON_KEY", "anon"),
    ("SUPABASE_SERVICE_KEY", "service"),
];

// =============================================================================
// parse_bool
// =============================================================================

#[test]
fn parse_bool_true_variants() {
    for val in ["1", "true", "yes", "on", "TRUE", "  On  "] {
        assert_eq!(parse_bool(val), Some(true), "expected true for {val:?}");
    }
}

#[test]
fn parse_bool_false_variants() {
    for val in ["0", "false", "no", "off", "False"] {
        assert_eq!(parse_bool(val), Some(false), "expected false for {val:?}");
    }
}

#[test]
fn parse_bool_invalid_returns_none() {
    assert_eq!(parse_bool("maybe"), None);
    assert_eq!(parse_bool(""), None);
}

// =============================================================================
// AppConfig::from_lookup
// =============================================================================

#[test]
fn defaults_without_any_vars() {
    let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.site_url, "http://localhost:3000");
    assert!(!config.cookie_secure);
    assert!(config.gateway.is_none());
}

#[test]
fn site_url_defaults_to_configured_port() {
    let config = AppConfig::from_lookup(lookup_from(&[("PORT", "8080")])).unwrap();
    assert_eq!(config.site_url, "http://localhost:8080");
}

#[test]
fn invalid_port_is_an_error() {
    let err = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPort(_)));
}

#[test]
fn site_url_without_scheme_is_an_error() {
    let err = AppConfig::from_lookup(lookup_from(&[("SITE_URL", "shop.example")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSiteUrl(_)));
}

#[test]
fn cookie_secure_inferred_from_https_site_url() {
    let config = AppConfig::from_lookup(lookup_from(&[("SITE_URL", "https://shop.example/")])).unwrap();
    assert!(config.cookie_secure);
    assert_eq!(config.site_url, "https://shop.example");
}

#[test]
fn cookie_secure_explicit_value_wins() {
    let config = AppConfig::from_lookup(lookup_from(&[
        ("SITE_URL", "https://shop.example"),
        ("COOKIE_SECURE", "false"),
    ]))
    .unwrap();
    assert!(!config.cookie_secure);
}

#[test]
fn oauth_callback_url_uses_site_url() {
    let config = AppConfig::from_lookup(lookup_from(&[("SITE_URL", "https://shop.example")])).unwrap();
    assert_eq!(config.oauth_callback_url(), "https://shop.example/auth/callback");
}

// =============================================================================
// gateway
// =============================================================================

#[test]
fn gateway_configured_when_all_vars_set() {
    let config = AppConfig::from_lookup(lookup_from(&GATEWAY_VARS)).unwrap();
    let gateway = config.gateway.unwrap();
    assert_eq!(gateway.url, "https://project.supabase.co");
    assert_eq!(gateway.anon_key, "anon");
    assert_eq!(gateway.service_key, "service");
    assert_eq!(gateway.timeouts.request_secs, DEFAULT_GATEWAY_REQUEST_TIMEOUT_SECS);
    assert_eq!(gateway.timeouts.connect_secs, DEFAULT_GATEWAY_CONNECT_TIMEOUT_SECS);
}

#[test]
fn gateway_missing_any_var_is_none() {
    for skip in 0..GATEWAY_VARS.len() {
        let pairs: Vec<(&str, &str)> = GATEWAY_VARS
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, pair)| *pair)
            .collect();
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(config.gateway.is_none(), "expected no gateway without {}", GATEWAY_VARS[skip].0);
    }
}

#[test]
fn gateway_blank_var_counts_as_missing() {
    let config = AppConfig::from_lookup(lookup_from(&[
        ("SUPABASE_URL", "https://project.supabase.co"),
        ("SUPABASE_ANON_KEY", "   "),
        ("SUPABASE_SERVICE_KEY", "service"),
    ]))
    .unwrap();
    assert!(config.gateway.is_none());
}

#[test]
fn gateway_timeouts_parsed_with_fallback() {
    let mut pairs = GATEWAY_VARS.to_vec();
    pairs.push(("GATEWAY_REQUEST_TIMEOUT_SECS", "5"));
    pairs.push(("GATEWAY_CONNECT_TIMEOUT_SECS", "soon"));
    let gateway = AppConfig::from_lookup(lookup_from(&pairs))
        .unwrap()
        .gateway
        .unwrap();
    assert_eq!(gateway.timeouts.request_secs, 5);
    assert_eq!(gateway.timeouts.connect_secs, DEFAULT_GATEWAY_CONNECT_TIMEOUT_SECS);
}

#[test]
fn gateway_debug_hides_keys() {
    let gateway = AppConfig::from_lookup(lookup_from(&GATEWAY_VARS))
        .unwrap()
        .gateway
        .unwrap();
    let debug = format!("{gateway:?}");
    assert!(!debug.contains("service\""));
    assert!(!debug.contains("anon\""));
    assert!(debug.contains("project.supabase.co"));
}
