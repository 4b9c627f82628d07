use super::*;

fn siblings(pairs: &[(&'static str, &str)]) -> Values {
    pairs.iter().map(|(k, v)| (*k, (*v).to_owned())).collect()
}

// =============================================================================
// Rule::check
// =============================================================================

#[test]
fn required_fails_only_on_empty() {
    let rule = Rule::Required("needed");
    let none = Values::new();
    assert_eq!(rule.check("", &none), Some("needed"));
    assert_eq!(rule.check(" ", &none), None);
    assert_eq!(rule.check("x", &none), None);
}

#[test]
fn min_chars_counts_characters_not_bytes() {
    let rule = Rule::MinChars(5, "too short");
    let none = Values::new();
    assert_eq!(rule.check("abcd", &none), Some("too short"));
    assert_eq!(rule.check("abcde", &none), None);
    assert_eq!(rule.check("żółty", &none), None);
}

#[test]
fn matches_compares_with_sibling() {
    let rule = Rule::Matches { field: "password", message: "Passwords do not match" };
    let values = siblings(&[("password", "hunter22")]);
    assert_eq!(rule.check("hunter22", &values), None);
    assert_eq!(rule.check("hunter23", &values), Some("Passwords do not match"));
    assert_eq!(rule.depends_on(), Some("password"));
}

#[test]
fn matches_missing_sibling_is_empty() {
    let rule = Rule::Matches { field: "password", message: "no" };
    assert_eq!(rule.check("", &Values::new()), None);
    assert_eq!(rule.check("x", &Values::new()), Some("no"));
}

#[test]
fn first_error_stops_at_first_failure() {
    let rules = [Rule::Required("required"), Rule::MinChars(5, "short")];
    let none = Values::new();
    assert_eq!(first_error(&rules, "", &none), Some("required"));
    assert_eq!(first_error(&rules, "abc", &none), Some("short"));
    assert_eq!(first_error(&rules, "abcdef", &none), None);
}

// =============================================================================
// looks_like_email
// =============================================================================

#[test]
fn email_accepts_common_shapes() {
    for ok in ["a@b.co", "first.last@mail.example.com", "x+tag@y.io", "hello a@b.c world"] {
        assert!(looks_like_email(ok), "{ok}");
    }
}

#[test]
fn email_rejects_malformed() {
    for bad in ["", "plain", "@b.co", "a@.co", "a@bco", "a@b.", "a @b.co", "a@ b.co"] {
        assert!(!looks_like_email(bad), "{bad}");
    }
}

// =============================================================================
// looks_like_phone
// =============================================================================

#[test]
fn phone_accepts_international_numbers() {
    for ok in ["+48123456789", "15551234567", "12", "+123456789012345"] {
        assert!(looks_like_phone(ok), "{ok}");
    }
}

#[test]
fn phone_rejects_malformed() {
    for bad in ["", "+", "1", "0123456", "+0123456", "+1234567890123456", "555-1234", "++1234", "12a4"] {
        assert!(!looks_like_phone(bad), "{bad}");
    }
}
