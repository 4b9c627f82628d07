use uuid::Uuid;

use super::*;
use crate::forms::FormState;

fn identity(provider: &str) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: "alice@example.com".into(),
        full_name: Some("Alice Liddell".into()),
        phone: Some("+48123456789".into()),
        address: Some(Address {
            country: "UK".into(),
            city: "Oxford".into(),
            street: "High St".into(),
            postal_code: "OX1".into(),
            state: "Oxon".into(),
        }),
        avatar_url: None,
        provider: provider.into(),
    }
}

#[test]
fn every_field_has_rules() {
    for schema in [&LOGIN, &REGISTER, &PROFILE_GENERAL, &ADDRESS] {
        assert!(schema.fields.iter().all(|f| !f.rules.is_empty()));
    }
}

#[test]
fn profile_initial_reads_identity() {
    let values = profile_initial(&identity("email"));
    assert_eq!(values["fullName"], "Alice Liddell");
    assert_eq!(values["phone"], "+48123456789");
    assert!(!FormState::new(&PROFILE_GENERAL, values).has_errors());
}

#[test]
fn profile_initial_missing_fields_are_blank() {
    let mut bare = identity("github");
    bare.full_name = None;
    bare.phone = None;
    let values = profile_initial(&bare);
    assert_eq!(values["fullName"], "");
    assert_eq!(values["phone"], "");
}

#[test]
fn email_locked_for_social_identities() {
    assert!(profile_locked(&identity("email")).is_empty());
    assert_eq!(profile_locked(&identity("github")), &["email"]);
}

#[test]
fn profile_update_sends_only_changed_fields() {
    let who = identity("email");
    let mut values = profile_initial(&who);
    values.insert("phone", "+48999999999".into());
    let update = profile_update(&values, &who);
    assert_eq!(update, ProfileUpdate { phone: Some("+48999999999".into()), ..ProfileUpdate::default() });
}

#[test]
fn profile_update_unchanged_is_empty() {
    let who = identity("email");
    assert!(profile_update(&profile_initial(&who), &who).is_empty());
}

#[test]
fn profile_update_never_sends_email_for_social_identity() {
    let who = identity("google");
    let mut values = profile_initial(&who);
    values.insert("email", "other@example.com".into());
    assert!(profile_update(&values, &who).email.is_none());

    let who = identity("email");
    assert_eq!(profile_update(&values, &who).email.as_deref(), Some("other@example.com"));
}

#[test]
fn address_round_trips_through_values() {
    let who = identity("email");
    let address = address_from(&address_initial(&who));
    assert_eq!(Some(address), who.address);
}

#[test]
fn address_initial_without_address_is_blank() {
    let mut who = identity("email");
    who.address = None;
    assert!(address_initial(&who).values().all(String::is_empty));
}
