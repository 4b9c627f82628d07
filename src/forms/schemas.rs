//! The storefront's forms and their validation tables.

use super::{FieldSpec, FormKind, FormSchema, Rule, Values};
use crate::gateway::{Address, Identity, ProfileUpdate};
use crate::services::notice::Flash;

const EMAIL_REQUIRED: Rule = Rule::Required("An email is required");
const PASSWORD_SHORT: &str = "Password must be at least 5 characters";

const SIGN_IN_EMAIL: FieldSpec = FieldSpec {
    name: "email",
    label: "Email",
    input_type: "email",
    autocomplete: "email",
    rules: &[EMAIL_REQUIRED, Rule::MinChars(5, "Email must be at least 5 characters")],
};

pub static LOGIN: FormSchema = FormSchema {
    kind: FormKind::Create,
    saved: None,
    fields: &[
        SIGN_IN_EMAIL,
        FieldSpec {
            name: "password",
            label: "Password",
            input_type: "password",
            autocomplete: "current-password",
            rules: &[Rule::Required("A password is required"), Rule::MinChars(5, PASSWORD_SHORT)],
        },
    ],
};

pub static REGISTER: FormSchema = FormSchema {
    kind: FormKind::Create,
    saved: Some(Flash::SignedUp),
    fields: &[
        SIGN_IN_EMAIL,
        FieldSpec {
            name: "password",
            label: "Password",
            input_type: "password",
            autocomplete: "new-password",
            rules: &[Rule::Required("A password is required"), Rule::MinChars(5, PASSWORD_SHORT)],
        },
        FieldSpec {
            name: "repeatPassword",
            label: "Repeat Password",
            input_type: "password",
            autocomplete: "new-password",
            rules: &[
                Rule::Required("Please repeat your password"),
                Rule::MinChars(5, PASSWORD_SHORT),
                Rule::Matches { field: "password", message: "Passwords do not match" },
            ],
        },
    ],
};

pub static PROFILE_GENERAL: FormSchema = FormSchema {
    kind: FormKind::Update,
    saved: Some(Flash::ProfileUpdated),
    fields: &[
        FieldSpec {
            name: "fullName",
            label: "Full name",
            input_type: "text",
            autocomplete: "name",
            rules: &[
                Rule::Required("A full name is required"),
                Rule::MinChars(5, "Full name must be at least 5 characters"),
            ],
        },
        FieldSpec {
            name: "email",
            label: "Email",
            input_type: "email",
            autocomplete: "email",
            rules: &[EMAIL_REQUIRED, Rule::Email("Email must be a valid email address")],
        },
        FieldSpec {
            name: "phone",
            label: "Phone",
            input_type: "tel",
            autocomplete: "tel",
            rules: &[
                Rule::Required("A phone number is required"),
                Rule::Phone("Phone number must be a valid international phone number"),
            ],
        },
    ],
};

pub static ADDRESS: FormSchema = FormSchema {
    kind: FormKind::Update,
    saved: Some(Flash::AddressUpdated),
    fields: &[
        FieldSpec {
            name: "country",
            label: "Country",
            input_type: "text",
            autocomplete: "country-name",
            rules: &[
                Rule::Required("A country is required"),
                Rule::MinChars(2, "Country must be at least 2 characters"),
            ],
        },
        FieldSpec {
            name: "city",
            label: "City",
            input_type: "text",
            autocomplete: "address-level2",
            rules: &[Rule::Required("A city is required"), Rule::MinChars(2, "City must be at least 2 characters")],
        },
        FieldSpec {
            name: "street",
            label: "Street",
            input_type: "text",
            autocomplete: "street-address",
            rules: &[Rule::Required("A street is required"), Rule::MinChars(2, "Street must be at least 2 characters")],
        },
        FieldSpec {
            name: "postalCode",
            label: "Postal code",
            input_type: "text",
            autocomplete: "postal-code",
            rules: &[
                Rule::Required("A postal code is required"),
                Rule::MinChars(2, "Postal code must be at least 2 characters"),
            ],
        },
        FieldSpec {
            name: "state",
            label: "State",
            input_type: "text",
            autocomplete: "address-level1",
            rules: &[Rule::Required("A state is required"), Rule::MinChars(2, "State must be at least 2 characters")],
        },
    ],
};

// =============================================================================
// IDENTITY <-> VALUES
// =============================================================================

#[must_use]
pub fn profile_initial(identity: &Identity) -> Values {
    Values::from([
        ("fullName", identity.full_name.clone().unwrap_or_default()),
        ("email", identity.email.clone()),
        ("phone", identity.phone.clone().unwrap_or_default()),
    ])
}

/// Fields of the general form a given identity may not edit.
#[must_use]
pub fn profile_locked(identity: &Identity) -> &'static [&'static str] {
    if identity.uses_email_provider() { &[] } else { &["email"] }
}

#[must_use]
pub fn address_initial(identity: &Identity) -> Values {
    let address = identity.address.clone().unwrap_or_default();
    Values::from([
        ("country", address.country),
        ("city", address.city),
        ("street", address.street),
        ("postalCode", address.postal_code),
        ("state", address.state),
    ])
}

/// Update carrying only the general-form fields that differ from the
/// identity. Email is only ever sent for password identities.
#[must_use]
pub fn profile_update(values: &Values, identity: &Identity) -> ProfileUpdate {
    let get = |name: &str| values.get(name).cloned().unwrap_or_default();
    let changed = |new: &String, old: Option<&str>| (Some(new.as_str()) != old).then(|| new.clone());

    let full_name = get("fullName");
    let phone = get("phone");
    let email = get("email");
    ProfileUpdate {
        email: identity
            .uses_email_provider()
            .then(|| changed(&email, Some(identity.email.as_str())))
            .flatten(),
        full_name: changed(&full_name, identity.full_name.as_deref()),
        phone: changed(&phone, identity.phone.as_deref()),
        address: None,
    }
}

#[must_use]
pub fn address_from(values: &Values) -> Address {
    let get = |name: &str| values.get(name).cloned().unwrap_or_default();
    Address {
        country: get("country"),
        city: get("city"),
        street: get("street"),
        postal_code: get("postalCode"),
        state: get("state"),
    }
}

#[cfg(test)]
#[path = "schemas_test.rs"]
mod tests;
