//! Pure validation rules.
//!
//! A rule looks at one field's value (and, for cross-field rules, its
//! siblings) and returns the message to show when the value fails it.

use super::Values;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Fails on the empty string.
    Required(&'static str),
    /// Fails when the value has fewer characters than the minimum.
    MinChars(usize, &'static str),
    /// Fails unless some word looks like `x@y.z`.
    Email(&'static str),
    /// Fails unless the value is an E.164-style number: optional `+`, a
    /// non-zero leading digit, 2 to 15 digits in total.
    Phone(&'static str),
    /// Fails unless the value equals the sibling field's value.
    Matches { field: &'static str, message: &'static str },
}

impl Rule {
    #[must_use]
    pub fn check(&self, value: &str, siblings: &Values) -> Option<&'static str> {
        let passes = match *self {
            Self::Required(_) => !value.is_empty(),
            Self::MinChars(min, _) => value.chars().count() >= min,
            Self::Email(_) => looks_like_email(value),
            Self::Phone(_) => looks_like_phone(value),
            Self::Matches { field, .. } => siblings.get(field).map(String::as_str).unwrap_or_default() == value,
        };
        if passes { None } else { Some(self.message()) }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match *self {
            Self::Required(m) | Self::MinChars(_, m) | Self::Email(m) | Self::Phone(m) => m,
            Self::Matches { message, .. } => message,
        }
    }

    /// Sibling field this rule reads, if any.
    #[must_use]
    pub fn depends_on(&self) -> Option<&'static str> {
        match *self {
            Self::Matches { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Run rules in order; the first failure wins.
#[must_use]
pub fn first_error(rules: &[Rule], value: &str, siblings: &Values) -> Option<&'static str> {
    rules.iter().find_map(|rule| rule.check(value, siblings))
}

/// Unanchored `\S+@\S+\.\S+`.
#[must_use]
pub fn looks_like_email(value: &str) -> bool {
    value.split_whitespace().any(|word| {
        word.match_indices('@').any(|(at, _)| {
            if at == 0 {
                return false;
            }
            let domain = &word[at + 1..];
            domain
                .match_indices('.')
                .any(|(dot, _)| dot > 0 && dot + 1 < domain.len())
        })
    })
}

/// Anchored `^\+?[1-9]\d{1,14}$`.
#[must_use]
pub fn looks_like_phone(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    let mut chars = digits.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !('1'..='9').contains(&first) {
        return false;
    }
    let rest = chars.as_str();
    (1..=14).contains(&rest.len()) && rest.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
#[path = "rules_test.rs"]
mod tests;
