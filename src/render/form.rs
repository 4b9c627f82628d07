//! Validated forms.
//!
//! The server renders a `FormState` as-is: values, per-field messages, and
//! the submit button's disabled state. Each input also carries its rule
//! table as JSON so `assets/form.js` can re-run the same rules while the
//! user types, and lock the button once a submission is in flight.

use leptos::prelude::*;
use serde_json::{Value, json};

use crate::forms::{FieldStatus, FormKind, FormState, Rule};

pub const FORM_SCRIPT: &str = include_str!("../../assets/form.js");

/// One input, flattened out of the form state for rendering.
#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub autocomplete: &'static str,
    pub value: String,
    pub initial: String,
    pub errors: Vec<&'static str>,
    pub touched: bool,
    pub invalid: bool,
    pub locked: bool,
    pub rules: String,
}

#[derive(Debug, Clone)]
pub struct FormView {
    pub action: &'static str,
    pub submit_label: &'static str,
    pub update: bool,
    pub can_submit: bool,
    pub fields: Vec<FieldView>,
}

impl FormView {
    #[must_use]
    pub fn new(state: &FormState, action: &'static str, submit_label: &'static str) -> Self {
        let schema = state.schema();
        let mut blanked_secret = false;
        let fields = schema
            .fields
            .iter()
            .map(|spec| {
                // Password values are never echoed back.
                let secret = spec.input_type == "password";
                blanked_secret |= secret && !state.value(spec.name).is_empty();
                let status = state.status(spec.name);
                FieldView {
                    name: spec.name,
                    label: spec.label,
                    input_type: spec.input_type,
                    autocomplete: spec.autocomplete,
                    value: if secret { String::new() } else { state.value(spec.name).to_owned() },
                    initial: if secret { String::new() } else { state.initial(spec.name).to_owned() },
                    errors: state.errors(spec.name),
                    touched: status != FieldStatus::Pristine,
                    invalid: status == FieldStatus::Invalid,
                    locked: state.is_locked(spec.name),
                    rules: rules_json(spec.rules),
                }
            })
            .collect();
        Self {
            action,
            submit_label,
            update: schema.kind == FormKind::Update,
            // A blanked password field is empty in the browser, so the
            // rendered form cannot be submitted as-is.
            can_submit: state.can_submit() && !blanked_secret,
            fields,
        }
    }
}

fn rule_json(rule: &Rule) -> Value {
    match *rule {
        Rule::Required(message) => json!({ "kind": "required", "message": message }),
        Rule::MinChars(min, message) => json!({ "kind": "minChars", "min": min, "message": message }),
        Rule::Email(message) => json!({ "kind": "email", "message": message }),
        Rule::Phone(message) => json!({ "kind": "phone", "message": message }),
        Rule::Matches { field, message } => json!({ "kind": "matches", "field": field, "message": message }),
    }
}

/// Rule table in the shape `assets/form.js` reads from `data-rules`.
#[must_use]
pub fn rules_json(rules: &[Rule]) -> String {
    Value::Array(rules.iter().map(rule_json).collect()).to_string()
}

#[component]
pub fn ValidatedForm(form: FormView) -> impl IntoView {
    let FormView { action, submit_label, update, can_submit, fields } = form;
    view! {
        <form
            method="post"
            action=action
            novalidate=true
            data-validated="true"
            data-update=update.then_some("true")
        >
            {fields.into_iter().map(|field| view! { <Field field=field /> }).collect_view()}
            <button type="submit" disabled=!can_submit>
                {submit_label}
            </button>
        </form>
    }
}

#[component]
fn Field(field: FieldView) -> impl IntoView {
    let errors_id = format!("{}-errors", field.name);
    view! {
        <label for=field.name>{field.label}</label>
        <input
            id=field.name
            name=field.name
            type=field.input_type
            autocomplete=field.autocomplete
            value=field.value
            readonly=field.locked
            aria-invalid=field.invalid.then_some("true")
            aria-describedby=errors_id.clone()
            data-touched=field.touched.then_some("true")
            data-initial=field.initial
            data-rules=field.rules
        />
        <div class="errors" id=errors_id>
            {field.errors.into_iter().map(|message| view! { <div>{message}</div> }).collect_view()}
        </div>
    }
}

#[cfg(test)]
#[path = "form_test.rs"]
mod tests;
