//! Form state machine and declarative validation.
//!
//! DESIGN
//! ======
//! Each form is a static `FormSchema`: an ordered list of fields, each with
//! an ordered list of pure rules. `FormState` tracks one filled-in instance
//! of a schema. Fields start `Pristine`; any change or blur re-runs the
//! field's rules and moves it to `Valid` or `Invalid`. When a field changes,
//! fields whose rules read it are re-validated too, unless still pristine.
//!
//! Submission is gated by `begin_submit`, which refuses while a submission
//! is in flight, while any field fails, or (update forms only) while the
//! values equal the initial ones. The outcome of the gateway call is fed
//! back through `succeed`, which yields the schema's saved notice for the
//! redirect, or `fail`, which yields the error toast for the re-render.

pub mod rules;
pub mod schemas;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::services::notice::{Flash, Notification};

pub use rules::Rule;

/// Field values keyed by field name.
pub type Values = BTreeMap<&'static str, String>;

// =============================================================================
// SCHEMA
// =============================================================================

#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub autocomplete: &'static str,
    pub rules: &'static [Rule],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    /// Starts empty; may be submitted without edits.
    Create,
    /// Starts from stored values; must differ from them to submit.
    Update,
}

#[derive(Debug)]
pub struct FormSchema {
    pub kind: FormKind,
    /// Notice carried across the redirect after a successful submit.
    pub saved: Option<Flash>,
    pub fields: &'static [FieldSpec],
}

impl FormSchema {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields with a rule that reads `name`.
    pub fn dependents_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldSpec> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.rules.iter().any(|r| r.depends_on() == Some(name)))
    }

    /// All fields set to the empty string.
    #[must_use]
    pub fn blank(&self) -> Values {
        self.fields.iter().map(|f| (f.name, String::new())).collect()
    }
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    Pristine,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Editing,
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitBlocked {
    #[error("form has invalid fields")]
    Invalid,
    #[error("nothing changed")]
    Unchanged,
    #[error("a submission is already in flight")]
    InFlight,
}

#[derive(Debug, Clone)]
pub struct FormState {
    schema: &'static FormSchema,
    initial: Values,
    values: Values,
    errors: BTreeMap<&'static str, &'static str>,
    status: BTreeMap<&'static str, FieldStatus>,
    locked: BTreeSet<&'static str>,
    phase: Phase,
}

impl FormState {
    /// Fresh form. Missing initial values default to empty.
    #[must_use]
    pub fn new(schema: &'static FormSchema, initial: Values) -> Self {
        let mut values = schema.blank();
        for (name, value) in initial {
            if schema.field(name).is_some() {
                values.insert(name, value);
            }
        }
        let status = schema.fields.iter().map(|f| (f.name, FieldStatus::Pristine)).collect();
        Self {
            schema,
            initial: values.clone(),
            values,
            errors: BTreeMap::new(),
            status,
            locked: BTreeSet::new(),
            phase: Phase::Editing,
        }
    }

    /// Replay a posted form: every submitted field is changed in schema
    /// order, the way a user would have typed it. Unknown keys are ignored.
    #[must_use]
    pub fn from_submission(
        schema: &'static FormSchema,
        initial: Values,
        locked: &[&'static str],
        submitted: &HashMap<String, String>,
    ) -> Self {
        let mut form = Self::new(schema, initial);
        for name in locked {
            form.lock(name);
        }
        for field in schema.fields {
            let value = submitted.get(field.name).cloned();
            match value {
                Some(value) => form.change(field.name, value),
                None => form.blur(field.name),
            }
        }
        form
    }

    /// Make a field read-only. Changes to it are ignored.
    pub fn lock(&mut self, name: &str) {
        let schema = self.schema;
        if let Some(field) = schema.field(name) {
            self.locked.insert(field.name);
        }
    }

    #[must_use]
    pub fn is_locked(&self, name: &str) -> bool {
        self.locked.contains(name)
    }

    #[must_use]
    pub fn schema(&self) -> &'static FormSchema {
        self.schema
    }

    /// Set a field's value and re-validate it and its non-pristine dependents.
    pub fn change(&mut self, name: &str, value: String) {
        let schema = self.schema;
        let Some(field) = schema.field(name) else {
            return;
        };
        if self.locked.contains(field.name) {
            self.validate(field);
            return;
        }
        self.values.insert(field.name, value);
        self.validate(field);

        for dependent in schema.dependents_of(field.name) {
            if self.status(dependent.name) != FieldStatus::Pristine {
                self.validate(dependent);
            }
        }
    }

    /// Leaving a field validates it even if it was never changed.
    pub fn blur(&mut self, name: &str) {
        let schema = self.schema;
        if let Some(field) = schema.field(name) {
            self.validate(field);
        }
    }

    fn validate(&mut self, field: &'static FieldSpec) {
        match rules::first_error(field.rules, self.value(field.name), &self.values) {
            Some(message) => {
                self.errors.insert(field.name, message);
                self.status.insert(field.name, FieldStatus::Invalid);
            }
            None => {
                self.errors.remove(field.name);
                self.status.insert(field.name, FieldStatus::Valid);
            }
        }
    }

    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map_or("", String::as_str)
    }

    #[must_use]
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Messages to display under a field. Pristine fields show none.
    #[must_use]
    pub fn errors(&self, name: &str) -> Vec<&'static str> {
        self.errors.get(name).copied().into_iter().collect()
    }

    #[must_use]
    pub fn status(&self, name: &str) -> FieldStatus {
        self.status.get(name).copied().unwrap_or(FieldStatus::Pristine)
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.values != self.initial
    }

    /// Whether any field fails its rules, pristine fields included.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.schema
            .fields
            .iter()
            .any(|f| rules::first_error(f.rules, self.value(f.name), &self.values).is_some())
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.submit_blocker().is_none()
    }

    fn submit_blocker(&self) -> Option<SubmitBlocked> {
        if self.phase == Phase::Submitting {
            return Some(SubmitBlocked::InFlight);
        }
        if self.has_errors() {
            return Some(SubmitBlocked::Invalid);
        }
        if self.schema.kind == FormKind::Update && !self.is_dirty() {
            return Some(SubmitBlocked::Unchanged);
        }
        None
    }

    /// Enter `Submitting`. Every field is validated first so the re-rendered
    /// form shows all messages when submission is refused.
    ///
    /// # Errors
    ///
    /// Returns why the form cannot be submitted right now.
    pub fn begin_submit(&mut self) -> Result<(), SubmitBlocked> {
        if self.phase == Phase::Submitting {
            return Err(SubmitBlocked::InFlight);
        }
        for field in self.schema.fields {
            self.validate(field);
        }
        if let Some(blocked) = self.submit_blocker() {
            return Err(blocked);
        }
        self.phase = Phase::Submitting;
        Ok(())
    }

    /// The gateway accepted the submission. The submitted values become the
    /// new baseline.
    pub fn succeed(&mut self) -> Option<Flash> {
        self.phase = Phase::Submitted;
        self.initial = self.values.clone();
        self.schema.saved
    }

    /// Value the form started from, for dirtiness checks in the browser.
    #[must_use]
    pub fn initial(&self, name: &str) -> &str {
        self.initial.get(name).map_or("", String::as_str)
    }

    /// The gateway refused the submission. The form returns to editing with
    /// the user's values intact.
    pub fn fail(&mut self, message: impl Into<String>) -> Notification {
        self.phase = Phase::Editing;
        Notification::error(message)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
