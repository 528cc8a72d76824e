use std::collections::BTreeMap;

use shared::error::FieldErrors;

/// Field values and inline errors of one screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDraft {
    values: BTreeMap<&'static str, String>,
    errors: FieldErrors,
}

impl FormDraft {
    pub fn new(fields: &[&'static str]) -> Self {
        Self {
            values: fields.iter().map(|f| (*f, String::new())).collect(),
            errors: FieldErrors::new(),
        }
    }

    /// Empty string for unknown fields.
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    /// Edits a known field and clears its error. Unknown fields are ignored.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> bool {
        let Some(slot) = self.values.get_mut(field) else {
            return false;
        };
        *slot = value.into();
        self.errors.remove(field);
        true
    }

    pub fn clear_values(&mut self) {
        self.values.values_mut().for_each(String::clear);
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn replace_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
    }

    /// Server-side field errors win over local ones for the same field.
    pub fn merge_errors(&mut self, errors: &FieldErrors) {
        self.errors
            .extend(errors.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}
