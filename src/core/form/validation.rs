//! Per-step validation of the registration form.
//!
//! Everything here is a pure function of the field values, so the rules are
//! testable without a renderer.

use std::sync::LazyLock;

use regex::Regex;

use super::fields::{fields_for_step, FieldKind, FieldSpec, FormStep};
use super::values::FormValues;

pub const REQUIRED_MESSAGE: &str = "Ce champ est obligatoire";
pub const TERMS_MESSAGE: &str = "Vous devez accepter les conditions";
pub const EMAIL_MESSAGE: &str = "Adresse email invalide";
pub const PHONE_MESSAGE: &str = "Numéro de téléphone invalide";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9\s+()-]{8,}$").expect("valid phone regex"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: FormStep,
    pub errors: Vec<FieldError>,
    /// Every field the step looked at, valid or not.
    pub checked: Vec<&'static str>,
}

impl StepReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, field: &str) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message)
    }
}

/// Format rule for a non-empty value, as applied when a field loses focus.
pub fn check_format(kind: FieldKind, value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return None;
    }
    match kind {
        FieldKind::Email if !is_valid_email(value) => Some(EMAIL_MESSAGE),
        FieldKind::Phone if !is_valid_phone(value) => Some(PHONE_MESSAGE),
        _ => None,
    }
}

/// Full check of one field: presence when required, then format.
pub fn check_field(spec: &FieldSpec, values: &FormValues) -> Option<FieldError> {
    let message = match spec.kind {
        FieldKind::Checkbox => {
            (spec.required && !values.is_checked(spec.name)).then_some(TERMS_MESSAGE)
        }
        FieldKind::File => {
            (spec.required && values.file(spec.name).is_none()).then_some(REQUIRED_MESSAGE)
        }
        kind => {
            let value = values.text(spec.name);
            if spec.required && value.trim().is_empty() {
                Some(REQUIRED_MESSAGE)
            } else {
                check_format(kind, value.trim())
            }
        }
    };

    message.map(|message| FieldError {
        field: spec.name,
        message,
    })
}

pub fn validate_step(step: FormStep, values: &FormValues) -> StepReport {
    let mut report = StepReport {
        step,
        errors: Vec::new(),
        checked: Vec::new(),
    };
    for spec in fields_for_step(step) {
        report.checked.push(spec.name);
        if let Some(error) = check_field(spec, values) {
            report.errors.push(error);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::form::values::FieldValue;

    fn text(values: &mut FormValues, name: &str, value: &str) {
        values.set(name, FieldValue::Text(value.to_string()));
    }

    fn complete_personal() -> FormValues {
        let mut values = FormValues::new();
        text(&mut values, "nom", "Doe");
        text(&mut values, "prenom", "Jane");
        text(&mut values, "email", "jane.doe@example.cm");
        text(&mut values, "telephone", "+237 6 99 00 11 22");
        text(&mut values, "dateNaissance", "2004-05-17");
        text(&mut values, "lieuNaissance", "Yaoundé");
        text(&mut values, "adresse", "Bastos, Yaoundé");
        values
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("a@@b.c"));
    }

    #[test]
    fn phone_shape() {
        assert!(is_valid_phone("699001122"));
        assert!(is_valid_phone("+237 (6) 99-00-11"));
        assert!(!is_valid_phone("1234567"));
        assert!(!is_valid_phone("06 99 ab 11 22"));
        assert!(!is_valid_phone("١٢٣٤٥٦٧٨"));
    }

    #[test]
    fn complete_personal_step_passes() {
        let report = validate_step(FormStep::Personal, &complete_personal());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert_eq!(report.checked.len(), 7);
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let mut values = complete_personal();
        text(&mut values, "nom", "   ");
        let report = validate_step(FormStep::Personal, &values);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.error_for("nom"), Some(REQUIRED_MESSAGE));
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let mut values = FormValues::new();
        text(&mut values, "email", "not-an-email");
        text(&mut values, "telephone", "12");
        let report = validate_step(FormStep::Personal, &values);
        assert_eq!(report.errors.len(), 7);
        assert_eq!(report.error_for("email"), Some(EMAIL_MESSAGE));
        assert_eq!(report.error_for("telephone"), Some(PHONE_MESSAGE));
        assert_eq!(report.error_for("adresse"), Some(REQUIRED_MESSAGE));
    }

    #[test]
    fn program_step_needs_both_choices_but_not_motivation() {
        let mut values = FormValues::new();
        text(&mut values, "programme", "M-IA");
        let report = validate_step(FormStep::Program, &values);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.error_for("niveau"), Some(REQUIRED_MESSAGE));

        text(&mut values, "niveau", "Master");
        assert!(validate_step(FormStep::Program, &values).is_valid());
    }

    #[test]
    fn documents_are_optional() {
        assert!(validate_step(FormStep::Documents, &FormValues::new()).is_valid());
    }

    #[test]
    fn review_step_requires_terms_checkbox() {
        let mut values = FormValues::new();
        values.set("newsletter", FieldValue::Checked(true));
        let report = validate_step(FormStep::Review, &values);
        assert_eq!(report.error_for("acceptTerms"), Some(TERMS_MESSAGE));
        assert_eq!(report.errors.len(), 1);

        values.set("acceptTerms", FieldValue::Checked(true));
        assert!(validate_step(FormStep::Review, &values).is_valid());
    }

    #[test]
    fn format_checks_skip_empty_values() {
        assert_eq!(check_format(FieldKind::Email, ""), None);
        assert_eq!(check_format(FieldKind::Email, "x"), Some(EMAIL_MESSAGE));
        assert_eq!(check_format(FieldKind::Phone, "abc"), Some(PHONE_MESSAGE));
        assert_eq!(check_format(FieldKind::Text, "anything"), None);
    }
}
