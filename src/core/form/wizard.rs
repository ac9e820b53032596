use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use super::fields::{find_field, FieldKind, FieldSpec, FormStep, FIELDS, STEP_COUNT};
use super::upload::{ensure_slot, UploadError, UploadSource};
use super::validation::{check_format, validate_step, StepReport};
use super::values::{FieldValue, FormValues};
use crate::api::{ApiError, Backend, RegistrationPayload};
use crate::core::notify::Notifications;

pub const INCOMPLETE_STEP_MESSAGE: &str = "Veuillez remplir tous les champs obligatoires";
pub const TERMS_NOT_ACCEPTED_MESSAGE: &str = "Veuillez accepter les conditions générales";
pub const SUBMIT_FAILED_MESSAGE: &str = "Erreur lors de la soumission du formulaire";
pub const SUBMIT_OK_MESSAGE: &str = "Préinscription enregistrée avec succès !";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("field `{field}` does not take {attempted}")]
    WrongKind {
        field: &'static str,
        attempted: &'static str,
    },

    #[error("`{value}` is not an option of `{field}`")]
    UnknownOption { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("the form can only be submitted from the last step")]
    NotOnLastStep,

    #[error("a submission is already in progress")]
    InFlight,

    #[error("{} field(s) need attention", .0.errors.len())]
    Invalid(StepReport),

    #[error(transparent)]
    Remote(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Moved(FormStep),
    /// Validation failed; the wizard stayed where it was.
    Blocked(StepReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Active,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavControls {
    pub prev_visible: bool,
    pub next_visible: bool,
    pub submit_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryItem {
    pub label: &'static str,
    pub value: String,
}

/// A validated payload handed out by `begin_submit`, to be settled with
/// `finish_submit` once the request completes.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub payload: RegistrationPayload,
}

/// The four-step registration form.
///
/// Field values exist only here; the review summary is recomputed from them
/// whenever the last step is entered.
#[derive(Debug)]
pub struct FormWizard {
    step: FormStep,
    values: FormValues,
    errors: BTreeMap<&'static str, &'static str>,
    summary: Vec<SummaryItem>,
    submitting: bool,
    confirmation: Option<String>,
}

impl Default for FormWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl FormWizard {
    pub fn new() -> Self {
        Self {
            step: FormStep::Personal,
            values: FormValues::new(),
            errors: BTreeMap::new(),
            summary: Vec::new(),
            submitting: false,
            confirmation: None,
        }
    }

    pub fn current_step(&self) -> FormStep {
        self.step
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn error(&self, field: &str) -> Option<&'static str> {
        self.errors.get(field).copied()
    }

    pub fn errors(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.errors.iter().map(|(field, message)| (*field, *message))
    }

    pub fn summary(&self) -> &[SummaryItem] {
        &self.summary
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Confirmation shown after a successful submission, until dismissed.
    pub fn confirmation(&self) -> Option<&str> {
        self.confirmation.as_deref()
    }

    pub fn dismiss_confirmation(&mut self) {
        self.confirmation = None;
    }

    pub fn progress_percent(&self) -> u8 {
        self.step.number() * 100 / STEP_COUNT
    }

    pub fn step_status(&self, step: FormStep) -> StepStatus {
        match step.cmp(&self.step) {
            std::cmp::Ordering::Less => StepStatus::Completed,
            std::cmp::Ordering::Equal => StepStatus::Active,
            std::cmp::Ordering::Greater => StepStatus::Pending,
        }
    }

    pub fn controls(&self) -> NavControls {
        NavControls {
            prev_visible: !self.step.is_first(),
            next_visible: !self.step.is_last(),
            submit_visible: self.step.is_last(),
        }
    }

    pub fn motivation_count(&self) -> usize {
        self.values.text("motivation").chars().count()
    }

    fn spec(name: &str) -> Result<&'static FieldSpec, FormError> {
        find_field(name).ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    /// Set a free-text field. Text areas are cut to their maximum length.
    pub fn set_text(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        let spec = Self::spec(name)?;
        let value = match spec.kind {
            FieldKind::TextArea { max_chars } => value.chars().take(max_chars).collect(),
            kind if kind.is_textual() => value.to_string(),
            _ => {
                return Err(FormError::WrongKind {
                    field: spec.name,
                    attempted: "text",
                })
            }
        };
        self.update(spec, FieldValue::Text(value));
        Ok(())
    }

    /// Pick one option of a radio group or select.
    pub fn select(&mut self, name: &str, option: &str) -> Result<(), FormError> {
        let spec = Self::spec(name)?;
        if !spec.kind.is_choice() {
            return Err(FormError::WrongKind {
                field: spec.name,
                attempted: "a choice",
            });
        }
        if !spec.kind.options().contains(&option) {
            return Err(FormError::UnknownOption {
                field: spec.name,
                value: option.to_string(),
            });
        }
        self.update(spec, FieldValue::Text(option.to_string()));
        Ok(())
    }

    pub fn set_checked(&mut self, name: &str, checked: bool) -> Result<(), FormError> {
        let spec = Self::spec(name)?;
        if spec.kind != FieldKind::Checkbox {
            return Err(FormError::WrongKind {
                field: spec.name,
                attempted: "a checkbox state",
            });
        }
        self.update(spec, FieldValue::Checked(checked));
        Ok(())
    }

    fn update(&mut self, spec: &'static FieldSpec, value: FieldValue) {
        let filled = match &value {
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::Checked(checked) => *checked,
            FieldValue::File(_) => true,
        };
        self.values.set(spec.name, value);
        if filled {
            self.errors.remove(spec.name);
        }
    }

    /// Format check run when a field loses focus. Returns the message now
    /// attached to the field, if any.
    pub fn blur(&mut self, name: &str) -> Result<Option<&'static str>, FormError> {
        let spec = Self::spec(name)?;
        match check_format(spec.kind, self.values.text(spec.name).trim()) {
            Some(message) => {
                self.errors.insert(spec.name, message);
                Ok(Some(message))
            }
            None => {
                self.errors.remove(spec.name);
                Ok(None)
            }
        }
    }

    /// Put a file into an upload slot. Oversized files leave the slot empty.
    pub fn attach(
        &mut self,
        slot: &str,
        source: UploadSource,
        notifications: &mut Notifications,
    ) -> Result<(), UploadError> {
        ensure_slot(slot)?;
        let spec = find_field(slot).ok_or_else(|| UploadError::UnknownSlot(slot.to_string()))?;

        match source.resolve() {
            Ok(attachment) => {
                notifications.success(format!("Fichier \"{}\" ajouté", attachment.file_name));
                self.update(spec, FieldValue::File(attachment));
                Ok(())
            }
            Err(err) => {
                self.values.clear(spec.name);
                match &err {
                    UploadError::TooLarge { .. } => notifications.error(err.to_string()),
                    _ => notifications.error(format!("Impossible de lire le fichier: {err}")),
                };
                Err(err)
            }
        }
    }

    pub fn detach(&mut self, slot: &str) -> Result<(), UploadError> {
        ensure_slot(slot)?;
        self.values.clear(slot);
        Ok(())
    }

    /// Validate the current step and advance when it passes.
    pub fn next(&mut self, notifications: &mut Notifications) -> Navigation {
        let report = self.apply_validation(self.step);
        if !report.is_valid() {
            notifications.warning(INCOMPLETE_STEP_MESSAGE);
            return Navigation::Blocked(report);
        }

        self.show_step(self.step.next());
        Navigation::Moved(self.step)
    }

    pub fn prev(&mut self) -> FormStep {
        self.show_step(self.step.prev());
        self.step
    }

    fn show_step(&mut self, step: FormStep) {
        debug!(from = self.step.number(), to = step.number(), "Form step change");
        self.step = step;
        if step.is_last() {
            self.summary = self.build_summary();
        }
    }

    /// Run validation for `step` and mirror its result into the inline
    /// errors: fields that pass lose their message, failing ones gain one.
    fn apply_validation(&mut self, step: FormStep) -> StepReport {
        let report = validate_step(step, &self.values);
        for field in &report.checked {
            self.errors.remove(field);
        }
        for error in &report.errors {
            self.errors.insert(error.field, error.message);
        }
        report
    }

    fn build_summary(&self) -> Vec<SummaryItem> {
        FIELDS
            .iter()
            .filter(|spec| spec.in_summary)
            .filter_map(|spec| {
                let value = self.values.text(spec.name);
                (!value.is_empty()).then(|| SummaryItem {
                    label: spec.label,
                    value: value.to_string(),
                })
            })
            .collect()
    }

    fn build_payload(&self) -> RegistrationPayload {
        let mut payload = RegistrationPayload::default();
        for spec in FIELDS {
            match spec.kind {
                FieldKind::Checkbox => {
                    if self.values.is_checked(spec.name) {
                        payload.fields.push((spec.name.to_string(), "on".to_string()));
                    }
                }
                FieldKind::File => {
                    if let Some(file) = self.values.file(spec.name) {
                        payload.files.push((spec.name.to_string(), file.clone()));
                    }
                }
                _ => {
                    let value = self.values.text(spec.name);
                    if !value.is_empty() {
                        payload
                            .fields
                            .push((spec.name.to_string(), value.to_string()));
                    }
                }
            }
        }
        payload
    }

    /// Validate the last step and hand out the payload to send. Raises the
    /// loading indicator until `finish_submit`.
    pub fn begin_submit(
        &mut self,
        notifications: &mut Notifications,
    ) -> Result<PendingSubmission, SubmitError> {
        if !self.step.is_last() {
            return Err(SubmitError::NotOnLastStep);
        }
        if self.submitting {
            return Err(SubmitError::InFlight);
        }

        let report = self.apply_validation(FormStep::Review);
        if !report.is_valid() {
            notifications.error(TERMS_NOT_ACCEPTED_MESSAGE);
            return Err(SubmitError::Invalid(report));
        }

        self.submitting = true;
        notifications.set_loading(true);
        Ok(PendingSubmission {
            payload: self.build_payload(),
        })
    }

    /// Settle a submission. Success resets the form to step 1; failure leaves
    /// every value in place on the last step.
    pub fn finish_submit(
        &mut self,
        _pending: PendingSubmission,
        result: Result<Option<String>, ApiError>,
        notifications: &mut Notifications,
    ) -> Result<String, SubmitError> {
        self.submitting = false;
        notifications.set_loading(false);

        match result {
            Ok(message) => {
                let message = message.unwrap_or_else(|| SUBMIT_OK_MESSAGE.to_string());
                self.reset();
                self.confirmation = Some(message.clone());
                notifications.success(message.clone());
                Ok(message)
            }
            Err(err) => {
                warn!(error = %err, "Registration submission failed");
                notifications.error(SUBMIT_FAILED_MESSAGE);
                Err(SubmitError::Remote(err))
            }
        }
    }

    /// Validate, send once, and settle.
    pub async fn submit(
        &mut self,
        backend: &dyn Backend,
        notifications: &mut Notifications,
    ) -> Result<String, SubmitError> {
        let pending = self.begin_submit(notifications)?;
        let result = backend.submit_preinscription(&pending.payload).await;
        self.finish_submit(pending, result, notifications)
    }

    /// Clear every value and go back to step 1.
    pub fn reset(&mut self) {
        let submitting = self.submitting;
        *self = Self::new();
        self.submitting = submitting;
    }
}
