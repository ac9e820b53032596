//! The multi-step registration form.
//!
//! [`fields`] declares the steps and their fields, [`validation`] holds the
//! pure per-step rules, [`upload`] the file slot checks, and [`wizard`] the
//! navigation state machine that ties them together and submits the result.

pub mod fields;
pub mod upload;
pub mod validation;
pub mod values;
pub mod wizard;

pub use fields::{FieldKind, FieldSpec, FormStep};
pub use upload::{UploadError, UploadSource};
pub use validation::{validate_step, FieldError, StepReport};
pub use values::FormValues;
pub use wizard::{FormError, FormWizard, Navigation, PendingSubmission, SubmitError, SummaryItem};
