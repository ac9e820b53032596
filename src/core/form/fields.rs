//! Static description of the registration form: its steps and fields.

use std::fmt;

pub const STEP_COUNT: u8 = 4;
pub const MOTIVATION_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormStep {
    Personal = 1,
    Program = 2,
    Documents = 3,
    Review = 4,
}

impl FormStep {
    pub const ALL: [FormStep; 4] = [
        FormStep::Personal,
        FormStep::Program,
        FormStep::Documents,
        FormStep::Review,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(FormStep::Personal),
            2 => Some(FormStep::Program),
            3 => Some(FormStep::Documents),
            4 => Some(FormStep::Review),
            _ => None,
        }
    }

    /// The following step, saturating at the last one.
    pub fn next(self) -> Self {
        Self::from_number((self.number() + 1).min(STEP_COUNT)).unwrap_or(FormStep::Review)
    }

    /// The preceding step, saturating at the first one.
    pub fn prev(self) -> Self {
        Self::from_number(self.number().saturating_sub(1).max(1)).unwrap_or(FormStep::Personal)
    }

    pub fn is_first(self) -> bool {
        self == FormStep::Personal
    }

    pub fn is_last(self) -> bool {
        self == FormStep::Review
    }

    pub fn title(self) -> &'static str {
        match self {
            FormStep::Personal => "Informations personnelles",
            FormStep::Program => "Programme d'études",
            FormStep::Documents => "Documents",
            FormStep::Review => "Récapitulatif",
        }
    }
}

impl fmt::Display for FormStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.number(), STEP_COUNT, self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Date,
    TextArea { max_chars: usize },
    /// Radio group: exactly one of the options.
    Radio { options: &'static [&'static str] },
    Select { options: &'static [&'static str] },
    Checkbox,
    File,
}

impl FieldKind {
    pub fn options(self) -> &'static [&'static str] {
        match self {
            FieldKind::Radio { options } | FieldKind::Select { options } => options,
            _ => &[],
        }
    }

    pub fn is_textual(self) -> bool {
        matches!(
            self,
            FieldKind::Text
                | FieldKind::Email
                | FieldKind::Phone
                | FieldKind::Date
                | FieldKind::TextArea { .. }
        )
    }

    pub fn is_choice(self) -> bool {
        matches!(self, FieldKind::Radio { .. } | FieldKind::Select { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub step: FormStep,
    pub required: bool,
    /// Shown in the review summary.
    pub in_summary: bool,
}

pub const PROGRAMMES: &[&str] = &[
    "L-INFO", "L-GL", "L-RT", "L-CYBER", "M-IA", "M-CLOUD", "M-BLOCK",
];

pub const NIVEAUX: &[&str] = &["Licence", "Master", "Doctorat"];

pub const UPLOAD_SLOTS: &[&str] = &["photo", "diplome", "releve", "cv"];

const fn field(
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    step: FormStep,
    required: bool,
    in_summary: bool,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        step,
        required,
        in_summary,
    }
}

/// Every field in entry order. The summary follows this order too.
pub const FIELDS: &[FieldSpec] = &[
    field("nom", "Nom", FieldKind::Text, FormStep::Personal, true, true),
    field("prenom", "Prénom", FieldKind::Text, FormStep::Personal, true, true),
    field("email", "Email", FieldKind::Email, FormStep::Personal, true, true),
    field("telephone", "Téléphone", FieldKind::Phone, FormStep::Personal, true, true),
    field("dateNaissance", "Date de naissance", FieldKind::Date, FormStep::Personal, true, true),
    field("lieuNaissance", "Lieu de naissance", FieldKind::Text, FormStep::Personal, true, true),
    field("adresse", "Adresse", FieldKind::Text, FormStep::Personal, true, true),
    field(
        "programme",
        "Programme",
        FieldKind::Radio { options: PROGRAMMES },
        FormStep::Program,
        true,
        true,
    ),
    field(
        "niveau",
        "Niveau",
        FieldKind::Select { options: NIVEAUX },
        FormStep::Program,
        true,
        true,
    ),
    field(
        "motivation",
        "Motivation",
        FieldKind::TextArea {
            max_chars: MOTIVATION_MAX_CHARS,
        },
        FormStep::Program,
        false,
        false,
    ),
    field("photo", "Photo d'identité", FieldKind::File, FormStep::Documents, false, false),
    field("diplome", "Dernier diplôme", FieldKind::File, FormStep::Documents, false, false),
    field("releve", "Relevé de notes", FieldKind::File, FormStep::Documents, false, false),
    field("cv", "Curriculum vitae", FieldKind::File, FormStep::Documents, false, false),
    field(
        "acceptTerms",
        "J'accepte les conditions générales",
        FieldKind::Checkbox,
        FormStep::Review,
        true,
        false,
    ),
    field(
        "newsletter",
        "Recevoir la newsletter",
        FieldKind::Checkbox,
        FormStep::Review,
        false,
        false,
    ),
];

pub fn find_field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.name == name)
}

pub fn fields_for_step(step: FormStep) -> impl Iterator<Item = &'static FieldSpec> {
    FIELDS.iter().filter(move |spec| spec.step == step)
}
