use std::collections::HashMap;

use crate::api::Attachment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
    File(Attachment),
}

/// Current contents of the form, keyed by field name. Missing entries read
/// as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: HashMap<String, FieldValue>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(FieldValue::Text(text)) => text,
            _ => "",
        }
    }

    pub fn is_checked(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(FieldValue::Checked(true)))
    }

    pub fn file(&self, name: &str) -> Option<&Attachment> {
        match self.values.get(name) {
            Some(FieldValue::File(file)) => Some(file),
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name.to_string(), value);
    }

    pub(crate) fn clear(&mut self, name: &str) {
        self.values.remove(name);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
