//! Handlers behind `preinscription set` and `preinscription unset`.
//!
//! Each configuration key gets one [`SettingHandler`]; the
//! [`SettingRegistry`] looks them up by key and lists them in a fixed order.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::chat::history::DEFAULT_HISTORY_KEY;
use crate::core::config::data::{path_display, Config, DEFAULT_BASE_URL};
use crate::utils::url::{is_http_url, normalize_base_url};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingError {
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("{hint}\nExample: {example}")]
    MissingValue {
        hint: &'static str,
        example: &'static str,
    },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

pub trait SettingHandler: Send + Sync {
    fn key(&self) -> &'static str;

    /// Apply `value` to `config` and describe the change.
    fn set(&self, value: &str, config: &mut Config) -> Result<String, SettingError>;

    fn unset(&self, config: &mut Config) -> String;

    /// One line for the `set` listing.
    fn format(&self, config: &Config) -> String;
}

fn success_set(key: &str, value: &str) -> String {
    format!("✅ Set {key} to: {value}")
}

pub struct BaseUrlHandler;

impl SettingHandler for BaseUrlHandler {
    fn key(&self) -> &'static str {
        "base-url"
    }

    fn set(&self, value: &str, config: &mut Config) -> Result<String, SettingError> {
        if value.is_empty() {
            return Err(SettingError::MissingValue {
                hint: "To set the server address, provide its URL:",
                example: "preinscription set base-url https://preinscription.example.cm",
            });
        }
        if !is_http_url(value) {
            return Err(SettingError::InvalidValue {
                key: self.key(),
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }
        let url = normalize_base_url(value);
        let message = success_set(self.key(), &url);
        config.base_url = Some(url);
        Ok(message)
    }

    fn unset(&self, config: &mut Config) -> String {
        config.base_url = None;
        format!("✅ Unset base-url (will use default: {DEFAULT_BASE_URL})")
    }

    fn format(&self, config: &Config) -> String {
        match &config.base_url {
            Some(url) => format!("  base-url: {url}"),
            None => format!("  base-url: (unset, default: {DEFAULT_BASE_URL})"),
        }
    }
}

pub struct HistoryKeyHandler;

impl SettingHandler for HistoryKeyHandler {
    fn key(&self) -> &'static str {
        "history-key"
    }

    fn set(&self, value: &str, config: &mut Config) -> Result<String, SettingError> {
        if value.is_empty() {
            return Err(SettingError::MissingValue {
                hint: "To set the history storage key, provide a name:",
                example: "preinscription set history-key chatHistory",
            });
        }
        let valid = value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SettingError::InvalidValue {
                key: self.key(),
                reason: "only letters, digits, '_' and '-' are allowed".to_string(),
            });
        }
        config.history_key = Some(value.to_string());
        Ok(success_set(self.key(), value))
    }

    fn unset(&self, config: &mut Config) -> String {
        config.history_key = None;
        format!("✅ Unset history-key (will use default: {DEFAULT_HISTORY_KEY})")
    }

    fn format(&self, config: &Config) -> String {
        match &config.history_key {
            Some(key) => format!("  history-key: {key}"),
            None => format!("  history-key: (unset, default: {DEFAULT_HISTORY_KEY})"),
        }
    }
}

pub struct DataDirHandler;

impl SettingHandler for DataDirHandler {
    fn key(&self) -> &'static str {
        "data-dir"
    }

    fn set(&self, value: &str, config: &mut Config) -> Result<String, SettingError> {
        if value.is_empty() {
            return Err(SettingError::MissingValue {
                hint: "To move client storage, provide a directory:",
                example: "preinscription set data-dir ~/.local/share/preinscription",
            });
        }
        let dir = PathBuf::from(value);
        let message = success_set(self.key(), &path_display(&dir));
        config.data_dir = Some(dir);
        Ok(message)
    }

    fn unset(&self, config: &mut Config) -> String {
        config.data_dir = None;
        "✅ Unset data-dir (will use the platform data directory)".to_string()
    }

    fn format(&self, config: &Config) -> String {
        match &config.data_dir {
            Some(dir) => format!("  data-dir: {}", path_display(dir)),
            None => "  data-dir: (unset, platform default)".to_string(),
        }
    }
}

pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `preinscription set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };
        registry.register(Box::new(BaseUrlHandler));
        registry.register(Box::new(HistoryKeyHandler));
        registry.register(Box::new(DataDirHandler));
        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    pub fn get(&self, key: &str) -> Result<&dyn SettingHandler, SettingError> {
        self.handlers
            .get(key)
            .map(|h| h.as_ref())
            .ok_or_else(|| SettingError::UnknownKey(key.to_string()))
    }

    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }

    pub fn format_all(&self, config: &Config) -> String {
        let mut out = String::from("Current configuration:\n");
        for key in &self.display_order {
            if let Some(handler) = self.handlers.get(key) {
                out.push_str(&handler.format(config));
                out.push('\n');
            }
        }
        out
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
