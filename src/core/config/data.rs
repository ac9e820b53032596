use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::chat::history::DEFAULT_HISTORY_KEY;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root URL of the pre-registration service (e.g., "https://preinscription.example.cm")
    pub base_url: Option<String>,
    /// Storage key the chat history is kept under
    pub history_key: Option<String>,
    /// Directory for client-side storage, instead of the platform data dir
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn history_key(&self) -> &str {
        self.history_key.as_deref().unwrap_or(DEFAULT_HISTORY_KEY)
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
