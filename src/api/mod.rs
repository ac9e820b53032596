//! Wire payloads and the backend seam for the pre-registration REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod http;

pub use http::HttpBackend;

pub const MESSAGE_ENDPOINT: &str = "api/message";
pub const PREINSCRIPTION_ENDPOINT: &str = "api/preinscription";
pub const AUTH_CHECK_ENDPOINT: &str = "api/auth/check";
pub const AUTH_LOGOUT_ENDPOINT: &str = "api/auth/logout";
pub const AUTH_PROFILE_ENDPOINT: &str = "api/auth/profile";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRequest {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreinscriptionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
}

#[derive(Debug, Deserialize)]
pub struct LogoutResponse {
    #[serde(default)]
    pub success: bool,
}

/// A file attached to a registration upload slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Multipart body for `POST /api/preinscription`, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationPayload {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, Attachment)>,
}

impl RegistrationPayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn file(&self, slot: &str) -> Option<&Attachment> {
        self.files
            .iter()
            .find(|(key, _)| key == slot)
            .map(|(_, file)| file)
    }
}

/// Everything that can go wrong talking to the service. Callers never
/// distinguish transport failures from malformed replies beyond the message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

/// The REST surface consumed by the client. `HttpBackend` talks to a real
/// server; tests script replies through their own implementations.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns the bot reply text for one chat turn.
    async fn send_message(&self, request: &MessageRequest) -> Result<String, ApiError>;

    /// Submits the registration form. `Ok` carries the server's confirmation
    /// message when it sent one.
    async fn submit_preinscription(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<Option<String>, ApiError>;

    async fn check_auth(&self) -> Result<AuthStatus, ApiError>;

    async fn logout(&self) -> Result<bool, ApiError>;

    async fn profile(&self) -> Result<Value, ApiError>;
}

/// Interprets a `/api/message` body. Anything but a non-empty `response`
/// string is malformed.
pub fn parse_message_reply(body: &str) -> Result<String, ApiError> {
    let parsed: MessageResponse =
        serde_json::from_str(body).map_err(|err| ApiError::Malformed(err.to_string()))?;
    match parsed.response {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ApiError::Malformed("missing `response` field".to_string())),
    }
}

/// Interprets a `/api/preinscription` body. `success: false` becomes
/// `ApiError::Rejected` with the server's explanation.
pub fn parse_registration_reply(body: &str) -> Result<Option<String>, ApiError> {
    let parsed: PreinscriptionResponse =
        serde_json::from_str(body).map_err(|err| ApiError::Malformed(err.to_string()))?;
    if parsed.success {
        Ok(parsed.message)
    } else {
        let reason = parsed
            .error
            .or(parsed.message)
            .unwrap_or_else(|| "Erreur lors de la soumission".to_string());
        Err(ApiError::Rejected(reason))
    }
}
