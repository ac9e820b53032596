use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use super::{
    parse_message_reply, parse_registration_reply, ApiError, AuthStatus, Backend, LogoutResponse,
    MessageRequest, RegistrationPayload, AUTH_CHECK_ENDPOINT, AUTH_LOGOUT_ENDPOINT,
    AUTH_PROFILE_ENDPOINT, MESSAGE_ENDPOINT, PREINSCRIPTION_ENDPOINT,
};
use crate::utils::url::construct_api_url;

/// Upper bound on any single request, connection included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `Backend` over HTTP. Cloning shares the underlying connection pool, and
/// the session cookie jar the auth endpoints rely on.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        construct_api_url(&self.base_url, endpoint)
    }

    async fn read_json(response: Response) -> Result<Value, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|err| ApiError::Malformed(err.to_string()))
    }
}

fn build_form(payload: &RegistrationPayload) -> Form {
    let mut form = Form::new();
    for (name, value) in &payload.fields {
        form = form.text(name.clone(), value.clone());
    }
    for (slot, attachment) in &payload.files {
        let part = Part::bytes(attachment.bytes.clone()).file_name(attachment.file_name.clone());
        form = form.part(slot.clone(), part);
    }
    form
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send_message(&self, request: &MessageRequest) -> Result<String, ApiError> {
        debug!(session_id = %request.session_id, "Sending chat message");
        let response = self
            .client
            .post(self.url(MESSAGE_ENDPOINT))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_message_reply(&body)
    }

    async fn submit_preinscription(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<Option<String>, ApiError> {
        debug!(
            fields = payload.fields.len(),
            files = payload.files.len(),
            "Submitting preinscription"
        );
        let response = self
            .client
            .post(self.url(PREINSCRIPTION_ENDPOINT))
            .multipart(build_form(payload))
            .send()
            .await?;

        // Rejections come back as JSON with a 4xx status, so the body is
        // interpreted before the status.
        let status = response.status();
        let body = response.text().await?;
        match parse_registration_reply(&body) {
            Err(ApiError::Malformed(_)) if !status.is_success() => Err(ApiError::Status {
                status: status.as_u16(),
                body,
            }),
            other => other,
        }
    }

    async fn check_auth(&self) -> Result<AuthStatus, ApiError> {
        let response = self.client.get(self.url(AUTH_CHECK_ENDPOINT)).send().await?;
        let value = Self::read_json(response).await?;
        serde_json::from_value(value).map_err(|err| ApiError::Malformed(err.to_string()))
    }

    async fn logout(&self) -> Result<bool, ApiError> {
        let response = self
            .client
            .post(self.url(AUTH_LOGOUT_ENDPOINT))
            .header("Content-Type", "application/json")
            .send()
            .await?;
        let value = Self::read_json(response).await?;
        let parsed: LogoutResponse =
            serde_json::from_value(value).map_err(|err| ApiError::Malformed(err.to_string()))?;
        Ok(parsed.success)
    }

    async fn profile(&self) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(self.url(AUTH_PROFILE_ENDPOINT))
            .send()
            .await?;
        Self::read_json(response).await
    }
}
