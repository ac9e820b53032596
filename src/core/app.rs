//! Application state shared by the chat and registration front ends.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::api::http::HttpBackend;
use crate::api::{ApiError, Backend};
use crate::core::auth;
use crate::core::chat::{
    ChatDispatchService, ChatManager, HistoryLog, OutgoingMessage, ReplyEvent, SendOutcome,
};
use crate::core::config::{Config, ConfigError};
use crate::core::form::{FormWizard, PendingSubmission, SubmitError};
use crate::core::notify::Notifications;
use crate::core::storage::FileStore;
use crate::utils::url::normalize_base_url;

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] ApiError),
}

pub struct App {
    pub wizard: FormWizard,
    pub chat: ChatManager,
    pub notifications: Notifications,
    backend: Arc<dyn Backend>,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, history: HistoryLog) -> Self {
        Self {
            wizard: FormWizard::new(),
            chat: ChatManager::new(history),
            notifications: Notifications::new(),
            backend,
        }
    }

    /// Build the HTTP backend and file-backed history from configuration.
    /// `base_url` overrides the configured server.
    pub fn from_config(config: &Config, base_url: Option<&str>) -> Result<Self, AppInitError> {
        let base_url = normalize_base_url(base_url.unwrap_or_else(|| config.base_url()));
        let backend = HttpBackend::new(base_url.clone())?;
        let store = FileStore::new(config.storage_dir()?);
        let history = HistoryLog::new(Box::new(store), config.history_key());

        info!(base_url = %base_url, "Client ready");
        Ok(Self::new(Arc::new(backend), history))
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    pub async fn send_message(&mut self, text: &str) -> SendOutcome {
        self.chat
            .send_message(text, self.backend.as_ref(), &mut self.notifications)
            .await
    }

    pub async fn send_quick_action(&mut self, key: &str) -> SendOutcome {
        self.chat
            .send_quick_action(key, self.backend.as_ref(), &mut self.notifications)
            .await
    }

    fn forward(&self, outgoing: Option<OutgoingMessage>, dispatcher: &ChatDispatchService) -> bool {
        match outgoing {
            Some(outgoing) => {
                dispatcher.dispatch(self.backend(), outgoing);
                true
            }
            None => false,
        }
    }

    /// Show the message right away and send it on a background task. The
    /// reply arrives on the dispatcher's channel; hand it to `apply_reply`.
    pub fn dispatch_message(&mut self, text: &str, dispatcher: &ChatDispatchService) -> bool {
        let outgoing = self.chat.begin_send(text, &mut self.notifications);
        self.forward(outgoing, dispatcher)
    }

    pub fn dispatch_composer(&mut self, dispatcher: &ChatDispatchService) -> bool {
        let outgoing = self.chat.begin_send_composer(&mut self.notifications);
        self.forward(outgoing, dispatcher)
    }

    pub fn dispatch_quick_action(&mut self, key: &str, dispatcher: &ChatDispatchService) -> bool {
        let outgoing = self.chat.begin_quick_action(key, &mut self.notifications);
        self.forward(outgoing, dispatcher)
    }

    pub fn apply_reply(&mut self, event: ReplyEvent) -> SendOutcome {
        self.chat
            .complete_send(event.outgoing, event.result, &mut self.notifications)
    }

    pub fn start_new_chat(&mut self) {
        self.chat.start_new_chat(&mut self.notifications);
    }

    /// Validate the form and mark it as submitting. Hosts show the loading
    /// state until [`App::complete_submit`] returns.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, SubmitError> {
        self.wizard.begin_submit(&mut self.notifications)
    }

    /// Send a begun submission on its own task and record the outcome.
    pub async fn complete_submit(
        &mut self,
        pending: PendingSubmission,
    ) -> Result<String, SubmitError> {
        let backend = self.backend();
        let payload = pending.payload.clone();
        let request =
            tokio::spawn(async move { backend.submit_preinscription(&payload).await });
        let result = request
            .await
            .unwrap_or_else(|err| Err(ApiError::Malformed(err.to_string())));
        self.wizard
            .finish_submit(pending, result, &mut self.notifications)
    }

    pub async fn submit_form(&mut self) -> Result<String, SubmitError> {
        let pending = self.begin_submit()?;
        self.complete_submit(pending).await
    }

    pub async fn is_authenticated(&self) -> bool {
        auth::is_authenticated(self.backend.as_ref()).await
    }

    pub async fn require_auth(&mut self) -> bool {
        auth::require_auth(self.backend.as_ref(), &mut self.notifications).await
    }

    pub async fn logout(&mut self) -> bool {
        auth::logout(self.backend.as_ref(), &mut self.notifications).await
    }

    pub async fn profile(&self) -> Value {
        auth::profile(self.backend.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat::history::DEFAULT_HISTORY_KEY;
    use crate::core::chat::manager::CONNECTION_ERROR_MESSAGE;
    use crate::core::chat::transcript::{Sender, APOLOGY_MESSAGE};
    use crate::core::notify::ToastKind;
    use crate::core::storage::MemoryStore;
    use crate::utils::test_utils::ScriptedBackend;
    use tempfile::TempDir;

    fn app_with(backend: ScriptedBackend) -> (App, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let history = HistoryLog::new(Box::new(MemoryStore::new()), DEFAULT_HISTORY_KEY);
        let app = App::new(backend.clone(), history);
        (app, backend)
    }

    #[tokio::test]
    async fn send_message_goes_through_the_backend() {
        let (mut app, backend) = app_with(ScriptedBackend::new().reply_with("Bonjour !"));

        let outcome = app.send_message("Salut").await;

        assert!(matches!(outcome, SendOutcome::Replied(ref reply) if reply == "Bonjour !"));
        assert_eq!(backend.message_calls(), 1);
        assert_eq!(
            backend.sent_messages.lock().unwrap()[0].session_id,
            app.chat.session_id().as_str()
        );
        assert_eq!(app.chat.recent_history().len(), 1);
    }

    #[tokio::test]
    async fn dispatched_replies_land_through_apply_reply() {
        let backend = ScriptedBackend::new().fail_message(ApiError::Malformed("eof".to_string()));
        let (mut app, _backend) = app_with(backend);
        let (dispatcher, mut rx) = ChatDispatchService::new();

        assert!(app.dispatch_message("Bonjour", &dispatcher));
        assert!(app.chat.is_typing());
        assert!(!app.dispatch_message("   ", &dispatcher));

        let event = rx.recv().await.expect("reply event");
        let outcome = app.apply_reply(event);

        assert!(matches!(outcome, SendOutcome::Failed(_)));
        assert!(!app.chat.is_typing());
        let last = app.chat.transcript().last().expect("bot turn");
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.text, APOLOGY_MESSAGE);
        assert!(app
            .notifications
            .contains(ToastKind::Error, CONNECTION_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn quick_actions_can_be_dispatched() {
        let (mut app, backend) = app_with(ScriptedBackend::new().reply_with("Voici les frais"));
        let (dispatcher, mut rx) = ChatDispatchService::new();

        assert!(app.dispatch_quick_action("frais", &dispatcher));
        let event = rx.recv().await.expect("reply event");
        app.apply_reply(event);

        assert_eq!(backend.message_calls(), 1);
        assert_eq!(app.chat.transcript().len(), 2);
    }

    #[tokio::test]
    async fn logout_reports_through_notifications() {
        let (mut app, _backend) = app_with(ScriptedBackend::new().logout_with(Ok(true)));

        assert!(app.logout().await);
        assert_eq!(app.notifications.count_of(ToastKind::Success), 1);
    }

    #[tokio::test]
    async fn submit_from_the_first_step_is_refused() {
        let (mut app, backend) = app_with(ScriptedBackend::new().accept_registration(None));

        let err = app.submit_form().await.expect_err("not on last step");
        assert!(matches!(err, SubmitError::NotOnLastStep));
        assert_eq!(backend.submission_calls(), 0);
    }

    #[test]
    fn from_config_uses_the_configured_data_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config {
            base_url: Some("http://127.0.0.1:9/".to_string()),
            history_key: Some("historique".to_string()),
            data_dir: Some(temp_dir.path().to_path_buf()),
        };

        let app = App::from_config(&config, None).expect("app");
        assert_eq!(app.chat.history().key(), "historique");
        assert!(app.chat.recent_history().is_empty());
    }
}
