use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, warn};

use super::history::{HistoryEntry, HistoryLog};
use super::session::SessionId;
use super::transcript::{quick_action_text, Transcript, Turn, APOLOGY_MESSAGE};
use crate::api::{ApiError, Backend, MessageRequest};
use crate::core::notify::Notifications;

pub const MAX_MESSAGE_LENGTH: usize = 1000;
pub const CONNECTION_ERROR_MESSAGE: &str = "Erreur de connexion au serveur";
pub const NEW_CHAT_MESSAGE: &str = "Nouvelle conversation démarrée";
pub const MESSAGE_TOO_LONG_MESSAGE: &str = "Le message ne peut pas dépasser 1000 caractères";

/// A message that has been shown in the transcript and still awaits its
/// reply. Hosts send `request` and hand the result to `complete_send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub id: u64,
    pub request: MessageRequest,
}

#[derive(Debug)]
pub enum SendOutcome {
    /// Nothing to send.
    Skipped,
    Replied(String),
    Failed(ApiError),
}

/// Owns the chat session: id, transcript, composer, typing indicator and
/// the history log.
///
/// Sending is split in two so several requests can be in flight at once:
/// `begin_send` applies the optimistic part synchronously, `complete_send`
/// applies whatever came back. Replies are appended in completion order.
pub struct ChatManager {
    session: SessionId,
    transcript: Transcript,
    composer: String,
    in_flight: BTreeSet<u64>,
    next_request_id: u64,
    history: HistoryLog,
}

impl ChatManager {
    pub fn new(history: HistoryLog) -> Self {
        Self {
            session: SessionId::generate(),
            transcript: Transcript::default(),
            composer: String::new(),
            in_flight: BTreeSet::new(),
            next_request_id: 0,
            history,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn composer(&self) -> &str {
        &self.composer
    }

    pub fn set_composer(&mut self, text: impl Into<String>) {
        self.composer = text.into();
    }

    pub fn is_typing(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn recent_history(&self) -> Vec<HistoryEntry> {
        self.history.recent()
    }

    /// Copy a displayed history entry into the composer without sending it.
    pub fn use_history_entry(&mut self, index: usize) -> Option<&str> {
        let entry = self.history.recent().into_iter().nth(index)?;
        self.composer = entry.message.trim().to_string();
        Some(&self.composer)
    }

    /// Optimistic half of sending: show the user turn, clear the composer,
    /// raise the typing indicator. Returns `None` when there is nothing to
    /// send.
    pub fn begin_send(
        &mut self,
        text: &str,
        notifications: &mut Notifications,
    ) -> Option<OutgoingMessage> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            notifications.warning(MESSAGE_TOO_LONG_MESSAGE);
            return None;
        }

        self.transcript.push(Turn::user(message));
        self.composer.clear();

        let id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight.insert(id);
        debug!(id, session_id = %self.session, "Chat message queued");

        Some(OutgoingMessage {
            id,
            request: MessageRequest {
                message: message.to_string(),
                session_id: self.session.to_string(),
            },
        })
    }

    /// Send whatever is in the composer.
    pub fn begin_send_composer(
        &mut self,
        notifications: &mut Notifications,
    ) -> Option<OutgoingMessage> {
        let text = self.composer.clone();
        self.begin_send(&text, notifications)
    }

    pub fn begin_quick_action(
        &mut self,
        key: &str,
        notifications: &mut Notifications,
    ) -> Option<OutgoingMessage> {
        self.begin_send(quick_action_text(key), notifications)
    }

    /// Apply the result of a request started by `begin_send`. The user turn
    /// stays in the transcript either way.
    pub fn complete_send(
        &mut self,
        outgoing: OutgoingMessage,
        result: Result<String, ApiError>,
        notifications: &mut Notifications,
    ) -> SendOutcome {
        self.in_flight.remove(&outgoing.id);

        match result {
            Ok(reply) => {
                self.transcript.push(Turn::bot(reply.clone()));
                let recorded = self.history.record_message(
                    &outgoing.request.session_id,
                    &outgoing.request.message,
                    Utc::now().timestamp_millis(),
                );
                if let Err(err) = recorded {
                    warn!(error = %err, "Could not save chat history");
                }
                SendOutcome::Replied(reply)
            }
            Err(err) => {
                warn!(id = outgoing.id, error = %err, "Chat message failed");
                self.transcript.push(Turn::bot(APOLOGY_MESSAGE));
                notifications.error(CONNECTION_ERROR_MESSAGE);
                SendOutcome::Failed(err)
            }
        }
    }

    /// Send one message and wait for its reply.
    pub async fn send_message(
        &mut self,
        text: &str,
        backend: &dyn Backend,
        notifications: &mut Notifications,
    ) -> SendOutcome {
        let Some(outgoing) = self.begin_send(text, notifications) else {
            return SendOutcome::Skipped;
        };
        let result = backend.send_message(&outgoing.request).await;
        self.complete_send(outgoing, result, notifications)
    }

    pub async fn send_quick_action(
        &mut self,
        key: &str,
        backend: &dyn Backend,
        notifications: &mut Notifications,
    ) -> SendOutcome {
        self.send_message(quick_action_text(key), backend, notifications)
            .await
    }

    /// Fresh session id, empty transcript with the welcome panel. History
    /// is kept.
    pub fn start_new_chat(&mut self, notifications: &mut Notifications) {
        self.session = SessionId::generate();
        self.transcript.restart();
        debug!(session_id = %self.session, "New chat session");
        notifications.success(NEW_CHAT_MESSAGE);
    }
}
