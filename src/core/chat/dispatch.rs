use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use super::manager::OutgoingMessage;
use crate::api::{ApiError, Backend};

/// A finished request, ready for `ChatManager::complete_send`.
#[derive(Debug)]
pub struct ReplyEvent {
    pub outgoing: OutgoingMessage,
    pub result: Result<String, ApiError>,
}

/// Runs chat requests on spawned tasks and reports each result on one
/// channel, so the owner of the chat state can keep handling input while
/// requests are in flight.
#[derive(Clone)]
pub struct ChatDispatchService {
    tx: mpsc::UnboundedSender<ReplyEvent>,
}

impl ChatDispatchService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReplyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn dispatch(&self, backend: Arc<dyn Backend>, outgoing: OutgoingMessage) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = backend.send_message(&outgoing.request).await;
            debug!(id = outgoing.id, ok = result.is_ok(), "Chat request finished");
            // The receiver only goes away when the host is shutting down.
            let _ = tx.send(ReplyEvent { outgoing, result });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MessageRequest;
    use crate::utils::test_utils::ScriptedBackend;

    fn outgoing(id: u64, message: &str) -> OutgoingMessage {
        OutgoingMessage {
            id,
            request: MessageRequest {
                message: message.to_string(),
                session_id: "session_1_aaaaaaaaa".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn every_dispatch_reports_back() {
        let backend: Arc<dyn Backend> =
            Arc::new(ScriptedBackend::new().reply_with("a").reply_with("b"));
        let (service, mut rx) = ChatDispatchService::new();

        service.dispatch(Arc::clone(&backend), outgoing(0, "un"));
        service.dispatch(Arc::clone(&backend), outgoing(1, "deux"));

        let mut ids = Vec::new();
        for _ in 0..2 {
            let event = rx.recv().await.expect("reply event");
            assert!(event.result.is_ok());
            ids.push(event.outgoing.id);
        }
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
    }

    #[tokio::test]
    async fn failures_are_reported_not_dropped() {
        let backend: Arc<dyn Backend> = Arc::new(ScriptedBackend::new());
        let (service, mut rx) = ChatDispatchService::new();

        service.dispatch(backend, outgoing(7, "test"));
        let event = rx.recv().await.expect("reply event");
        assert_eq!(event.outgoing.id, 7);
        assert!(event.result.is_err());
    }
}
