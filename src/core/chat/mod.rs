//! Chat sessions with the remote assistant.

pub mod dispatch;
pub mod history;
pub mod manager;
pub mod session;
pub mod transcript;

pub use dispatch::{ChatDispatchService, ReplyEvent};
pub use history::{HistoryEntry, HistoryLog};
pub use manager::{ChatManager, OutgoingMessage, SendOutcome};
pub use session::SessionId;
pub use transcript::{Sender, Transcript, Turn, WelcomePanel};
