//! Line-oriented chat session.
//!
//! Input lines are read on their own task and forwarded over a channel, and
//! replies come back over the dispatcher's channel, so the user can keep
//! typing while earlier messages are still waiting for an answer.

use std::error::Error;
use std::io::Write;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::warn;

use crate::api::http::REQUEST_TIMEOUT;
use crate::core::app::App;
use crate::core::chat::transcript::{find_quick_action, QUICK_ACTIONS};
use crate::core::chat::{ChatDispatchService, ReplyEvent};
use crate::ui::render;

const TOAST_TICK: Duration = Duration::from_millis(250);
/// How long end of input waits for replies still in flight.
const DRAIN_TIMEOUT: Duration = REQUEST_TIMEOUT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Message(String),
    /// Empty line: send whatever `/use` put in the composer.
    SendComposer,
    NewChat,
    History,
    Use(usize),
    Quick(String),
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ChatInput::SendComposer;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return ChatInput::Message(line.to_string());
    };

    let mut parts = command.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();
    match name {
        "new" | "nouveau" => ChatInput::NewChat,
        "history" | "historique" => ChatInput::History,
        "use" => match arg.parse::<usize>() {
            Ok(n) if n >= 1 => ChatInput::Use(n - 1),
            _ => ChatInput::Unknown(trimmed.to_string()),
        },
        "quick" if !arg.is_empty() => ChatInput::Quick(arg.to_string()),
        "help" | "aide" => ChatInput::Help,
        "quit" | "exit" | "quitter" => ChatInput::Quit,
        _ => ChatInput::Unknown(trimmed.to_string()),
    }
}

pub fn help_text() -> String {
    let mut text = String::from(
        "Commandes:\n  \
         /new              Nouvelle conversation\n  \
         /history          Afficher l'historique\n  \
         /use N            Reprendre le message N de l'historique\n  \
         /quick CLÉ        Question rapide\n  \
         /quit             Quitter\n\
         Questions rapides:",
    );
    for action in QUICK_ACTIONS {
        text.push_str(&format!(" {}", action.key));
    }
    text.push('\n');
    text
}

enum UiEvent {
    Line(String),
    Eof,
}

fn spawn_input_reader<R>(
    input: R,
    tx: mpsc::UnboundedSender<UiEvent>,
) -> tokio::task::JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = input.lines();
        loop {
            let event = match lines.next_line().await {
                Ok(Some(line)) => UiEvent::Line(line),
                Ok(None) | Err(_) => UiEvent::Eof,
            };
            let eof = matches!(event, UiEvent::Eof);
            if tx.send(event).is_err() || eof {
                break;
            }
        }
    })
}

fn flush_toasts<W: Write>(app: &mut App, out: &mut W) -> std::io::Result<()> {
    for toast in app.notifications.take_unseen() {
        writeln!(out, "{}", render::toast(&toast))?;
    }
    Ok(())
}

fn print_last_turn<W: Write>(app: &App, out: &mut W) -> std::io::Result<()> {
    if let Some(turn) = app.chat.transcript().last() {
        writeln!(out, "{}", render::turn(turn))?;
    }
    Ok(())
}

/// Returns `false` when the session should end.
fn handle_input<W: Write>(
    app: &mut App,
    dispatcher: &ChatDispatchService,
    input: ChatInput,
    out: &mut W,
) -> std::io::Result<bool> {
    let sent = match input {
        ChatInput::Quit => return Ok(false),
        ChatInput::Message(text) => app.dispatch_message(&text, dispatcher),
        ChatInput::SendComposer => app.dispatch_composer(dispatcher),
        ChatInput::Quick(key) => {
            if find_quick_action(&key).is_none() {
                app.notifications
                    .info(format!("Question rapide inconnue, envoi de \"{key}\" tel quel"));
            }
            app.dispatch_quick_action(&key, dispatcher)
        }
        ChatInput::NewChat => {
            app.start_new_chat();
            if let Some(panel) = app.chat.transcript().welcome() {
                write!(out, "{}", render::welcome(panel))?;
            }
            false
        }
        ChatInput::History => {
            write!(out, "{}", render::history(&app.chat.recent_history()))?;
            false
        }
        ChatInput::Use(index) => {
            match app.chat.use_history_entry(index) {
                Some(text) => writeln!(out, "> {text}  (Entrée pour envoyer)")?,
                None => writeln!(out, "Aucune entrée {} dans l'historique", index + 1)?,
            }
            false
        }
        ChatInput::Help => {
            write!(out, "{}", help_text())?;
            false
        }
        ChatInput::Unknown(command) => {
            writeln!(out, "Commande inconnue: {command} (essayez /help)")?;
            false
        }
    };

    if sent {
        print_last_turn(app, out)?;
        writeln!(out, "{}", render::TYPING_INDICATOR)?;
    }
    Ok(true)
}

/// Wait for replies still in flight, for at most [`DRAIN_TIMEOUT`].
async fn drain_replies<W: Write>(
    app: &mut App,
    reply_rx: &mut mpsc::UnboundedReceiver<ReplyEvent>,
    out: &mut W,
) -> std::io::Result<()> {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    while app.chat.is_typing() {
        match tokio::time::timeout_at(deadline, reply_rx.recv()).await {
            Ok(Some(reply)) => {
                app.apply_reply(reply);
                print_last_turn(app, out)?;
                flush_toasts(app, out)?;
            }
            Ok(None) => break,
            Err(_) => {
                warn!("Gave up waiting for pending replies");
                break;
            }
        }
    }
    Ok(())
}

/// Run the chat until `/quit` or end of input. `/quit` leaves at once; at end
/// of input, replies still in flight are awaited for a bounded time.
pub async fn run_chat_with<R, W>(
    app: &mut App,
    input: R,
    out: &mut W,
) -> Result<(), Box<dyn Error>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: Write,
{
    let (dispatcher, mut reply_rx) = ChatDispatchService::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let reader = spawn_input_reader(input, event_tx);
    let mut tick = tokio::time::interval(TOAST_TICK);

    if let Some(panel) = app.chat.transcript().welcome() {
        write!(out, "{}", render::welcome(panel))?;
    }

    let quit = loop {
        tokio::select! {
            Some(event) = event_rx.recv() => {
                match event {
                    UiEvent::Line(line) => {
                        if !handle_input(app, &dispatcher, parse_input(&line), out)? {
                            break true;
                        }
                    }
                    UiEvent::Eof => break false,
                }
            }
            Some(reply) = reply_rx.recv() => {
                app.apply_reply(reply);
                print_last_turn(app, out)?;
            }
            _ = tick.tick() => {
                app.notifications.prune(Instant::now());
            }
        }
        flush_toasts(app, out)?;
        out.flush()?;
    };

    if !quit {
        drain_replies(app, &mut reply_rx, out).await?;
    }

    reader.abort();
    flush_toasts(app, out)?;
    out.flush()?;
    Ok(())
}

pub async fn run_chat(mut app: App) -> Result<(), Box<dyn Error>> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_chat_with(&mut app, stdin, &mut stdout).await
}
