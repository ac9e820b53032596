//! Plain-text views of the application state.
//!
//! Every function returns the text to print so the interactive loops stay
//! thin and the layout can be tested without a terminal.

use std::fmt::Write;

use chrono::{DateTime, Local};

use crate::core::chat::history::HistoryEntry;
use crate::core::chat::transcript::{Sender, Turn, WelcomePanel};
use crate::core::form::fields::{fields_for_step, FieldKind, MOTIVATION_MAX_CHARS};
use crate::core::form::wizard::{FormWizard, StepStatus, SummaryItem};
use crate::core::form::FormStep;
use crate::core::notify::Toast;

const PROGRESS_WIDTH: usize = 20;
pub const TYPING_INDICATOR: &str = "Assistant écrit…";
pub const SUBMITTING_INDICATOR: &str = "Envoi en cours…";

pub fn turn(turn: &Turn) -> String {
    let who = match turn.sender {
        Sender::User => "Vous",
        Sender::Bot => "Assistant",
    };
    format!("[{}] {who}: {}", turn.time_label(), turn.text)
}

pub fn welcome(panel: &WelcomePanel) -> String {
    let mut out = format!("{}\n{}\n", panel.title, panel.subtitle);
    for action in &panel.shortcuts {
        let _ = writeln!(out, "  /quick {:<12} {}", action.key, action.label);
    }
    out
}

pub fn toast(toast: &Toast) -> String {
    format!("{} {}", toast.kind.icon(), toast.message)
}

/// `Étape 2/4 [#####.....] 50%` followed by one marker per step.
pub fn progress(wizard: &FormWizard) -> String {
    let percent = usize::from(wizard.progress_percent());
    let filled = PROGRESS_WIDTH * percent / 100;
    let step = wizard.current_step();

    let mut out = format!(
        "Étape {}/{} [{}{}] {percent}%\n",
        step.number(),
        FormStep::ALL.len(),
        "#".repeat(filled),
        ".".repeat(PROGRESS_WIDTH - filled),
    );
    let markers: Vec<String> = FormStep::ALL
        .iter()
        .map(|&s| {
            let mark = match wizard.step_status(s) {
                StepStatus::Completed => "✓",
                StepStatus::Active => "●",
                StepStatus::Pending => "○",
            };
            format!("{mark} {}", s.title())
        })
        .collect();
    out.push_str(&markers.join("  "));
    out
}

/// The current step's fields with their values and inline errors.
pub fn step_fields(wizard: &FormWizard) -> String {
    let values = wizard.values();
    let mut out = String::new();

    for spec in fields_for_step(wizard.current_step()) {
        let required = if spec.required { " *" } else { "" };
        let value = match spec.kind {
            FieldKind::Checkbox => {
                if values.is_checked(spec.name) {
                    "[x]".to_string()
                } else {
                    "[ ]".to_string()
                }
            }
            FieldKind::File => values
                .file(spec.name)
                .map(|file| format!("{} ({} octets)", file.file_name, file.size()))
                .unwrap_or_else(|| "aucun fichier".to_string()),
            FieldKind::TextArea { .. } => format!(
                "{} ({}/{MOTIVATION_MAX_CHARS})",
                values.text(spec.name),
                wizard.motivation_count()
            ),
            _ => values.text(spec.name).to_string(),
        };
        let _ = writeln!(out, "  {}{required} [{}]: {value}", spec.label, spec.name);
        if let Some(message) = wizard.error(spec.name) {
            let _ = writeln!(out, "    ! {message}");
        }
    }
    out
}

pub fn summary(items: &[SummaryItem]) -> String {
    let mut out = String::from("Récapitulatif\n");
    for item in items {
        let _ = writeln!(out, "  {}: {}", item.label, item.value);
    }
    out
}

fn history_time(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|at| at.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default()
}

/// Numbered so `/use N` can pick an entry.
pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "Aucun historique\n".to_string();
    }
    let mut out = String::new();
    for (index, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {}  {}",
            index + 1,
            entry.message,
            history_time(entry.timestamp)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::form::fields::PROGRAMMES;
    use crate::core::form::validation::REQUIRED_MESSAGE;
    use crate::core::notify::{Notifications, ToastKind};

    #[test]
    fn turns_show_sender_and_time() {
        let user = Turn::user("Bonjour");
        let line = turn(&user);
        assert!(line.starts_with('['));
        assert!(line.ends_with("Vous: Bonjour"));
        assert!(turn(&Turn::bot("Salut")).ends_with("Assistant: Salut"));
    }

    #[test]
    fn welcome_lists_its_shortcuts() {
        let panel = WelcomePanel::greeting();
        let text = welcome(&panel);
        assert!(text.starts_with(panel.title));
        assert_eq!(text.matches("/quick").count(), panel.shortcuts.len());
    }

    #[test]
    fn toast_carries_its_icon() {
        let mut notifications = Notifications::new();
        notifications.error("Erreur de connexion");
        let latest = notifications.latest().expect("toast");
        assert_eq!(
            toast(latest),
            format!("{} Erreur de connexion", ToastKind::Error.icon())
        );
    }

    #[test]
    fn progress_fills_with_the_step() {
        let mut wizard = FormWizard::new();
        let first = progress(&wizard);
        assert!(first.starts_with("Étape 1/4 [#####...............]"));
        assert!(first.contains("25%"));
        assert!(first.contains("● "));

        wizard.reset();
        assert_eq!(progress(&wizard), first);
    }

    #[test]
    fn step_fields_show_inline_errors() {
        let mut wizard = FormWizard::new();
        let mut notifications = Notifications::new();
        wizard.next(&mut notifications);
        let text = step_fields(&wizard);
        assert!(text.contains("[nom]"));
        assert!(text.contains(&format!("! {REQUIRED_MESSAGE}")));
    }

    #[test]
    fn summary_lists_labels_and_values() {
        let items = vec![SummaryItem {
            label: "Programme",
            value: PROGRAMMES[0].to_string(),
        }];
        assert_eq!(summary(&items), "Récapitulatif\n  Programme: L-INFO\n");
    }

    #[test]
    fn history_is_numbered_from_one() {
        let entries = vec![
            HistoryEntry {
                session: "session_1_a".into(),
                message: "Quels sont les frais ?".into(),
                timestamp: 1_700_000_000_000,
            },
            HistoryEntry {
                session: "session_1_a".into(),
                message: "Bonjour".into(),
                timestamp: 1_699_999_000_000,
            },
        ];
        let text = history(&entries);
        assert!(text.starts_with(" 1. Quels sont les frais ?"));
        assert!(text.contains(" 2. Bonjour"));
        assert_eq!(history(&[]), "Aucun historique\n");
    }
}
