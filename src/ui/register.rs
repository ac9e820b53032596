//! Interactive registration form.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::core::app::App;
use crate::core::form::fields::{find_field, FieldKind};
use crate::core::form::{FormError, Navigation, SubmitError, UploadSource};
use crate::ui::render;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormInput {
    Set { field: String, value: String },
    Next,
    Prev,
    Attach { slot: String, path: PathBuf },
    Detach(String),
    Submit,
    Show,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_input(line: &str) -> FormInput {
    let trimmed = line.trim();
    if let Some(command) = trimmed.strip_prefix('/') {
        let mut parts = command.splitn(3, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let first = parts.next().map(str::trim).unwrap_or_default();
        let rest = parts.next().map(str::trim).unwrap_or_default();
        return match name {
            "suivant" | "next" => FormInput::Next,
            "precedent" | "prev" => FormInput::Prev,
            "fichier" | "attach" if !first.is_empty() && !rest.is_empty() => FormInput::Attach {
                slot: first.to_string(),
                path: PathBuf::from(rest),
            },
            "retirer" | "detach" if !first.is_empty() => FormInput::Detach(first.to_string()),
            "envoyer" | "submit" => FormInput::Submit,
            "afficher" | "show" => FormInput::Show,
            "aide" | "help" => FormInput::Help,
            "quitter" | "quit" => FormInput::Quit,
            _ => FormInput::Unknown(trimmed.to_string()),
        };
    }

    match trimmed.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => FormInput::Set {
            field: field.trim().to_string(),
            value: value.trim().to_string(),
        },
        _ => FormInput::Unknown(trimmed.to_string()),
    }
}

pub const HELP_TEXT: &str = "Saisie: champ=valeur (ex. nom=Dupont, acceptTerms=oui)\n\
Commandes: /suivant  /precedent  /fichier SLOT CHEMIN  /retirer SLOT  \
/envoyer  /afficher  /quitter\n";

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "oui" | "o" | "yes" | "y" | "true" | "1" | "on" | "x" => Some(true),
        "non" | "n" | "no" | "false" | "0" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Route `field=value` to the right kind of edit and run the field's format
/// check. Returns the inline message now attached to the field, if any.
pub fn apply_field(app: &mut App, field: &str, value: &str) -> Result<Option<String>, FormError> {
    let spec = find_field(field).ok_or_else(|| FormError::UnknownField(field.to_string()))?;
    match spec.kind {
        FieldKind::Checkbox => {
            let checked = parse_flag(value).ok_or(FormError::WrongKind {
                field: spec.name,
                attempted: "this value (oui/non)",
            })?;
            app.wizard.set_checked(spec.name, checked)?;
            Ok(None)
        }
        FieldKind::Radio { .. } | FieldKind::Select { .. } => {
            app.wizard.select(spec.name, value)?;
            Ok(None)
        }
        FieldKind::File => Err(FormError::WrongKind {
            field: spec.name,
            attempted: "text (use /fichier)",
        }),
        _ => {
            app.wizard.set_text(spec.name, value)?;
            Ok(app.wizard.blur(spec.name)?.map(str::to_string))
        }
    }
}

fn show_step<W: Write>(app: &App, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{}", render::progress(&app.wizard))?;
    write!(out, "{}", render::step_fields(&app.wizard))?;
    if app.wizard.current_step().is_last() {
        write!(out, "{}", render::summary(app.wizard.summary()))?;
    }
    let controls = app.wizard.controls();
    let mut hints = Vec::new();
    if controls.prev_visible {
        hints.push("/precedent");
    }
    if controls.next_visible {
        hints.push("/suivant");
    }
    if controls.submit_visible {
        hints.push("/envoyer");
    }
    writeln!(out, "[{}]", hints.join(" "))
}

fn flush_toasts<W: Write>(app: &mut App, out: &mut W) -> std::io::Result<()> {
    for toast in app.notifications.take_unseen() {
        writeln!(out, "{}", render::toast(&toast))?;
    }
    Ok(())
}

/// Returns `false` when the session should end.
async fn handle_input<W: Write>(
    app: &mut App,
    input: FormInput,
    out: &mut W,
) -> Result<bool, Box<dyn Error>> {
    match input {
        FormInput::Quit => return Ok(false),
        FormInput::Set { field, value } => match apply_field(app, &field, &value) {
            Ok(Some(message)) => writeln!(out, "  ! {message}")?,
            Ok(None) => {}
            Err(err) => writeln!(out, "  ! {err}")?,
        },
        FormInput::Next => {
            if let Navigation::Blocked(report) = app.wizard.next(&mut app.notifications) {
                for error in &report.errors {
                    writeln!(out, "  ! {}: {}", error.field, error.message)?;
                }
            } else {
                show_step(app, out)?;
            }
        }
        FormInput::Prev => {
            app.wizard.prev();
            show_step(app, out)?;
        }
        FormInput::Attach { slot, path } => {
            // Failures are already reported as toasts.
            let _ = app
                .wizard
                .attach(&slot, UploadSource::Browse(path), &mut app.notifications);
        }
        FormInput::Detach(slot) => {
            if let Err(err) = app.wizard.detach(&slot) {
                writeln!(out, "  ! {err}")?;
            }
        }
        FormInput::Submit => match app.begin_submit() {
            Ok(pending) => {
                if app.notifications.is_loading() {
                    writeln!(out, "{}", render::SUBMITTING_INDICATOR)?;
                    out.flush()?;
                }
                if let Ok(message) = app.complete_submit(pending).await {
                    flush_toasts(app, out)?;
                    writeln!(out, "{message}")?;
                    app.wizard.dismiss_confirmation();
                    return Ok(false);
                }
            }
            Err(SubmitError::NotOnLastStep) => {
                writeln!(out, "  ! Terminez les étapes précédentes avant d'envoyer")?;
            }
            Err(_) => {}
        },
        FormInput::Show => show_step(app, out)?,
        FormInput::Help => write!(out, "{HELP_TEXT}")?,
        FormInput::Unknown(line) => {
            writeln!(out, "Saisie non reconnue: {line} (essayez /aide)")?;
        }
    }
    Ok(true)
}

/// Fill the form line by line until it is submitted, `/quitter`, or input
/// ends.
pub async fn run_register_with<R, W>(
    app: &mut App,
    input: R,
    out: &mut W,
) -> Result<(), Box<dyn Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{HELP_TEXT}")?;
    show_step(app, out)?;
    out.flush()?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let keep_going = handle_input(app, parse_input(&line), out).await?;
        flush_toasts(app, out)?;
        out.flush()?;
        if !keep_going {
            break;
        }
    }
    Ok(())
}

pub async fn run_register(mut app: App) -> Result<(), Box<dyn Error>> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_register_with(&mut app, stdin, &mut stdout).await
}
