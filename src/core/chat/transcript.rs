use chrono::{DateTime, Local};

pub const APOLOGY_MESSAGE: &str = "Désolé, une erreur s'est produite. Veuillez réessayer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Local>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            sent_at: Local::now(),
        }
    }

    /// `HH:MM`, as shown under each bubble.
    pub fn time_label(&self) -> String {
        self.sent_at.format("%H:%M").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    pub key: &'static str,
    pub label: &'static str,
    pub question: &'static str,
}

/// Every shortcut the composer understands, keyed by name.
pub const QUICK_ACTIONS: &[QuickAction] = &[
    QuickAction {
        key: "programmes",
        label: "Programmes disponibles",
        question: "Quels sont les programmes disponibles ?",
    },
    QuickAction {
        key: "documents",
        label: "Documents requis",
        question: "Quels documents sont nécessaires ?",
    },
    QuickAction {
        key: "frais",
        label: "Frais de scolarité",
        question: "Quels sont les frais de scolarité ?",
    },
    QuickAction {
        key: "calendrier",
        label: "Calendrier académique",
        question: "Quel est le calendrier académique ?",
    },
    QuickAction {
        key: "inscription",
        label: "Procédure d'inscription",
        question: "Comment puis-je m'inscrire ?",
    },
    QuickAction {
        key: "aide",
        label: "Aide",
        question: "J'ai besoin d'aide",
    },
    QuickAction {
        key: "contact",
        label: "Contact",
        question: "Comment vous contacter ?",
    },
    QuickAction {
        key: "admission",
        label: "Conditions d'admission",
        question: "Quelles sont les conditions d'admission ?",
    },
];

/// Keys shown on the welcome panel.
const WELCOME_SHORTCUTS: [&str; 4] = ["programmes", "documents", "frais", "inscription"];

pub fn find_quick_action(key: &str) -> Option<&'static QuickAction> {
    QUICK_ACTIONS.iter().find(|action| action.key == key)
}

/// Text a shortcut sends: the canned question, or the key itself when no
/// shortcut has that name.
pub fn quick_action_text(key: &str) -> &str {
    find_quick_action(key)
        .map(|action| action.question)
        .unwrap_or(key)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomePanel {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub shortcuts: Vec<&'static QuickAction>,
}

impl WelcomePanel {
    fn with_title(title: &'static str) -> Self {
        Self {
            title,
            subtitle: "Comment puis-je vous aider aujourd'hui ?",
            shortcuts: WELCOME_SHORTCUTS
                .iter()
                .filter_map(|key| find_quick_action(key))
                .collect(),
        }
    }

    pub fn greeting() -> Self {
        Self::with_title("Bienvenue ! 👋")
    }

    pub fn new_conversation() -> Self {
        Self::with_title("Nouvelle conversation ! 👋")
    }
}

/// The visible conversation. The welcome panel disappears with the first
/// message and comes back on a new chat.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    turns: Vec<Turn>,
    welcome: Option<WelcomePanel>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self {
            turns: Vec::new(),
            welcome: Some(WelcomePanel::greeting()),
        }
    }
}

impl Transcript {
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn welcome(&self) -> Option<&WelcomePanel> {
        self.welcome.as_ref()
    }

    pub fn push(&mut self, turn: Turn) {
        self.welcome = None;
        self.turns.push(turn);
    }

    pub fn restart(&mut self) {
        self.turns.clear();
        self.welcome = Some(WelcomePanel::new_conversation());
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}
