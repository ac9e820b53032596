//! Toast notifications and the loading indicator.
//!
//! Toasts are raised by the form wizard and the chat manager and drained by
//! whichever host renders them. Each toast expires a fixed time after it was
//! raised; removing one that is already gone is a no-op.

use std::time::{Duration, Instant};

use tracing::debug;

pub const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn icon(self) -> &'static str {
        match self {
            ToastKind::Success => "✅",
            ToastKind::Error => "❌",
            ToastKind::Warning => "⚠️",
            ToastKind::Info => "ℹ️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub raised_at: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) >= TOAST_DURATION
    }
}

#[derive(Debug, Default)]
pub struct Notifications {
    toasts: Vec<Toast>,
    next_id: u64,
    loading: bool,
    /// Toasts with an id below this were already handed to the renderer.
    seen_below: u64,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toast(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.toast_at(kind, message, Instant::now())
    }

    pub fn toast_at(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let message = message.into();
        debug!(id, ?kind, %message, "Toast raised");
        self.toasts.push(Toast {
            id,
            kind,
            message,
            raised_at: now,
        });
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.toast(ToastKind::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.toast(ToastKind::Error, message)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> u64 {
        self.toast(ToastKind::Warning, message)
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.toast(ToastKind::Info, message)
    }

    /// Remove a toast. Returns whether anything was removed.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        self.toasts.len() != before
    }

    /// Drop every toast whose display time has elapsed.
    pub fn prune(&mut self, now: Instant) {
        self.toasts.retain(|toast| !toast.is_expired(now));
    }

    pub fn active(&self) -> &[Toast] {
        &self.toasts
    }

    /// Toasts raised since the last call, oldest first.
    pub fn take_unseen(&mut self) -> Vec<Toast> {
        let seen_below = std::mem::replace(&mut self.seen_below, self.next_id);
        self.toasts
            .iter()
            .filter(|toast| toast.id >= seen_below)
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    pub fn contains(&self, kind: ToastKind, message: &str) -> bool {
        self.toasts
            .iter()
            .any(|toast| toast.kind == kind && toast.message == message)
    }

    pub fn count_of(&self, kind: ToastKind) -> usize {
        self.toasts.iter().filter(|toast| toast.kind == kind).count()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
