// ── User-facing notifications ──
//
// Fire-and-forget toasts. The core decides *what* to say; the shell
// decides how (or whether) to show it.

use std::fmt;

use tracing::{info, warn};

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// A transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub kind: ToastKind,
}

impl Toast {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            title: "Success".into(),
            description: description.into(),
            kind: ToastKind::Success,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            title: "Error".into(),
            description: description.into(),
            kind: ToastKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == ToastKind::Error
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Receives toasts. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Sends toasts to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => info!(title = %toast.title, "{}", toast.description),
            ToastKind::Error => warn!(title = %toast.title, "{}", toast.description),
        }
    }
}
