//! Toasts rendered as one stderr line each.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use fleetops_core::{Notifier, Toast, ToastKind};

/// Writes toasts to stderr. Success toasts are dropped in quiet mode;
/// errors always print.
#[derive(Debug, Clone, Copy)]
pub struct StderrNotifier {
    pub quiet: bool,
    pub color: bool,
}

impl Notifier for StderrNotifier {
    fn notify(&self, toast: Toast) {
        if self.quiet && toast.kind == ToastKind::Success {
            return;
        }
        let line = match (toast.kind, self.color) {
            (ToastKind::Success, true) => format!("{} {}", "✓".green(), toast.description),
            (ToastKind::Error, true) => format!("{} {}", "✗".red(), toast.description.red()),
            (ToastKind::Success, false) => format!("ok: {}", toast.description),
            (ToastKind::Error, false) => format!("error: {}", toast.description),
        };
        let _ = writeln!(io::stderr().lock(), "{line}");
    }
}
