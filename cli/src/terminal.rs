use std::io::{self, BufRead, Write};

use patient_portal::{Confirm, Level, Navigator, Notification, Notifier, Route};

/// Prints toasts to stderr, one line each
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notification: Notification) {
        let tag = match notification.level {
            Level::Success => "ok",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        if notification.description.is_empty() {
            eprintln!("[{}] {}", tag, notification.title);
        } else {
            eprintln!(
                "[{}] {}: {}",
                tag, notification.title, notification.description
            );
        }
    }
}

/// A terminal has no pages; navigation becomes a hint about what to run next.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!("navigate to {}", route);
        match route {
            Route::Login => eprintln!("Please log in again: portal login send-otp <mobile>"),
            Route::Appointments => eprintln!("See your appointments: portal appointments"),
            Route::Dashboard => eprintln!("Open your dashboard: portal dashboard"),
            _ => {}
        }
    }
}

/// Yes/no prompt on stdin, skipped entirely with `--yes`
pub struct StdinConfirm {
    assume_yes: bool,
}

impl StdinConfirm {
    pub const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", prompt);
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}
