// ABOUTME: Non-blocking user alerts shown through osascript's "display alert"
// ABOUTME: The script runs in its own process so the coordination thread never waits on the user

use crate::platform::{AlertPresenter, AlertStyle, applescript_quote};
use std::process::Command;
use std::thread;
use tracing::warn;

pub struct ScriptAlerts;

impl AlertPresenter for ScriptAlerts {
    fn show_alert(&self, style: AlertStyle, title: &str, message: &str) {
        let style = match style {
            AlertStyle::Critical => "critical",
            AlertStyle::Informational => "informational",
        };
        let script = format!(
            "display alert {} message {} as {style}",
            applescript_quote(title),
            applescript_quote(message)
        );

        match Command::new("osascript").args(["-e", &script]).spawn() {
            Ok(mut child) => {
                // Reap it once the user dismisses the alert
                thread::spawn(move || child.wait());
            }
            Err(e) => warn!(error = %e, "Failed to show alert \"{title}\": {message}"),
        }
    }
}
