// ABOUTME: Platform abstraction layer for the OS collaborators around the preview core
// ABOUTME: Selection queries, global hotkeys, the status indicator, alerts and event pumping live behind these traits

use crate::config::Config;
use crate::events::{AppEvent, TrayEvent};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::Sender;
use std::time::Duration;
use tracing::debug;

#[cfg(not(target_os = "macos"))]
pub mod headless;
#[cfg(target_os = "macos")]
pub mod macos;

/// What the file manager currently has selected.
pub trait SelectionSource {
    /// Selected paths in selection order; empty when nothing is selected or the query fails.
    fn current_selection(&self) -> Vec<PathBuf>;

    /// Whether the file manager is the frontmost application.
    fn is_host_frontmost(&self) -> bool;
}

/// Global key capture feeding [`AppEvent::Hotkey`] into the event channel.
pub trait HotkeyListener {
    /// Whether the listener may observe keys. Asks the OS to prompt the user
    /// when access is missing.
    fn check_permissions(&self) -> bool;

    /// Start listening, without re-checking permissions. Navigation and close
    /// keys are only reported while `preview_active` is set.
    fn start(&mut self, events: Sender<AppEvent>, preview_active: Arc<AtomicBool>) -> Result<()>;

    fn stop(&mut self) -> Result<()>;
}

/// Menubar icon reflecting whether a preview is active.
pub trait StatusIndicator {
    fn set_active(&mut self, active: bool);

    /// Next pending menu action, if any.
    fn try_recv_event(&mut self) -> Option<TrayEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStyle {
    Critical,
    Informational,
}

/// User-facing, non-blocking alerts.
pub trait AlertPresenter {
    fn show_alert(&self, style: AlertStyle, title: &str, message: &str);
}

/// Keeps the OS "open documents" handler installed while alive.
pub struct OpenDocumentsHandler {
    #[cfg(target_os = "macos")]
    _delegate: objc2::rc::Retained<macos::AppDelegate>,
}

/// Platform factory to get the appropriate implementations
pub struct Platform;

impl Platform {
    #[cfg(target_os = "macos")]
    pub fn selection_source(config: &Config) -> Box<dyn SelectionSource> {
        Box::new(macos::FinderSelection::new(config.preview.host_bundle_id.clone()))
    }

    #[cfg(not(target_os = "macos"))]
    pub fn selection_source(_config: &Config) -> Box<dyn SelectionSource> {
        Box::new(headless::NoSelection)
    }

    #[cfg(target_os = "macos")]
    pub fn hotkey_listener() -> Box<dyn HotkeyListener> {
        Box::new(macos::MacOSHotkeyListener::new())
    }

    #[cfg(not(target_os = "macos"))]
    pub fn hotkey_listener() -> Box<dyn HotkeyListener> {
        Box::new(headless::NoHotkeys)
    }

    #[cfg(target_os = "macos")]
    pub fn status_indicator() -> Result<Box<dyn StatusIndicator>> {
        Ok(Box::new(crate::tray::StatusTray::new()?))
    }

    #[cfg(not(target_os = "macos"))]
    pub fn status_indicator() -> Result<Box<dyn StatusIndicator>> {
        Ok(Box::new(headless::LogIndicator::default()))
    }

    #[cfg(target_os = "macos")]
    pub fn alert_presenter() -> Box<dyn AlertPresenter> {
        Box::new(macos::ScriptAlerts)
    }

    #[cfg(not(target_os = "macos"))]
    pub fn alert_presenter() -> Box<dyn AlertPresenter> {
        Box::new(headless::LogAlerts)
    }

    /// One-time application setup before any UI is created. Files the OS
    /// asks us to open arrive as [`AppEvent::OpenFiles`] on `events`.
    #[cfg(target_os = "macos")]
    pub fn initialize(events: Sender<AppEvent>) -> Result<OpenDocumentsHandler> {
        Ok(OpenDocumentsHandler {
            _delegate: macos::initialize_application(events)?,
        })
    }

    #[cfg(not(target_os = "macos"))]
    pub fn initialize(_events: Sender<AppEvent>) -> Result<OpenDocumentsHandler> {
        Ok(OpenDocumentsHandler {})
    }

    /// Give the OS a chance to deliver UI events, for at most `timeout`.
    #[cfg(target_os = "macos")]
    pub fn pump_events(timeout: Duration) {
        macos::pump_events(timeout);
    }

    #[cfg(not(target_os = "macos"))]
    pub fn pump_events(_timeout: Duration) {}
}

/// Queues files to open. Returns `false` when there was nothing to send or
/// the event loop is gone.
pub fn forward_open_files(paths: Vec<PathBuf>, events: &Sender<AppEvent>) -> bool {
    if paths.is_empty() {
        return false;
    }

    debug!(count = paths.len(), "Files handed over for opening");
    events.send(AppEvent::OpenFiles(paths)).is_ok()
}

/// Splits newline-separated script output into paths, dropping blank lines.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub fn parse_path_lines(output: &str) -> Vec<PathBuf> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Quotes `text` as an AppleScript string literal.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub fn applescript_quote(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
