// ABOUTME: Fallback collaborators for platforms without Finder, global hotkeys or a menubar
// ABOUTME: Files still open via the command line; state changes and alerts go to the log

use crate::events::{AppEvent, TrayEvent};
use crate::platform::{AlertPresenter, AlertStyle, HotkeyListener, SelectionSource, StatusIndicator};
use anyhow::{Result, anyhow};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::Sender;
use tracing::{error, info};

pub struct NoSelection;

impl SelectionSource for NoSelection {
    fn current_selection(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    fn is_host_frontmost(&self) -> bool {
        false
    }
}

pub struct NoHotkeys;

impl HotkeyListener for NoHotkeys {
    fn check_permissions(&self) -> bool {
        true
    }

    fn start(&mut self, _events: Sender<AppEvent>, _preview_active: Arc<AtomicBool>) -> Result<()> {
        Err(anyhow!("Global hotkeys are only supported on macOS"))
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct LogIndicator {
    active: bool,
}

impl StatusIndicator for LogIndicator {
    fn set_active(&mut self, active: bool) {
        if self.active != active {
            info!(active, "Preview state changed");
        }
        self.active = active;
    }

    fn try_recv_event(&mut self) -> Option<TrayEvent> {
        None
    }
}

pub struct LogAlerts;

impl AlertPresenter for LogAlerts {
    fn show_alert(&self, style: AlertStyle, title: &str, message: &str) {
        match style {
            AlertStyle::Critical => error!("{title}: {message}"),
            AlertStyle::Informational => info!("{title}: {message}"),
        }
    }
}
