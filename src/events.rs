// ABOUTME: Typed messages delivered to the coordination thread and the notices it emits
// ABOUTME: Hotkey, tray and process-watcher threads only ever send these; all state changes happen on receipt

use crate::media::MediaPath;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// Control+Space: preview when idle, close when playing.
    TogglePreview,
    Next,
    Previous,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    PreviewSelected,
    About,
    Quit,
}

/// Reported by the watcher thread when a player process terminates, for any reason.
/// `session` identifies the launch, so a recycled pid cannot match a newer player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExitEvent {
    pub session: u64,
    pub pid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewNotice {
    Started(MediaPath),
    Ended,
    PlayerNotFound,
    LaunchFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Hotkey(HotkeyEvent),
    Tray(TrayEvent),
    PlayerExited(ProcessExitEvent),
    Notice(PreviewNotice),
    /// Files handed to the app directly ("Open With" or command line).
    OpenFiles(Vec<PathBuf>),
    Quit,
}

pub trait NoticeSink {
    fn notify(&mut self, notice: PreviewNotice);
}

impl NoticeSink for Sender<AppEvent> {
    fn notify(&mut self, notice: PreviewNotice) {
        if let Err(e) = self.send(AppEvent::Notice(notice)) {
            tracing::debug!(notice = ?e.0, "Dropping notice, event loop has shut down");
        }
    }
}

impl NoticeSink for Vec<PreviewNotice> {
    fn notify(&mut self, notice: PreviewNotice) {
        self.push(notice);
    }
}
