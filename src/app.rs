// ABOUTME: Preview coordinator: turns hotkey, tray, file-open and process-exit events into player actions
// ABOUTME: Runs entirely on the coordination thread and keeps the shared "preview active" flag in sync

use crate::config::Config;
use crate::events::{AppEvent, HotkeyEvent, NoticeSink, TrayEvent};
use crate::media::{Classifier, Direction, MediaPath, Navigator, SiblingEnumerator};
use crate::platform::SelectionSource;
use crate::player::PlayerController;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct PreviewApp<N: NoticeSink> {
    controller: PlayerController<N>,
    navigator: Navigator,
    classifier: Classifier,
    selection: Box<dyn SelectionSource>,
    preview_active: Arc<AtomicBool>,
    close_suppression: Duration,
    suppressed_until: Option<Instant>,
}

impl<N: NoticeSink> PreviewApp<N> {
    pub fn new(
        config: &Config,
        controller: PlayerController<N>,
        selection: Box<dyn SelectionSource>,
    ) -> Self {
        let classifier = Classifier::new(&config.media.extensions);
        debug!(extensions = ?classifier.extensions(), "Media filter configured");
        let navigator = Navigator::new(SiblingEnumerator::new(classifier.clone()));

        Self {
            controller,
            navigator,
            classifier,
            selection,
            preview_active: Arc::new(AtomicBool::new(false)),
            close_suppression: config.preview.close_suppression(),
            suppressed_until: None,
        }
    }

    /// Shared with the hotkey listener, which only reports navigation keys while it is set.
    pub fn preview_active_flag(&self) -> Arc<AtomicBool> {
        self.preview_active.clone()
    }

    #[cfg(test)]
    pub fn controller(&self) -> &PlayerController<N> {
        &self.controller
    }

    pub fn update(&mut self, event: AppEvent) -> Flow {
        let flow = match event {
            AppEvent::Hotkey(HotkeyEvent::TogglePreview) => {
                if self.controller.is_playing() {
                    self.close_preview();
                } else {
                    self.preview_selection();
                }
                Flow::Continue
            }
            AppEvent::Hotkey(HotkeyEvent::Next) => {
                self.navigate(Direction::Next);
                Flow::Continue
            }
            AppEvent::Hotkey(HotkeyEvent::Previous) => {
                self.navigate(Direction::Previous);
                Flow::Continue
            }
            AppEvent::Hotkey(HotkeyEvent::Close) => {
                self.close_preview();
                Flow::Continue
            }
            AppEvent::Tray(TrayEvent::PreviewSelected) => {
                self.preview_selection();
                Flow::Continue
            }
            AppEvent::PlayerExited(exit) => {
                self.controller.handle_exit(exit);
                Flow::Continue
            }
            AppEvent::OpenFiles(paths) => {
                self.open_files(paths);
                Flow::Continue
            }
            AppEvent::Tray(TrayEvent::Quit) | AppEvent::Quit => {
                self.controller.stop();
                Flow::Quit
            }
            // Presentation concerns, handled by the UI layer
            AppEvent::Tray(TrayEvent::About) | AppEvent::Notice(_) => Flow::Continue,
        };

        self.preview_active
            .store(self.controller.has_session(), Ordering::SeqCst);
        flow
    }

    fn preview_selection(&mut self) {
        if self.is_suppressed() {
            debug!("Ignoring preview request right after closing");
            return;
        }

        if !self.selection.is_host_frontmost() {
            debug!("File manager is not frontmost, ignoring preview request");
            return;
        }

        let selection = self.selection.current_selection();
        self.play_first_playable(selection);
    }

    fn open_files(&mut self, paths: Vec<PathBuf>) {
        self.play_first_playable(paths);
    }

    fn play_first_playable(&mut self, paths: Vec<PathBuf>) {
        let playable = paths
            .into_iter()
            .find(|path| self.classifier.is_playable(path));

        match playable {
            Some(path) => self.play(MediaPath::new(path)),
            None => debug!("No playable file among the given paths"),
        }
    }

    fn navigate(&mut self, direction: Direction) {
        let Some(current) = self.controller.current().cloned() else {
            return;
        };

        let target = match direction {
            Direction::Next => self.navigator.next(&current),
            Direction::Previous => self.navigator.previous(&current),
        };

        match target {
            Some(target) => self.play(target),
            None => debug!(file = %current, ?direction, "Nothing to navigate to"),
        }
    }

    fn close_preview(&mut self) {
        self.suppressed_until = Some(Instant::now() + self.close_suppression);
        self.controller.stop();
    }

    fn play(&mut self, media: MediaPath) {
        // Failures are already reported as notices
        if let Err(e) = self.controller.play(media) {
            debug!(error = %e, "Preview not started");
        }
    }

    fn is_suppressed(&self) -> bool {
        self.suppressed_until
            .is_some_and(|until| Instant::now() < until)
    }
}
