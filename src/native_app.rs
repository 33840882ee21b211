// ABOUTME: Single-process runner wiring config, platform services and the preview coordinator together
// ABOUTME: Owns the event channel and drives the command loop on the main thread alongside the native run loop

use crate::app::{Flow, PreviewApp};
use crate::config::Config;
use crate::events::{AppEvent, PreviewNotice, TrayEvent};
use crate::platform::{
    AlertPresenter, AlertStyle, HotkeyListener, OpenDocumentsHandler, Platform, StatusIndicator,
    forward_open_files,
};
use crate::player::{PlayerController, PlayerLauncher};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const LOOP_INTERVAL: Duration = Duration::from_millis(25);

const ABOUT_MESSAGE: &str = "Press Control+Space with a video selected in Finder to preview it.\n\
Up and Down step through the folder, Escape closes the preview.";

const ACCESSIBILITY_MESSAGE: &str = "QuickPlay needs accessibility permission to detect Control+Space.\n\n\
Grant it in System Settings > Privacy & Security > Accessibility, then restart QuickPlay.";

pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub files: Vec<PathBuf>,
}

pub struct NativeApp {
    app: PreviewApp<Sender<AppEvent>>,
    _open_documents: Option<OpenDocumentsHandler>,
    hotkey_listener: Option<Box<dyn HotkeyListener>>,
    status: Option<Box<dyn StatusIndicator>>,
    alerts: Box<dyn AlertPresenter>,
    event_sender: Sender<AppEvent>,
    event_receiver: Receiver<AppEvent>,
}

impl NativeApp {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let (event_sender, event_receiver) = mpsc::channel();

        let config = load_config(config_path);
        info!(
            extensions = config.media.extensions.len(),
            "Configuration ready"
        );

        let controller = PlayerController::new(
            PlayerLauncher::new(config.player.clone()),
            config.player.stop_grace(),
            event_sender.clone(),
            event_sender.clone(),
        );
        let app = PreviewApp::new(&config, controller, Platform::selection_source(&config));

        Ok(Self {
            app,
            _open_documents: None,
            hotkey_listener: None,
            status: None,
            alerts: Platform::alert_presenter(),
            event_sender,
            event_receiver,
        })
    }

    /// Must run before the status indicator is created.
    pub fn initialize_platform(&mut self) -> Result<()> {
        self._open_documents = Some(Platform::initialize(self.event_sender.clone())?);
        Ok(())
    }

    pub fn setup_global_hotkey(&mut self) -> Result<()> {
        let mut listener = Platform::hotkey_listener();

        register_hotkeys(
            listener.as_mut(),
            self.alerts.as_ref(),
            self.event_sender.clone(),
            self.app.preview_active_flag(),
        )?;
        info!("Global hotkey registered: Control+Space");
        self.hotkey_listener = Some(listener);
        Ok(())
    }

    pub fn setup_status_indicator(&mut self) -> Result<()> {
        self.status = Some(Platform::status_indicator()?);
        Ok(())
    }

    pub fn open_files(&self, files: Vec<PathBuf>) {
        if !files.is_empty() && !forward_open_files(files, &self.event_sender) {
            warn!("Event loop is not running, ignoring files");
        }
    }

    pub fn run_command_loop(&mut self) -> Result<()> {
        info!("Starting command processing loop");

        'running: loop {
            Platform::pump_events(LOOP_INTERVAL);

            let mut pending = Vec::new();
            match self.event_receiver.recv_timeout(LOOP_INTERVAL) {
                Ok(event) => pending.push(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Event channel disconnected - exiting");
                    break;
                }
            }
            pending.extend(self.event_receiver.try_iter());

            if let Some(status) = self.status.as_mut() {
                while let Some(event) = status.try_recv_event() {
                    pending.push(AppEvent::Tray(event));
                }
            }

            for event in pending {
                if self.handle_event(event) == Flow::Quit {
                    info!("Quit requested - exiting application");
                    break 'running;
                }
            }
        }

        self.shutdown();
        info!("Command loop finished");
        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) -> Flow {
        debug!(?event, "Processing event");

        match &event {
            AppEvent::Notice(notice) => self.present_notice(notice),
            AppEvent::Tray(TrayEvent::About) => self.alerts.show_alert(
                AlertStyle::Informational,
                "QuickPlay",
                &format!("Version {}\n\n{ABOUT_MESSAGE}", env!("CARGO_PKG_VERSION")),
            ),
            _ => {}
        }

        self.app.update(event)
    }

    fn present_notice(&mut self, notice: &PreviewNotice) {
        match notice {
            PreviewNotice::Started(media) => info!(file = %media, "Preview started"),
            PreviewNotice::Ended => info!("Preview ended"),
            PreviewNotice::PlayerNotFound => error!("mpv could not be located"),
            PreviewNotice::LaunchFailed(reason) => error!(%reason, "mpv failed to launch"),
        }

        if let Some(active) = indicator_state(notice) {
            if let Some(status) = self.status.as_mut() {
                status.set_active(active);
            }
        }

        if let Some((title, message)) = notice_alert(notice) {
            self.alerts.show_alert(AlertStyle::Critical, title, &message);
        }
    }

    fn shutdown(&mut self) {
        self.app.update(AppEvent::Quit);

        if let Some(mut listener) = self.hotkey_listener.take() {
            if let Err(e) = listener.stop() {
                warn!(error = %e, "Failed to unregister global hotkey");
            }
        }
    }
}

/// Checks permissions once, telling the user when access is missing, then
/// starts the listener.
fn register_hotkeys(
    listener: &mut dyn HotkeyListener,
    alerts: &dyn AlertPresenter,
    events: Sender<AppEvent>,
    preview_active: Arc<AtomicBool>,
) -> Result<()> {
    if !listener.check_permissions() {
        alerts.show_alert(
            AlertStyle::Critical,
            "Accessibility Permission Required",
            ACCESSIBILITY_MESSAGE,
        );
        anyhow::bail!("Accessibility access is required for global hotkeys");
    }

    listener.start(events, preview_active)
}

/// Loads the configuration, writing the default file on first run and
/// falling back to defaults when the file is unusable.
pub fn load_config(explicit: Option<&Path>) -> Config {
    let mut config = read_config(explicit).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    if let Err(e) = config.expand_path() {
        warn!(error = %e, "Failed to expand config paths, using defaults");
        config = Config::default();
    }

    if let Err(e) = config.validate() {
        warn!(error = %e, "Invalid configuration, using defaults");
        config = Config::default();
    }

    config
}

fn read_config(explicit: Option<&Path>) -> Result<Config> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Config::default_config_path()?,
    };

    if !config_path.exists() {
        Config::save_default_config(&config_path)?;
        info!(path = %config_path.display(), "Created default configuration");
    }

    Config::load_from_file(&config_path)
}

fn indicator_state(notice: &PreviewNotice) -> Option<bool> {
    match notice {
        PreviewNotice::Started(_) => Some(true),
        PreviewNotice::Ended => Some(false),
        PreviewNotice::PlayerNotFound | PreviewNotice::LaunchFailed(_) => None,
    }
}

fn notice_alert(notice: &PreviewNotice) -> Option<(&'static str, String)> {
    match notice {
        PreviewNotice::PlayerNotFound => Some((
            "mpv Not Found",
            "QuickPlay needs mpv to play videos.\n\nInstall it with Homebrew:\nbrew install mpv"
                .to_string(),
        )),
        PreviewNotice::LaunchFailed(reason) => {
            Some(("Failed to Launch mpv", format!("Could not start mpv: {reason}")))
        }
        PreviewNotice::Started(_) | PreviewNotice::Ended => None,
    }
}

pub fn run_native_app(options: RunOptions) -> Result<()> {
    info!("Starting QuickPlay...");

    let mut app = NativeApp::new(options.config_path.as_deref())?;

    // The shared application must exist before any tray or event tap is created
    app.initialize_platform()?;

    if let Err(e) = app.setup_global_hotkey() {
        warn!(error = %e, "Failed to set up global hotkey");
        warn!("Continuing with menu and command line operation only");
    }

    if let Err(e) = app.setup_status_indicator() {
        warn!(error = %e, "Failed to create menubar item");
    }

    app.open_files(options.files);

    info!("QuickPlay is running: select a video in Finder and press Control+Space");
    app.run_command_loop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaPath;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use tempfile::TempDir;

    struct FakeListener {
        granted: bool,
        checks: Cell<usize>,
        starts: usize,
    }

    impl FakeListener {
        fn new(granted: bool) -> Self {
            Self {
                granted,
                checks: Cell::new(0),
                starts: 0,
            }
        }
    }

    impl HotkeyListener for FakeListener {
        fn check_permissions(&self) -> bool {
            self.checks.set(self.checks.get() + 1);
            self.granted
        }

        fn start(&mut self, _events: Sender<AppEvent>, _preview_active: Arc<AtomicBool>) -> Result<()> {
            self.starts += 1;
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingAlerts {
        titles: RefCell<Vec<String>>,
    }

    impl AlertPresenter for RecordingAlerts {
        fn show_alert(&self, _style: AlertStyle, title: &str, _message: &str) {
            self.titles.borrow_mut().push(title.to_string());
        }
    }

    #[test]
    fn test_register_hotkeys_checks_permissions_once() {
        let (sender, _receiver) = mpsc::channel();
        let mut listener = FakeListener::new(true);
        let alerts = RecordingAlerts::default();

        let result = register_hotkeys(
            &mut listener,
            &alerts,
            sender,
            Arc::new(AtomicBool::new(false)),
        );

        assert!(result.is_ok());
        assert_eq!(listener.checks.get(), 1);
        assert_eq!(listener.starts, 1);
        assert!(alerts.titles.borrow().is_empty());
    }

    #[test]
    fn test_register_hotkeys_without_permission_tells_user() {
        let (sender, _receiver) = mpsc::channel();
        let mut listener = FakeListener::new(false);
        let alerts = RecordingAlerts::default();

        let result = register_hotkeys(
            &mut listener,
            &alerts,
            sender,
            Arc::new(AtomicBool::new(false)),
        );

        assert!(result.is_err());
        assert_eq!(listener.checks.get(), 1);
        assert_eq!(listener.starts, 0);
        assert_eq!(
            alerts.titles.borrow().as_slice(),
            ["Accessibility Permission Required"]
        );
    }

    #[test]
    fn test_load_config_creates_default_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = load_config(Some(&config_path));

        assert!(config_path.exists());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_reads_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[player]
candidates = ["/opt/mpv/bin/mpv"]
search_path = false
stop_grace_ms = 250

[media]
extensions = ["mkv"]

[preview]
host_bundle_id = "com.apple.finder"
"#,
        )
        .unwrap();

        let config = load_config(Some(&config_path));

        assert_eq!(config.player.candidates, vec!["/opt/mpv/bin/mpv"]);
        assert!(!config.player.search_path);
        assert_eq!(config.player.stop_grace(), Duration::from_millis(250));
        assert_eq!(config.media.extensions, vec!["mkv"]);
    }

    #[test]
    fn test_load_config_falls_back_on_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        fs::write(&config_path, "this is not [valid toml").unwrap();
        assert_eq!(load_config(Some(&config_path)), Config::default());

        let zero_grace = Config::default_config_content()
            .replace("stop_grace_ms = 100", "stop_grace_ms = 0");
        assert!(Config::load_from_str(&zero_grace).is_ok());
        fs::write(&config_path, zero_grace).unwrap();
        assert_eq!(load_config(Some(&config_path)), Config::default());
    }

    #[test]
    fn test_indicator_follows_preview_state() {
        let media = MediaPath::new("/videos/ep1.mkv");

        assert_eq!(indicator_state(&PreviewNotice::Started(media)), Some(true));
        assert_eq!(indicator_state(&PreviewNotice::Ended), Some(false));
        assert_eq!(indicator_state(&PreviewNotice::PlayerNotFound), None);
    }

    #[test]
    fn test_failures_raise_alerts() {
        let (title, message) = notice_alert(&PreviewNotice::PlayerNotFound).unwrap();
        assert_eq!(title, "mpv Not Found");
        assert!(message.contains("brew install mpv"));

        let (title, message) =
            notice_alert(&PreviewNotice::LaunchFailed("permission denied".to_string())).unwrap();
        assert_eq!(title, "Failed to Launch mpv");
        assert!(message.contains("permission denied"));

        assert!(notice_alert(&PreviewNotice::Ended).is_none());
    }
}
