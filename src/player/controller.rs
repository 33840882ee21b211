// ABOUTME: Owns the single preview player process: start, stop with SIGTERM-then-SIGKILL, exit reconciliation
// ABOUTME: A watcher thread per process reports exits through the event channel; state changes only on the caller's thread

use crate::events::{AppEvent, NoticeSink, PreviewNotice, ProcessExitEvent};
use crate::media::MediaPath;
use crate::player::launcher::{PlayerError, PlayerLauncher};
use std::io;
use std::process::Child;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

struct PlaybackSession {
    id: u64,
    media: MediaPath,
    pid: u32,
    process: Arc<Mutex<Child>>,
}

pub struct PlayerController<N: NoticeSink> {
    launcher: PlayerLauncher,
    session: Option<PlaybackSession>,
    launches: u64,
    stop_grace: Duration,
    exits: Sender<AppEvent>,
    notices: N,
}

impl<N: NoticeSink> PlayerController<N> {
    pub fn new(
        launcher: PlayerLauncher,
        stop_grace: Duration,
        exits: Sender<AppEvent>,
        notices: N,
    ) -> Self {
        Self {
            launcher,
            session: None,
            launches: 0,
            stop_grace,
            exits,
            notices,
        }
    }

    /// Replaces whatever is playing with `media`. Failures are reported both
    /// as a notice and in the returned error; no session exists afterwards.
    pub fn play(&mut self, media: MediaPath) -> Result<u32, PlayerError> {
        self.stop();

        let child = match self.launcher.spawn(&media) {
            Ok(child) => child,
            Err(PlayerError::NotFound) => {
                warn!("No mpv executable found, cannot preview {}", media);
                self.notices.notify(PreviewNotice::PlayerNotFound);
                return Err(PlayerError::NotFound);
            }
            Err(e) => {
                warn!(file = %media, error = %e, "Player launch failed");
                self.notices.notify(PreviewNotice::LaunchFailed(e.to_string()));
                return Err(e);
            }
        };

        self.launches += 1;
        let id = self.launches;
        let pid = child.id();
        let process = Arc::new(Mutex::new(child));

        if let Err(e) = watch_exit(process.clone(), id, pid, self.exits.clone()) {
            warn!(pid, error = %e, "Failed to start exit watcher, exits will go unnoticed");
        }

        info!(pid, file = %media, "Preview started");
        self.session = Some(PlaybackSession {
            id,
            media: media.clone(),
            pid,
            process,
        });
        self.notices.notify(PreviewNotice::Started(media));

        Ok(pid)
    }

    /// Ends the current session. Bookkeeping is cleared before the process is
    /// confirmed dead so a following `play` is never blocked by it.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        info!(pid = session.pid, file = %session.media, "Stopping preview");
        terminate(&session.process, session.pid, self.stop_grace);
        self.notices.notify(PreviewNotice::Ended);
    }

    /// Reconciles an exit reported by a watcher. Returns `true` when it ended
    /// the current session; exits of replaced or stopped processes are ignored.
    pub fn handle_exit(&mut self, event: ProcessExitEvent) -> bool {
        match &self.session {
            Some(session) if session.id == event.session => {
                info!(pid = event.pid, file = %session.media, "Player closed");
                self.session = None;
                self.notices.notify(PreviewNotice::Ended);
                true
            }
            _ => {
                debug!(
                    session = event.session,
                    pid = event.pid,
                    "Ignoring exit of a process that is no longer tracked"
                );
                false
            }
        }
    }

    /// Live check of the tracked process.
    pub fn is_playing(&self) -> bool {
        let Some(session) = &self.session else {
            return false;
        };

        match lock(&session.process).try_wait() {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(e) => {
                debug!(pid = session.pid, error = %e, "Could not query player status");
                false
            }
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn current(&self) -> Option<&MediaPath> {
        self.session.as_ref().map(|session| &session.media)
    }

    #[cfg(test)]
    pub fn current_session(&self) -> Option<u64> {
        self.session.as_ref().map(|session| session.id)
    }

    #[cfg(test)]
    pub fn current_pid(&self) -> Option<u32> {
        self.session.as_ref().map(|session| session.pid)
    }

    #[cfg(test)]
    pub fn notices(&self) -> &N {
        &self.notices
    }
}

impl<N: NoticeSink> Drop for PlayerController<N> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            terminate(&session.process, session.pid, self.stop_grace);
        }
    }
}

fn lock(process: &Mutex<Child>) -> MutexGuard<'_, Child> {
    process.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn watch_exit(
    process: Arc<Mutex<Child>>,
    session: u64,
    pid: u32,
    events: Sender<AppEvent>,
) -> io::Result<()> {
    thread::Builder::new()
        .name(format!("player-exit-{pid}"))
        .spawn(move || {
            loop {
                let status = lock(&process).try_wait();
                match status {
                    Ok(Some(status)) => {
                        debug!(pid, %status, "Player process exited");
                        break;
                    }
                    Ok(None) => thread::sleep(EXIT_POLL_INTERVAL),
                    Err(e) => {
                        warn!(pid, error = %e, "Lost track of player process");
                        break;
                    }
                }
            }
            let _ = events.send(AppEvent::PlayerExited(ProcessExitEvent { session, pid }));
        })
        .map(|_| ())
}

/// Asks the process to quit, waits up to `grace`, then kills it.
fn terminate(process: &Mutex<Child>, pid: u32, grace: Duration) {
    let mut child = lock(process);

    match child.try_wait() {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(e) => debug!(pid, error = %e, "Could not query player status before stopping"),
    }

    request_exit(&child);

    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid, %status, "Player exited after termination request");
                return;
            }
            Ok(None) => {}
            Err(_) => break,
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(STOP_POLL_INTERVAL.min(deadline - now));
    }

    warn!(pid, "Player still running after {:?}, killing it", grace);
    if let Err(e) = child.kill() {
        debug!(pid, error = %e, "Kill failed, player probably exited meanwhile");
    }
}

#[cfg(unix)]
fn request_exit(child: &Child) {
    let result = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGTERM) };
    if result != 0 {
        debug!(
            pid = child.id(),
            error = %io::Error::last_os_error(),
            "SIGTERM failed"
        );
    }
}

#[cfg(not(unix))]
fn request_exit(_child: &Child) {
    // No graceful signal here; the kill after the grace period does the work.
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn controller(config: PlayerConfig) -> (PlayerController<Vec<PreviewNotice>>, mpsc::Receiver<AppEvent>) {
        let (sender, receiver) = mpsc::channel();
        let controller = PlayerController::new(
            PlayerLauncher::new(config),
            Duration::from_millis(100),
            sender,
            Vec::new(),
        );
        (controller, receiver)
    }

    fn ended_count(notices: &[PreviewNotice]) -> usize {
        notices.iter().filter(|n| **n == PreviewNotice::Ended).count()
    }

    #[test]
    fn test_new_controller_is_idle() {
        let (mut controller, _events) = controller(PlayerConfig::default());

        assert!(!controller.has_session());
        assert!(!controller.is_playing());
        assert!(controller.current().is_none());

        // Stopping while idle is a no-op
        controller.stop();
        assert!(controller.notices().is_empty());
    }

    #[test]
    fn test_missing_player_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let config = PlayerConfig {
            path: None,
            candidates: vec![dir.path().join("mpv").to_string_lossy().into_owned()],
            search_path: false,
            ..PlayerConfig::default()
        };
        let (mut controller, _events) = controller(config);

        let result = controller.play(MediaPath::new("/videos/ep1.mkv"));

        assert!(matches!(result, Err(PlayerError::NotFound)));
        assert_eq!(controller.notices(), &vec![PreviewNotice::PlayerNotFound]);
        assert!(!controller.has_session());
    }

    #[test]
    fn test_stale_exit_while_idle_is_ignored() {
        let (mut controller, _events) = controller(PlayerConfig::default());

        assert!(!controller.handle_exit(ProcessExitEvent {
            session: 1,
            pid: 4242
        }));
        assert!(controller.notices().is_empty());
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::player::controller::test_support::*;
        use std::fs;

        #[test]
        fn test_unlaunchable_player_reports_launch_failure() {
            let dir = TempDir::new().unwrap();
            let not_executable = dir.path().join("mpv");
            fs::write(&not_executable, b"not a program").unwrap();
            let config = PlayerConfig {
                path: Some(not_executable.to_string_lossy().into_owned()),
                candidates: Vec::new(),
                search_path: false,
                ..PlayerConfig::default()
            };
            let (mut controller, _events) = controller(config);

            let result = controller.play(MediaPath::new("/videos/ep1.mkv"));

            assert!(matches!(result, Err(PlayerError::SpawnFailed(_))));
            assert!(matches!(
                controller.notices().as_slice(),
                [PreviewNotice::LaunchFailed(_)]
            ));
            assert!(!controller.has_session());
        }

        #[test]
        fn test_play_starts_session() {
            let (mut controller, _events) = controller(player_config(SLEEPER));
            let media = MediaPath::new("/videos/ep1.mkv");

            let pid = controller.play(media.clone()).unwrap();

            assert!(controller.is_playing());
            assert_eq!(controller.current(), Some(&media));
            assert_eq!(controller.current_pid(), Some(pid));
            assert_eq!(controller.notices(), &vec![PreviewNotice::Started(media)]);
        }

        #[test]
        fn test_second_play_replaces_first_process() {
            let (mut controller, events) = controller(player_config(SLEEPER));
            let a = MediaPath::new("/videos/a.mkv");
            let b = MediaPath::new("/videos/b.mkv");

            let pid_a = controller.play(a.clone()).unwrap();
            let pid_b = controller.play(b.clone()).unwrap();

            assert_ne!(pid_a, pid_b);
            assert_eq!(controller.current(), Some(&b));
            assert!(controller.is_playing());

            // A's process is gone and its exit no longer affects the session
            let exit = wait_for_exit(&events, pid_a).expect("first player should exit");
            assert!(!controller.handle_exit(exit));
            assert!(controller.is_playing());
            assert_eq!(controller.current(), Some(&b));

            assert_eq!(
                controller.notices(),
                &vec![
                    PreviewNotice::Started(a),
                    PreviewNotice::Ended,
                    PreviewNotice::Started(b)
                ]
            );
        }

        #[test]
        fn test_spontaneous_exit_ends_preview_once() {
            let (mut controller, events) = controller(player_config(BRIEF));
            let pid = controller.play(MediaPath::new("/videos/a.mkv")).unwrap();

            let exit = wait_for_exit(&events, pid).expect("player should exit on its own");
            assert!(controller.handle_exit(exit));
            assert!(!controller.has_session());
            assert!(!controller.is_playing());

            // The same notification again is stale
            assert!(!controller.handle_exit(exit));
            assert_eq!(ended_count(controller.notices()), 1);
        }

        #[test]
        fn test_stop_then_exit_notification_ends_once() {
            let (mut controller, events) = controller(player_config(SLEEPER));
            let pid = controller.play(MediaPath::new("/videos/a.mkv")).unwrap();

            controller.stop();
            assert!(!controller.has_session());
            assert!(!controller.is_playing());

            let exit = wait_for_exit(&events, pid).expect("stopped player should exit");
            assert!(!controller.handle_exit(exit));
            assert_eq!(ended_count(controller.notices()), 1);
        }

        #[test]
        fn test_double_stop_with_pending_exit() {
            let (mut controller, events) = controller(player_config(SLEEPER));
            let pid = controller.play(MediaPath::new("/videos/a.mkv")).unwrap();

            controller.stop();
            controller.stop();
            let exit = wait_for_exit(&events, pid).expect("stopped player should exit");
            controller.stop();
            assert!(!controller.handle_exit(exit));

            assert_eq!(ended_count(controller.notices()), 1);
            assert!(!controller.has_session());
        }

        #[test]
        fn test_stop_kills_player_that_ignores_sigterm() {
            let (mut controller, events) = controller(player_config(STUBBORN));
            let pid = controller.play(MediaPath::new("/videos/a.mkv")).unwrap();

            // Give the shell time to install its trap
            thread::sleep(Duration::from_millis(200));

            let started = Instant::now();
            controller.stop();
            assert!(started.elapsed() < Duration::from_secs(2));

            assert!(wait_for_exit(&events, pid).is_some());
            assert_eq!(ended_count(controller.notices()), 1);
        }

        #[test]
        fn test_play_after_spontaneous_exit_starts_fresh() {
            let (mut controller, events) = controller(player_config(BRIEF));
            let first = controller.play(MediaPath::new("/videos/a.mkv")).unwrap();
            let exit = wait_for_exit(&events, first).unwrap();

            // Exit not reconciled yet: play must still retire the dead session
            let second = controller.play(MediaPath::new("/videos/b.mkv")).unwrap();
            assert!(!controller.handle_exit(exit));
            assert_eq!(controller.current_pid(), Some(second));
        }

        #[test]
        fn test_exit_of_earlier_launch_with_recycled_pid_is_ignored() {
            let (mut controller, events) = controller(player_config(SLEEPER));
            let first = controller.play(MediaPath::new("/videos/a.mkv")).unwrap();
            let first_session = controller.current_session().unwrap();
            controller.stop();
            wait_for_exit(&events, first).expect("stopped player should exit");

            let second = controller.play(MediaPath::new("/videos/b.mkv")).unwrap();
            assert_ne!(controller.current_session(), Some(first_session));

            // The OS handed the first player's pid to the second one
            let late = ProcessExitEvent {
                session: first_session,
                pid: second,
            };
            assert!(!controller.handle_exit(late));
            assert!(controller.is_playing());
            assert_eq!(controller.current_pid(), Some(second));
            assert_eq!(ended_count(controller.notices()), 1);
        }

        #[test]
        fn test_drop_terminates_player() {
            let (mut controller, events) = controller(player_config(SLEEPER));
            let pid = controller.play(MediaPath::new("/videos/a.mkv")).unwrap();

            drop(controller);

            assert!(wait_for_exit(&events, pid).is_some());
        }
    }
}
