// ABOUTME: Maps raw key presses to preview hotkey events using macOS virtual key codes
// ABOUTME: Control+Space always toggles; arrows and Escape only count while a preview is active

use crate::events::{AppEvent, HotkeyEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use tracing::debug;

pub const KEY_SPACE: u16 = 49;
pub const KEY_ESCAPE: u16 = 53;
pub const KEY_DOWN_ARROW: u16 = 125;
pub const KEY_UP_ARROW: u16 = 126;

/// `control` is whether the Control modifier was held; other modifiers do not matter.
pub fn hotkey_for_key(key_code: u16, control: bool, preview_active: bool) -> Option<HotkeyEvent> {
    if key_code == KEY_SPACE && control {
        return Some(HotkeyEvent::TogglePreview);
    }

    if !preview_active {
        return None;
    }

    match key_code {
        KEY_UP_ARROW => Some(HotkeyEvent::Previous),
        KEY_DOWN_ARROW => Some(HotkeyEvent::Next),
        KEY_ESCAPE => Some(HotkeyEvent::Close),
        _ => None,
    }
}

/// Sends the hotkey for a key press, if there is one. Returns `true` when the
/// key was claimed and must not reach the frontmost application.
pub fn dispatch_key(
    key_code: u16,
    control: bool,
    preview_active: &AtomicBool,
    events: &Sender<AppEvent>,
) -> bool {
    let active = preview_active.load(Ordering::SeqCst);
    let Some(hotkey) = hotkey_for_key(key_code, control, active) else {
        return false;
    };

    debug!(?hotkey, key_code, "Hotkey pressed");
    if events.send(AppEvent::Hotkey(hotkey)).is_err() {
        debug!("Event loop has shut down, dropping hotkey");
    }
    true
}
