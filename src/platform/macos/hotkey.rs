// ABOUTME: macOS global key listener built on a Core Graphics event tap on the main run loop
// ABOUTME: Claims Control+Space, and arrows and Escape while previewing, so the frontmost app never sees them

use crate::events::AppEvent;
use crate::hotkey::dispatch_key;
use crate::platform::HotkeyListener;
use anyhow::{Result, anyhow};
use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::mpsc::Sender;
use tracing::{debug, info, warn};

type CFTypeRef = *const c_void;
type CFStringRef = *const c_void;
type CFDictionaryRef = *const c_void;
type CFMachPortRef = *mut c_void;
type CFRunLoopRef = *mut c_void;
type CFRunLoopSourceRef = *mut c_void;
type CGEventRef = *mut c_void;
type CGEventTapProxy = *mut c_void;

type CGEventTapCallBack = unsafe extern "C" fn(
    proxy: CGEventTapProxy,
    event_type: u32,
    event: CGEventRef,
    user_info: *mut c_void,
) -> CGEventRef;

#[repr(C)]
struct CFDictionaryCallBacks {
    _private: [u8; 0],
}

const SESSION_EVENT_TAP: u32 = 1;
const HEAD_INSERT_EVENT_TAP: u32 = 0;
const EVENT_TAP_OPTION_DEFAULT: u32 = 0;
const EVENT_KEY_DOWN: u32 = 10;
const EVENT_TAP_DISABLED_BY_TIMEOUT: u32 = 0xFFFF_FFFE;
const EVENT_TAP_DISABLED_BY_USER_INPUT: u32 = 0xFFFF_FFFF;
const KEYBOARD_EVENT_KEYCODE: u32 = 9;
const EVENT_FLAG_MASK_CONTROL: u64 = 0x0004_0000;

// Link to ApplicationServices framework for accessibility permissions
#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    static kAXTrustedCheckOptionPrompt: CFStringRef;
    fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
}

#[link(name = "CoreGraphics", kind = "framework")]
unsafe extern "C" {
    fn CGEventTapCreate(
        tap: u32,
        place: u32,
        options: u32,
        events_of_interest: u64,
        callback: CGEventTapCallBack,
        user_info: *mut c_void,
    ) -> CFMachPortRef;
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
    fn CGEventGetIntegerValueField(event: CGEventRef, field: u32) -> i64;
    fn CGEventGetFlags(event: CGEventRef) -> u64;
}

#[link(name = "CoreFoundation", kind = "framework")]
unsafe extern "C" {
    static kCFRunLoopCommonModes: CFStringRef;
    static kCFBooleanTrue: CFTypeRef;
    static kCFTypeDictionaryKeyCallBacks: CFDictionaryCallBacks;
    static kCFTypeDictionaryValueCallBacks: CFDictionaryCallBacks;

    fn CFDictionaryCreate(
        allocator: CFTypeRef,
        keys: *const CFTypeRef,
        values: *const CFTypeRef,
        count: isize,
        key_callbacks: *const CFDictionaryCallBacks,
        value_callbacks: *const CFDictionaryCallBacks,
    ) -> CFDictionaryRef;
    fn CFMachPortCreateRunLoopSource(
        allocator: CFTypeRef,
        port: CFMachPortRef,
        order: isize,
    ) -> CFRunLoopSourceRef;
    fn CFMachPortInvalidate(port: CFMachPortRef);
    fn CFRunLoopGetMain() -> CFRunLoopRef;
    fn CFRunLoopAddSource(run_loop: CFRunLoopRef, source: CFRunLoopSourceRef, mode: CFStringRef);
    fn CFRunLoopRemoveSource(run_loop: CFRunLoopRef, source: CFRunLoopSourceRef, mode: CFStringRef);
    fn CFRelease(object: CFTypeRef);
}

/// State handed to the tap callback. Boxed so its address outlives the tap.
struct TapContext {
    events: Sender<AppEvent>,
    preview_active: Arc<AtomicBool>,
    port: AtomicPtr<c_void>,
}

struct EventTap {
    port: CFMachPortRef,
    source: CFRunLoopSourceRef,
    _context: Box<TapContext>,
}

pub struct MacOSHotkeyListener {
    tap: Option<EventTap>,
}

impl MacOSHotkeyListener {
    pub fn new() -> Self {
        Self { tap: None }
    }
}

/// Asks the system whether we may observe keystrokes. When we may not, macOS
/// shows its own prompt pointing the user at the Accessibility settings.
fn accessibility_trusted_with_prompt() -> bool {
    unsafe {
        let keys = [kAXTrustedCheckOptionPrompt];
        let values = [kCFBooleanTrue];
        let options = CFDictionaryCreate(
            ptr::null(),
            keys.as_ptr(),
            values.as_ptr(),
            1,
            &kCFTypeDictionaryKeyCallBacks,
            &kCFTypeDictionaryValueCallBacks,
        );

        let trusted = AXIsProcessTrustedWithOptions(options);
        if !options.is_null() {
            CFRelease(options);
        }
        trusted
    }
}

unsafe extern "C" fn handle_tap_event(
    _proxy: CGEventTapProxy,
    event_type: u32,
    event: CGEventRef,
    user_info: *mut c_void,
) -> CGEventRef {
    if user_info.is_null() {
        return event;
    }
    let context = unsafe { &*(user_info as *const TapContext) };

    if event_type == EVENT_TAP_DISABLED_BY_TIMEOUT || event_type == EVENT_TAP_DISABLED_BY_USER_INPUT {
        let port = context.port.load(Ordering::SeqCst);
        if !port.is_null() {
            unsafe { CGEventTapEnable(port, true) };
            debug!("Event tap was disabled by the system, re-enabled it");
        }
        return event;
    }

    if event_type != EVENT_KEY_DOWN {
        return event;
    }

    let (key_code, flags) = unsafe {
        (
            CGEventGetIntegerValueField(event, KEYBOARD_EVENT_KEYCODE),
            CGEventGetFlags(event),
        )
    };
    let control = flags & EVENT_FLAG_MASK_CONTROL != 0;

    match u16::try_from(key_code) {
        Ok(key_code) if dispatch_key(key_code, control, &context.preview_active, &context.events) => {
            ptr::null_mut()
        }
        _ => event,
    }
}

impl HotkeyListener for MacOSHotkeyListener {
    fn check_permissions(&self) -> bool {
        if accessibility_trusted_with_prompt() {
            return true;
        }

        warn!("Accessibility permissions not granted, global hotkeys are disabled");
        info!("Enable QuickPlay in System Settings > Privacy & Security > Accessibility, then restart it");
        false
    }

    fn start(&mut self, events: Sender<AppEvent>, preview_active: Arc<AtomicBool>) -> Result<()> {
        if self.tap.is_some() {
            return Ok(());
        }

        let context = Box::new(TapContext {
            events,
            preview_active,
            port: AtomicPtr::new(ptr::null_mut()),
        });
        let user_info = &*context as *const TapContext as *mut c_void;

        let port = unsafe {
            CGEventTapCreate(
                SESSION_EVENT_TAP,
                HEAD_INSERT_EVENT_TAP,
                EVENT_TAP_OPTION_DEFAULT,
                1 << EVENT_KEY_DOWN,
                handle_tap_event,
                user_info,
            )
        };
        if port.is_null() {
            return Err(anyhow!(
                "Failed to create keyboard event tap. \
                 Please ensure accessibility permissions are granted in System Settings > \
                 Privacy & Security > Accessibility"
            ));
        }
        context.port.store(port, Ordering::SeqCst);

        let source = unsafe { CFMachPortCreateRunLoopSource(ptr::null(), port, 0) };
        if source.is_null() {
            unsafe {
                CFMachPortInvalidate(port);
                CFRelease(port);
            }
            return Err(anyhow!("Failed to attach keyboard event tap to the run loop"));
        }

        unsafe {
            CFRunLoopAddSource(CFRunLoopGetMain(), source, kCFRunLoopCommonModes);
            CGEventTapEnable(port, true);
        }

        self.tap = Some(EventTap {
            port,
            source,
            _context: context,
        });
        info!("Installed keyboard event tap (Control+Space, arrows, Escape)");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(tap) = self.tap.take() {
            unsafe {
                CGEventTapEnable(tap.port, false);
                CFRunLoopRemoveSource(CFRunLoopGetMain(), tap.source, kCFRunLoopCommonModes);
                CFMachPortInvalidate(tap.port);
                CFRelease(tap.source);
                CFRelease(tap.port);
            }
            info!("Removed keyboard event tap");
        }
        Ok(())
    }
}

impl Drop for MacOSHotkeyListener {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
