// ABOUTME: macOS collaborators: keyboard event tap, Finder selection query, alerts, open-documents delegate and event pump
// ABOUTME: Runs as an accessory (menubar-only) application on the main thread

pub mod alert;
pub mod hotkey;
pub mod selection;

pub use alert::ScriptAlerts;
pub use hotkey::MacOSHotkeyListener;
pub use selection::FinderSelection;

use crate::events::AppEvent;
use crate::platform::forward_open_files;
use anyhow::{Result, anyhow};
use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2::{DefinedClass, MainThreadOnly, define_class, msg_send};
use objc2_app_kit::{
    NSApplication, NSApplicationActivationPolicy, NSApplicationDelegate, NSEventMask,
};
use objc2_foundation::{
    MainThreadMarker, NSArray, NSDate, NSDefaultRunLoopMode, NSObject, NSObjectProtocol, NSURL,
};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;
use tracing::{debug, info};

pub struct AppDelegateIvars {
    events: Sender<AppEvent>,
}

define_class!(
    // SAFETY: NSObject has no subclassing requirements and AppDelegate does not implement Drop.
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "QuickPlayAppDelegate"]
    #[ivars = AppDelegateIvars]
    pub struct AppDelegate;

    unsafe impl NSObjectProtocol for AppDelegate {}

    unsafe impl NSApplicationDelegate for AppDelegate {
        // "Open With", drops on the app icon, and `open -a QuickPlay file`
        #[unsafe(method(application:openURLs:))]
        fn application_open_urls(&self, _application: &NSApplication, urls: &NSArray<NSURL>) {
            let paths: Vec<PathBuf> = urls
                .to_vec()
                .iter()
                .filter_map(|url| url.to_file_path())
                .collect();

            if !forward_open_files(paths, &self.ivars().events) {
                debug!("No local files among opened URLs");
            }
        }
    }
);

impl AppDelegate {
    fn new(mtm: MainThreadMarker, events: Sender<AppEvent>) -> Retained<Self> {
        let this = Self::alloc(mtm).set_ivars(AppDelegateIvars { events });
        unsafe { msg_send![super(this), init] }
    }
}

/// Sets up the shared application. The returned delegate must be kept alive,
/// NSApplication only holds it weakly.
pub fn initialize_application(events: Sender<AppEvent>) -> Result<Retained<AppDelegate>> {
    let mtm = MainThreadMarker::new()
        .ok_or_else(|| anyhow!("The application must be initialized on the main thread"))?;

    let app = NSApplication::sharedApplication(mtm);
    if !app.setActivationPolicy(NSApplicationActivationPolicy::Accessory) {
        debug!("Activation policy change was refused, a dock icon may be visible");
    }

    // Installed before launch finishes so the documents that launched us are delivered
    let delegate = AppDelegate::new(mtm, events);
    unsafe {
        app.setDelegate(Some(ProtocolObject::from_ref(&*delegate)));
        app.finishLaunching();
    }

    info!("Configured as menubar-only application");
    Ok(delegate)
}

/// Dispatches pending AppKit events (menu clicks, event monitors) until
/// `timeout` has passed.
pub fn pump_events(timeout: Duration) {
    let Some(mtm) = MainThreadMarker::new() else {
        return;
    };
    let app = NSApplication::sharedApplication(mtm);

    unsafe {
        let until = NSDate::dateWithTimeIntervalSinceNow(timeout.as_secs_f64());
        while let Some(event) = app.nextEventMatchingMask_untilDate_inMode_dequeue(
            NSEventMask::Any,
            Some(&until),
            NSDefaultRunLoopMode,
            true,
        ) {
            app.sendEvent(&event);
        }
    }
}
