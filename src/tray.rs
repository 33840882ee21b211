// ABOUTME: macOS menubar status item built on the tray-icon crate
// ABOUTME: Shows whether a preview is running and turns menu clicks into tray events

use crate::events::TrayEvent;
use crate::icon::render_status_icon;
use crate::platform::StatusIndicator;
use anyhow::Result;
use tracing::{debug, info, warn};
use tray_icon::{
    Icon, TrayIcon, TrayIconBuilder,
    menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem},
};

const IDLE_TOOLTIP: &str = "QuickPlay - Control+Space to preview";
const ACTIVE_TOOLTIP: &str = "QuickPlay - previewing (Up/Down to navigate, Escape to close)";

pub struct StatusTray {
    tray_icon: TrayIcon,
    active: bool,
}

// Menu item IDs - created at runtime
fn preview_selected_id() -> MenuId {
    MenuId::new("preview_selected")
}
fn about_id() -> MenuId {
    MenuId::new("about_quickplay")
}
fn quit_id() -> MenuId {
    MenuId::new("quit_quickplay")
}

fn status_icon(active: bool) -> Result<Icon> {
    let image = render_status_icon(active);
    let (width, height) = image.dimensions();
    Ok(Icon::from_rgba(image.into_raw(), width, height)?)
}

impl StatusTray {
    pub fn new() -> Result<Self> {
        let menu = Menu::new();

        let hotkey_hint = MenuItem::new("Control+Space to preview video", false, None);
        let navigation_hint = MenuItem::new("Up/Down arrows to navigate", false, None);
        let preview_item =
            MenuItem::with_id(preview_selected_id(), "Preview Selected Video", true, None);
        let about_item = MenuItem::with_id(about_id(), "About QuickPlay", true, None);
        let quit_item = MenuItem::with_id(quit_id(), "Quit", true, None);

        menu.append(&hotkey_hint)?;
        menu.append(&navigation_hint)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&preview_item)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&about_item)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&quit_item)?;

        // Template mode lets macOS recolor the glyph for light and dark menubars
        let tray_icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(IDLE_TOOLTIP)
            .with_icon(status_icon(false)?)
            .with_icon_as_template(true)
            .build()?;

        info!("Created menubar status item");

        Ok(Self {
            tray_icon,
            active: false,
        })
    }
}

impl StatusIndicator for StatusTray {
    fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;

        let tooltip = if active { ACTIVE_TOOLTIP } else { IDLE_TOOLTIP };
        let result = status_icon(active).and_then(|icon| {
            self.tray_icon.set_icon(Some(icon))?;
            self.tray_icon.set_icon_as_template(true);
            self.tray_icon.set_tooltip(Some(tooltip))?;
            Ok(())
        });

        if let Err(e) = result {
            warn!(error = %e, "Failed to update status item");
        }
    }

    fn try_recv_event(&mut self) -> Option<TrayEvent> {
        let event = MenuEvent::receiver().try_recv().ok()?;
        debug!(id = ?event.id, "Menu event");

        if event.id == preview_selected_id() {
            Some(TrayEvent::PreviewSelected)
        } else if event.id == about_id() {
            Some(TrayEvent::About)
        } else if event.id == quit_id() {
            Some(TrayEvent::Quit)
        } else {
            None
        }
    }
}
