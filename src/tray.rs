// ABOUTME: Status item (tray icon) with the right-click context menu, built on the tray-icon crate
// ABOUTME: Forwards icon clicks and menu picks to the event loop as TrayAction values

use anyhow::Result;
use tray_icon::{
    MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent,
    menu::{CheckMenuItem, Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem},
};

use crate::geometry::{Frame, Point, Size};
use crate::icon::StatusIcon;
use crate::popover::PointerButton;

pub struct StatusItem {
    _tray_icon: TrayIcon,
    retain_focus_item: CheckMenuItem,
}

// Menu item IDs - created at runtime
fn clear_caches_id() -> MenuId {
    MenuId::new("clear_caches")
}
fn retain_focus_id() -> MenuId {
    MenuId::new("retain_focus")
}
fn quit_id() -> MenuId {
    MenuId::new("quit_grokbar")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrayAction {
    /// Fired on button release. `icon_frame` is in physical pixels.
    IconClicked {
        button: PointerButton,
        icon_frame: Frame,
    },
    ClearCaches,
    ToggleRetainFocus,
    Quit,
}

impl StatusItem {
    pub fn new(icon: StatusIcon, retain_focus: bool) -> Result<Self> {
        let menu = Menu::new();

        // No confirmation step: the action runs as soon as it is picked.
        let clear_item = MenuItem::with_id(clear_caches_id(), "Clear Caches…", true, None);
        let retain_focus_item =
            CheckMenuItem::with_id(retain_focus_id(), "Keep Popover Open", true, retain_focus, None);
        let separator = PredefinedMenuItem::separator();
        let quit_item = MenuItem::with_id(quit_id(), "Quit GrokBar", true, None);

        menu.append(&clear_item)?;
        menu.append(&retain_focus_item)?;
        menu.append(&separator)?;
        menu.append(&quit_item)?;

        let mut tray_builder = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_menu_on_left_click(false)
            .with_tooltip("GrokBar");

        tray_builder = match icon {
            StatusIcon::Image { source, icon } => {
                tracing::debug!(source = %source.display(), "Using image status icon");
                let icon = tray_icon::Icon::from_rgba(icon.rgba, icon.width, icon.height)?;
                tray_builder.with_icon(icon)
            }
            StatusIcon::Title(title) => tray_builder.with_title(title),
        };

        // Template mode lets macOS tint the icon for light and dark menu bars
        tray_builder = tray_builder.with_icon_as_template(true);

        let tray_icon = tray_builder.build()?;
        tracing::info!("Created status item");

        Ok(Self {
            _tray_icon: tray_icon,
            retain_focus_item,
        })
    }

    /// Keep the check mark in step with the stored preference.
    pub fn set_retain_focus_checked(&self, retain: bool) {
        self.retain_focus_item.set_checked(retain);
    }
}

/// Route tray and menu events into `sink`. Handlers run on whatever thread
/// the platform delivers them on, so `sink` must be thread safe.
pub fn install_event_handlers<F>(sink: F)
where
    F: Fn(TrayAction) + Send + Sync + Clone + 'static,
{
    let icon_sink = sink.clone();
    TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
        tracing::trace!(?event, "Tray icon event");
        if let Some(action) = action_for_icon_event(&event) {
            icon_sink(action);
        }
    }));

    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        tracing::debug!(?event, "Menu event");
        if let Some(action) = action_for_menu_id(&event.id) {
            sink(action);
        }
    }));
}

/// Clear the global handlers so nothing outlives the event loop.
pub fn remove_event_handlers() {
    TrayIconEvent::set_event_handler(None::<fn(TrayIconEvent)>);
    MenuEvent::set_event_handler(None::<fn(MenuEvent)>);
}

fn action_for_icon_event(event: &TrayIconEvent) -> Option<TrayAction> {
    let TrayIconEvent::Click {
        rect,
        button,
        button_state: MouseButtonState::Up,
        ..
    } = event
    else {
        return None;
    };

    let button = match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        _ => return None,
    };

    let icon_frame = Frame::new(
        Point::new(rect.position.x, rect.position.y),
        Size::new(rect.size.width as f64, rect.size.height as f64),
    );
    Some(TrayAction::IconClicked { button, icon_frame })
}

fn action_for_menu_id(id: &MenuId) -> Option<TrayAction> {
    if *id == clear_caches_id() {
        Some(TrayAction::ClearCaches)
    } else if *id == retain_focus_id() {
        Some(TrayAction::ToggleRetainFocus)
    } else if *id == quit_id() {
        Some(TrayAction::Quit)
    } else {
        None
    }
}
