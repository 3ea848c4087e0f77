// ABOUTME: winit application shell wiring the status item, popover window, web surface and preference store
// ABOUTME: Every input becomes a PopoverEvent; the controller's Effects are applied to the real window here

use crate::cache;
use crate::geometry::{Frame, Point, Size};
use crate::icon;
use crate::platform::OutsideClickMonitor;
use crate::popover::{Effect, PopoverController, PopoverEvent};
use crate::preferences::{PreferenceChange, PreferenceStore, Subscription, TomlFileBackend};
use crate::surface::{self, CONTENT_URL, WebSurface};
use crate::tray::{self, StatusItem, TrayAction};
use crate::webview::PopoverWebView;
use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalPosition, LogicalSize, PhysicalPosition};
use winit::event::{ElementState, MouseButton, StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::platform::macos::{ActivationPolicy, EventLoopBuilderExtMacOS};
use winit::window::{CursorIcon, Window, WindowId, WindowLevel};

/// Roughly one display refresh between snap animation frames.
const ANIMATION_FRAME: Duration = Duration::from_millis(16);

// Events delivered to the UI thread through the event loop proxy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    Tray(TrayAction),
    OutsidePointerDown(Point),
    PreferencesChanged(PreferenceChange),
    /// Website data removal finished; the rest of Clear Caches can run.
    WebsiteDataCleared,
}

pub struct GrokBarApp {
    proxy: EventLoopProxy<AppEvent>,
    store: PreferenceStore,
    controller: PopoverController,

    window: Option<Window>,
    webview: Option<PopoverWebView>,
    status_item: Option<StatusItem>,
    monitor: Option<OutsideClickMonitor>,
    subscription: Option<Subscription>,

    // Pointer tracking for the resize handle, in window-relative points
    cursor: Option<Point>,
    drag_anchor_y: Option<f64>,
}

impl GrokBarApp {
    pub fn new(proxy: EventLoopProxy<AppEvent>, store: PreferenceStore) -> Self {
        // Changes come back through the proxy so they are handled on a later
        // turn of the event loop, never inside the setter that caused them.
        let change_proxy = proxy.clone();
        let subscription = store.subscribe(move |change| {
            let _ = change_proxy.send_event(AppEvent::PreferencesChanged(*change));
        });

        Self {
            proxy,
            store,
            controller: PopoverController::new(),
            window: None,
            webview: None,
            status_item: None,
            monitor: None,
            subscription: Some(subscription),
            cursor: None,
            drag_anchor_y: None,
        }
    }

    fn create_status_item(&mut self) -> Result<()> {
        let tray_proxy = self.proxy.clone();
        tray::install_event_handlers(move |action| {
            let _ = tray_proxy.send_event(AppEvent::Tray(action));
        });

        let status_icon = icon::resolve(&icon::candidate_paths());
        self.status_item = Some(StatusItem::new(status_icon, self.store.retain_focus())?);
        Ok(())
    }

    fn create_popover(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let size = self.store.size_preset().content_size();
        let attributes = Window::default_attributes()
            .with_title("GrokBar")
            .with_inner_size(LogicalSize::new(size.width, size.height))
            .with_decorations(false)
            .with_resizable(false)
            .with_visible(false)
            .with_window_level(WindowLevel::AlwaysOnTop);

        let window = event_loop
            .create_window(attributes)
            .context("Failed to create popover window")?;
        let webview = PopoverWebView::new(&window, size)?;

        self.window = Some(window);
        self.webview = Some(webview);
        Ok(())
    }

    fn start_monitor(&mut self, event_loop: &ActiveEventLoop) {
        let screen_height = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .map(|monitor| monitor.size().to_logical::<f64>(monitor.scale_factor()).height)
            .unwrap_or_default();

        let monitor_proxy = self.proxy.clone();
        match OutsideClickMonitor::start(screen_height, move |point| {
            let _ = monitor_proxy.send_event(AppEvent::OutsidePointerDown(point));
        }) {
            Ok(monitor) => self.monitor = Some(monitor),
            Err(e) => tracing::warn!("Outside clicks will not dismiss the popover: {e:#}"),
        }
    }

    fn scale_factor(&self) -> f64 {
        self.window.as_ref().map(Window::scale_factor).unwrap_or(1.0)
    }

    fn dispatch(&mut self, event: PopoverEvent) {
        let prefs = self.store.preferences();
        let effects = self.controller.handle(event, &prefs, Instant::now());
        tracing::trace!(?event, state = ?self.controller.state(), "Popover event handled");
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        tracing::trace!(?effect, "Applying effect");
        match effect {
            Effect::Show(frame) => {
                self.set_frame(frame);
                if let Some(window) = &self.window {
                    window.set_visible(true);
                    window.focus_window();
                }
                if let Some(webview) = &self.webview {
                    webview.focus();
                }
            }
            Effect::Hide => {
                self.drag_anchor_y = None;
                if let Some(window) = &self.window {
                    window.set_visible(false);
                }
            }
            Effect::SetFrame(frame) => self.set_frame(frame),
            Effect::FreezeContent => self.set_frozen(true),
            Effect::ThawContent => self.set_frozen(false),
            Effect::CommitPreset(preset) => self.store.set_size_preset(preset),
        }
    }

    fn set_frame(&self, frame: Frame) {
        if let Some(window) = &self.window {
            place(window, frame);
        }
        if let Some(webview) = &self.webview {
            webview.resize(frame.size);
        }
    }

    fn set_frozen(&self, frozen: bool) {
        if let Some(webview) = &self.webview {
            if let Err(e) = webview.set_frozen(frozen) {
                tracing::warn!("{e:#}");
            }
        }
    }

    fn handle_tray_action(&mut self, action: TrayAction, event_loop: &ActiveEventLoop) {
        match action {
            TrayAction::IconClicked { button, icon_frame } => {
                let icon_frame = physical_to_logical(icon_frame, self.scale_factor());
                self.dispatch(PopoverEvent::IconPressed {
                    button,
                    icon_frame: Some(icon_frame),
                });
            }
            TrayAction::ClearCaches => {
                if let Some(webview) = &self.webview {
                    let proxy = self.proxy.clone();
                    let outcome = cache::start_clearing(webview, move || {
                        let _ = proxy.send_event(AppEvent::WebsiteDataCleared);
                    });
                    tracing::debug!(?outcome, "Cache clearing started");
                }
            }
            TrayAction::ToggleRetainFocus => {
                let retain = !self.store.retain_focus();
                self.store.set_retain_focus(retain);
            }
            TrayAction::Quit => {
                tracing::info!("Quit requested from menu");
                self.shutdown();
                event_loop.exit();
            }
        }
    }

    fn handle_pointer(&mut self, event: &WindowEvent) {
        let Some((scale, height)) = self.window.as_ref().map(|window| {
            let scale = window.scale_factor();
            (scale, window.inner_size().to_logical::<f64>(scale).height)
        }) else {
            return;
        };

        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let position = position.to_logical::<f64>(scale);
                let point = Point::new(position.x, position.y);
                self.cursor = Some(point);

                if let Some(anchor) = self.drag_anchor_y {
                    self.dispatch(PopoverEvent::DragMoved(point.y - anchor));
                } else if let Some(window) = &self.window {
                    let cursor = if surface::in_handle(height, point.y) {
                        CursorIcon::NsResize
                    } else {
                        CursorIcon::Default
                    };
                    window.set_cursor(cursor);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(cursor) = self.cursor.filter(|c| surface::in_handle(height, c.y)) {
                    self.drag_anchor_y = Some(cursor.y);
                    self.dispatch(PopoverEvent::DragBegan);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(anchor) = self.drag_anchor_y.take() {
                    let y = self.cursor.map_or(anchor, |c| c.y);
                    self.dispatch(PopoverEvent::DragEnded(y - anchor));
                }
            }
            _ => {}
        }
    }

    fn shutdown(&mut self) {
        tray::remove_event_handlers();
        self.monitor = None;
        self.subscription = None;
        self.webview = None;
        self.status_item = None;
    }
}

impl ApplicationHandler<AppEvent> for GrokBarApp {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        // The status item must be created once the loop is actually running
        if matches!(cause, StartCause::Init) {
            if let Err(e) = self.create_status_item() {
                tracing::error!("Failed to create status item: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_popover(event_loop) {
            tracing::error!("{e:#}");
            event_loop.exit();
            return;
        }
        self.start_monitor(event_loop);
        tracing::info!("GrokBar is running - click the menu bar icon to open");
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Tray(action) => self.handle_tray_action(action, event_loop),
            AppEvent::OutsidePointerDown(point) => {
                self.dispatch(PopoverEvent::OutsidePointerDown(point));
            }
            AppEvent::PreferencesChanged(change) => {
                if let (PreferenceChange::RetainFocus(retain), Some(item)) = (change, &self.status_item) {
                    item.set_retain_focus_checked(retain);
                }
                self.dispatch(PopoverEvent::PreferencesChanged(change));
            }
            AppEvent::WebsiteDataCleared => {
                if let Some(webview) = &self.webview {
                    let outcome = cache::finish_clearing(webview, CONTENT_URL);
                    tracing::debug!(?outcome, "Cache clearing finished");
                }
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(Window::id) != Some(window_id) {
            return;
        }

        match &event {
            WindowEvent::Focused(false) => {
                if let Some(anchor) = self.drag_anchor_y.take() {
                    let y = self.cursor.map_or(anchor, |c| c.y);
                    self.dispatch(PopoverEvent::DragCancelled(y - anchor));
                }
                self.dispatch(PopoverEvent::FocusLost);
            }
            WindowEvent::CloseRequested => {
                tracing::debug!("Ignoring close request; the popover is hidden, not closed");
            }
            WindowEvent::CursorLeft { .. } if self.drag_anchor_y.is_none() => {
                self.cursor = None;
            }
            WindowEvent::CursorMoved { .. } | WindowEvent::MouseInput { .. } => {
                self.handle_pointer(&event);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.controller.is_animating() {
            self.dispatch(PopoverEvent::AnimationTick);
            event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + ANIMATION_FRAME));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
        tracing::info!("GrokBar exiting");
    }
}

/// The two window calls a frame change is made of.
trait FramePlacement {
    fn resize_to(&self, size: Size);
    fn move_to(&self, origin: Point);
}

impl FramePlacement for Window {
    fn resize_to(&self, size: Size) {
        let _ = self.request_inner_size(LogicalSize::new(size.width, size.height));
    }

    fn move_to(&self, origin: Point) {
        self.set_outer_position(LogicalPosition::new(origin.x, origin.y));
    }
}

/// AppKit keeps the bottom edge fixed when a window is resized, and positions
/// by top-left using the current height, so the size must be set first for
/// the top edge to stay put.
fn place<W: FramePlacement>(window: &W, frame: Frame) {
    window.resize_to(frame.size);
    window.move_to(frame.origin);
}

/// Tray rectangles arrive in physical pixels; the controller works in points.
fn physical_to_logical(frame: Frame, scale_factor: f64) -> Frame {
    let origin = PhysicalPosition::new(frame.origin.x, frame.origin.y).to_logical::<f64>(scale_factor);
    Frame::new(
        Point::new(origin.x, origin.y),
        Size::new(frame.size.width / scale_factor, frame.size.height / scale_factor),
    )
}

pub fn run() -> Result<()> {
    let mut builder = EventLoop::<AppEvent>::with_user_event();

    // Menu bar only: no Dock icon and no application menu
    builder
        .with_activation_policy(ActivationPolicy::Accessory)
        .with_default_menu(false);

    let event_loop = builder.build().context("Failed to create event loop")?;

    let backend = match TomlFileBackend::at_default_location() {
        Ok(backend) => backend,
        Err(e) => {
            let fallback = std::env::temp_dir().join("grokbar").join("preferences.toml");
            tracing::warn!("{e:#}. Storing preferences at {}", fallback.display());
            TomlFileBackend::new(fallback)
        }
    };
    let store = PreferenceStore::load(Box::new(backend));

    let mut app = GrokBarApp::new(event_loop.create_proxy(), store);
    event_loop.run_app(&mut app).context("Event loop failed")?;

    Ok(())
}
