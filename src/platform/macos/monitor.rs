// ABOUTME: Global left/right mouse-down monitor built on NSEvent
// ABOUTME: Reports pointer locations in top-left screen coordinates; removed from AppKit on drop

use anyhow::{Context, Result};
use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2_app_kit::{NSEvent, NSEventMask};
use std::ptr::NonNull;

use crate::geometry::Point;

pub struct OutsideClickMonitor {
    monitor: Option<Retained<AnyObject>>,
}

impl OutsideClickMonitor {
    /// `primary_screen_height` (points) flips AppKit's bottom-left screen
    /// coordinates into the top-left space the popover controller uses.
    ///
    /// Global monitors only see events headed for other applications, so
    /// clicks inside our own popover never reach `on_pointer_down`.
    pub fn start<F>(primary_screen_height: f64, on_pointer_down: F) -> Result<Self>
    where
        F: Fn(Point) + 'static,
    {
        let handler = RcBlock::new(move |_event: NonNull<NSEvent>| {
            #[allow(unused_unsafe)]
            let location = unsafe { NSEvent::mouseLocation() };
            on_pointer_down(Point::new(location.x, primary_screen_height - location.y));
        });

        let mask = NSEventMask::LeftMouseDown | NSEventMask::RightMouseDown;
        let monitor = unsafe { NSEvent::addGlobalMonitorForEventsMatchingMask_handler(mask, &handler) }
            .context("AppKit refused to install the global mouse monitor")?;

        tracing::info!("Global mouse-down monitor installed");
        Ok(Self {
            monitor: Some(monitor),
        })
    }
}

impl Drop for OutsideClickMonitor {
    fn drop(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            unsafe { NSEvent::removeMonitor(&monitor) };
            tracing::debug!("Global mouse-down monitor removed");
        }
    }
}
