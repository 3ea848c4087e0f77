// ABOUTME: Entry point for GrokBar, a menu bar popover hosting a web page
// ABOUTME: Sets up logging and hands control to the winit event loop; the shell modules exist on macOS only

// The popover logic builds everywhere so it can be tested; only macOS runs it
#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

#[cfg(target_os = "macos")]
mod app;
mod cache;
mod config;
mod geometry;
mod icon;
mod logging;
#[cfg(target_os = "macos")]
mod platform;
mod popover;
mod preferences;
mod preset;
mod resize;
mod surface;
#[cfg(target_os = "macos")]
mod tray;
#[cfg(target_os = "macos")]
mod webview;

use anyhow::Result;

fn main() -> Result<()> {
    logging::init();
    tracing::info!("Starting GrokBar {}", env!("CARGO_PKG_VERSION"));

    #[cfg(target_os = "macos")]
    return app::run();

    #[cfg(not(target_os = "macos"))]
    anyhow::bail!("GrokBar lives in the macOS menu bar and cannot run on this platform");
}
