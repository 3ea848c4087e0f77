// ABOUTME: macOS platform implementations
// ABOUTME: Global mouse-down monitoring through objc2-app-kit

pub mod monitor;

pub use monitor::OutsideClickMonitor;
