// ABOUTME: Platform layer: the global pointer monitor used to dismiss the popover on outside clicks
// ABOUTME: AppKit only; it reports clicks that land in other applications

pub mod macos;

pub use macos::OutsideClickMonitor;
