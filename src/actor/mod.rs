//! Main-thread components that turn AppKit events into overlay actions.

pub mod app;
pub mod notification_center;
pub mod overlay;
