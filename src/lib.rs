//! SpaceLabel keeps a floating label on screen naming the active macOS Space.
//!
//! The label model and its state machine live in [`model`] and are platform
//! independent. The AppKit shell (`actor`, `sys`, `ui`) is only built on macOS.

pub mod common;
pub mod model;

#[cfg(target_os = "macos")]
pub mod actor;
#[cfg(target_os = "macos")]
pub mod sys;
#[cfg(target_os = "macos")]
pub mod ui;
