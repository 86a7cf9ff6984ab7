//! Application delegate: builds the overlay once AppKit has finished
//! launching and keeps everything alive for the life of the process.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use anyhow::Context;
use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2::{DefinedClass, MainThreadOnly, define_class, msg_send};
use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy, NSApplicationDelegate};
use objc2_foundation::{MainThreadMarker, NSNotification, NSObject, NSObjectProtocol};
use tracing::{debug, info};

use super::notification_center::NotificationCenter;
use super::overlay::{Controller, Overlay};
use crate::common::config::Config;
use crate::model::display::{DisplayController, DisplayOptions};
use crate::model::labels::{LabelStore, Preferences};
use crate::sys::dispatch;
use crate::sys::skylight::WindowServerSpaces;
use crate::ui::menu_bar::build_main_menu;
use crate::ui::overlay::{OverlayAction, OverlayTarget, OverlayView};

struct Running {
    _overlay: Rc<RefCell<Overlay>>,
    _target: Retained<OverlayTarget>,
    _notifications: NotificationCenter,
}

struct AppDelegateIvars {
    config: Config,
    store: RefCell<Option<LabelStore<Box<dyn Preferences>>>>,
    running: RefCell<Option<Running>>,
}

define_class!(
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "SpaceLabelAppDelegate"]
    #[ivars = AppDelegateIvars]
    struct AppDelegate;

    unsafe impl NSObjectProtocol for AppDelegate {}

    unsafe impl NSApplicationDelegate for AppDelegate {
        #[unsafe(method(applicationDidFinishLaunching:))]
        fn application_did_finish_launching(&self, _notification: &NSNotification) {
            self.launch();
        }

        #[unsafe(method(applicationSupportsSecureRestorableState:))]
        fn application_supports_secure_restorable_state(&self, _app: &NSApplication) -> bool {
            true
        }
    }
);

impl AppDelegate {
    fn new(
        mtm: MainThreadMarker,
        config: Config,
        store: LabelStore<Box<dyn Preferences>>,
    ) -> Retained<Self> {
        let this = Self::alloc(mtm).set_ivars(AppDelegateIvars {
            config,
            store: RefCell::new(Some(store)),
            running: RefCell::new(None),
        });
        unsafe { msg_send![super(this), init] }
    }

    fn launch(&self) {
        let mtm = self.mtm();
        let Some(store) = self.ivars().store.borrow_mut().take() else {
            debug!("Already launched");
            return;
        };
        let config = &self.ivars().config;

        let options = DisplayOptions {
            uppercase: config.appearance.uppercase,
        };
        let controller: Controller = DisplayController::new(store, WindowServerSpaces, options);
        info!(state = ?controller.state(), "Starting overlay");

        let target = OverlayTarget::new(mtm);
        let view = OverlayView::new(mtm, &config.appearance, &config.behavior, &target);
        let overlay = Overlay::new(controller, view);
        target.set_sink(Overlay::sink(&overlay));

        NSApplication::sharedApplication(mtm).setMainMenu(Some(&build_main_menu(mtm)));
        let notifications = NotificationCenter::new(mtm, Overlay::sink(&overlay));

        overlay.borrow().show();
        dispatch::after_on_main(
            mtm,
            Duration::from_millis(config.behavior.focus_delay_ms),
            Rc::downgrade(&overlay),
            |overlay: Weak<RefCell<Overlay>>| Overlay::dispatch(&overlay, OverlayAction::TakeFocus),
        );

        *self.ivars().running.borrow_mut() = Some(Running {
            _overlay: overlay,
            _target: target,
            _notifications: notifications,
        });
    }
}

/// Runs the overlay until the user quits. Must be called on the main thread.
pub fn run(config: Config, store: LabelStore<Box<dyn Preferences>>) -> anyhow::Result<()> {
    let mtm = MainThreadMarker::new().context("the overlay must run on the main thread")?;
    let app = NSApplication::sharedApplication(mtm);
    app.setActivationPolicy(NSApplicationActivationPolicy::Regular);

    let delegate = AppDelegate::new(mtm, config, store);
    app.setDelegate(Some(ProtocolObject::from_ref(&*delegate)));
    app.run();
    Ok(())
}
