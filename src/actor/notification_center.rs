//! Listens to the workspace notification center for Space switches.
//!
//! The observer is registered once at launch and lives as long as the
//! process; it is never removed.

use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::{DefinedClass, MainThreadOnly, define_class, msg_send, sel};
use objc2_app_kit::{NSWorkspace, NSWorkspaceActiveSpaceDidChangeNotification};
use objc2_foundation::{MainThreadMarker, NSNotification, NSObject};
use tracing::{info_span, trace, warn};

use crate::ui::overlay::{ActionSink, OverlayAction};

struct Instance {
    sink: ActionSink,
}

define_class! {
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "SpaceLabelNotificationHandler"]
    #[ivars = Instance]
    struct NotificationCenterInner;

    // SAFETY: Each of these method signatures must match their invocations.
    impl NotificationCenterInner {
        #[unsafe(method(recvSpaceChangedEvent:))]
        fn recv_space_changed_event(&self, notif: &NSNotification) {
            trace!("{notif:#?}");
            self.handle_space_changed_event(notif);
        }
    }
}

impl NotificationCenterInner {
    fn new(mtm: MainThreadMarker, sink: ActionSink) -> Retained<Self> {
        let this = Self::alloc(mtm).set_ivars(Instance { sink });
        unsafe { msg_send![super(this), init] }
    }

    fn handle_space_changed_event(&self, notif: &NSNotification) {
        let name = &*notif.name();
        let span = info_span!("notification_center::handle_space_changed_event", ?name);
        let _s = span.enter();
        if unsafe { NSWorkspaceActiveSpaceDidChangeNotification } == name {
            (self.ivars().sink)(OverlayAction::SpaceChanged);
        } else {
            warn!("Unexpected workspace event: {notif:?}");
        }
    }
}

pub struct NotificationCenter {
    _inner: Retained<NotificationCenterInner>,
}

impl NotificationCenter {
    pub fn new(mtm: MainThreadMarker, sink: ActionSink) -> Self {
        let handler = NotificationCenterInner::new(mtm, sink);

        let workspace = NSWorkspace::sharedWorkspace();
        let workspace_center = workspace.notificationCenter();
        let object: &AnyObject = &workspace;
        // SAFETY: Selector must have signature fn(&self, &NSNotification)
        unsafe {
            workspace_center.addObserver_selector_name_object(
                &handler,
                sel!(recvSpaceChangedEvent:),
                Some(NSWorkspaceActiveSpaceDidChangeNotification),
                Some(object),
            );
        }

        NotificationCenter { _inner: handler }
    }
}
