use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, info_span, warn};

use crate::model::display::{CommitOutcome, DisplayController};
use crate::model::labels::Preferences;
use crate::sys::skylight::WindowServerSpaces;
use crate::ui::overlay::{ActionSink, OverlayAction, OverlayView};

pub type Controller = DisplayController<Box<dyn Preferences>, WindowServerSpaces>;

/// Owns the label state machine and the window that shows it, and applies
/// [`OverlayAction`]s to both.
pub struct Overlay {
    controller: Controller,
    view: OverlayView,
}

impl Overlay {
    pub fn new(controller: Controller, view: OverlayView) -> Rc<RefCell<Self>> {
        view.render(controller.state());
        Rc::new(RefCell::new(Self { controller, view }))
    }

    pub fn show(&self) { self.view.show(); }

    /// A sink that forwards actions to `overlay` for as long as it is alive.
    pub fn sink(overlay: &Rc<RefCell<Self>>) -> ActionSink {
        let weak = Rc::downgrade(overlay);
        Box::new(move |action| Self::dispatch(&weak, action))
    }

    pub fn dispatch(overlay: &Weak<RefCell<Self>>, action: OverlayAction) {
        let Some(overlay) = overlay.upgrade() else { return };
        // AppKit can call back into us while an action is being applied.
        let Ok(mut overlay) = overlay.try_borrow_mut() else {
            warn!(?action, "Overlay busy; dropping re-entrant action");
            return;
        };
        overlay.handle_action(action);
    }

    fn handle_action(&mut self, action: OverlayAction) {
        let span = info_span!("overlay::handle_action", ?action);
        let _s = span.enter();

        match action {
            OverlayAction::BeginEdit => match self.controller.begin_edit() {
                Some(current) => self.view.show_editor(&current),
                None => debug!("Active space unknown; not editing"),
            },
            OverlayAction::Commit => {
                let text = self.view.editor_text();
                let outcome = self.controller.commit(&text);
                debug!(?outcome, "Edit committed");
                self.view.hide_editor();
                if let CommitOutcome::Saved(_) = outcome {
                    self.view.pulse();
                }
            }
            OverlayAction::Cancel => {
                self.controller.cancel();
                self.view.hide_editor();
            }
            OverlayAction::Clear => {
                self.controller.clear();
            }
            OverlayAction::SpaceChanged => {
                if self.controller.space_changed() {
                    self.view.hide_editor();
                }
            }
            OverlayAction::TakeFocus => self.view.take_focus(),
        }

        self.view.render(self.controller.state());
    }
}
