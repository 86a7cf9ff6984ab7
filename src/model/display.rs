//! What the overlay shows, and the Display/Editing state machine behind it.

use std::mem;

use tracing::{debug, warn};

use super::labels::{LabelStore, Preferences};
use super::space::{SpaceId, SpaceReader};

/// Shown while the window server cannot tell us the active Space.
pub const UNKNOWN_SPACE_TEXT: &str = "Unknown Space";

/// Text for a Space the user has not named.
pub fn default_text(space: SpaceId) -> String { format!("Space {space}") }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub uppercase: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self { Self { uppercase: true } }
}

/// Derived view of the active Space. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub space: Option<SpaceId>,
    pub text: String,
    pub labeled: bool,
}

impl DisplayState {
    pub fn resolve(space: Option<SpaceId>, label: Option<String>, options: DisplayOptions) -> Self {
        let labeled = label.is_some();
        let text = match (space, label) {
            (_, Some(label)) => label,
            (Some(space), None) => default_text(space),
            (None, None) => UNKNOWN_SPACE_TEXT.to_owned(),
        };
        let text = if options.uppercase { text.to_uppercase() } else { text };
        Self { space, text, labeled }
    }

    /// Editing needs a Space to key the label against.
    pub fn can_edit(&self) -> bool { self.space.is_some() }

    pub fn shows_clear(&self) -> bool { self.labeled }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Display,
    /// An edit of `space`'s label is in progress.
    Editing { space: SpaceId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The trimmed name was stored.
    Saved(String),
    /// The input was blank; nothing changed.
    Blank,
    /// The store refused the write; nothing changed.
    Failed,
    /// There was no edit to commit.
    NotEditing,
}

pub struct DisplayController<P, R> {
    store: LabelStore<P>,
    spaces: R,
    options: DisplayOptions,
    mode: Mode,
    state: DisplayState,
}

impl<P: Preferences, R: SpaceReader> DisplayController<P, R> {
    /// Starts in [`Mode::Display`] for whichever Space is active now.
    pub fn new(store: LabelStore<P>, spaces: R, options: DisplayOptions) -> Self {
        let state = DisplayState::resolve(None, None, options);
        let mut controller = Self {
            store,
            spaces,
            options,
            mode: Mode::Display,
            state,
        };
        controller.refresh();
        controller
    }

    pub fn state(&self) -> &DisplayState { &self.state }

    pub fn mode(&self) -> Mode { self.mode }

    pub fn store(&self) -> &LabelStore<P> { &self.store }

    pub fn set_options(&mut self, options: DisplayOptions) {
        self.options = options;
        self.refresh();
    }

    /// Re-reads the active Space and its label.
    pub fn refresh(&mut self) -> &DisplayState {
        let space = self.spaces.active_space();
        let label = space.and_then(|space| self.store.get(space));
        self.state = DisplayState::resolve(space, label, self.options);
        &self.state
    }

    /// Enters [`Mode::Editing`] and returns the text to pre-fill the field
    /// with: the current custom label, or empty.
    ///
    /// Returns `None` when the active Space is unknown.
    pub fn begin_edit(&mut self) -> Option<String> {
        let space = self.state.space?;
        self.mode = Mode::Editing { space };
        debug!(%space, "Editing label");
        Some(self.store.get(space).unwrap_or_default())
    }

    /// Leaves [`Mode::Editing`], saving `input` if it is not blank.
    pub fn commit(&mut self, input: &str) -> CommitOutcome {
        let Mode::Editing { space } = mem::replace(&mut self.mode, Mode::Display) else {
            return CommitOutcome::NotEditing;
        };
        let outcome = match self.store.set(space, input) {
            Ok(Some(name)) => CommitOutcome::Saved(name),
            Ok(None) => CommitOutcome::Blank,
            Err(err) => {
                warn!(%space, error = %err, "Failed to save label");
                CommitOutcome::Failed
            }
        };
        self.refresh();
        outcome
    }

    /// Leaves [`Mode::Editing`] without saving. Returns whether an edit was
    /// in progress.
    pub fn cancel(&mut self) -> bool {
        let was_editing = self.is_editing();
        self.mode = Mode::Display;
        self.refresh();
        was_editing
    }

    /// Removes the active Space's label. Returns whether one was removed.
    ///
    /// Ignored while editing, where the clear control is hidden.
    pub fn clear(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        let Some(space) = self.state.space else { return false };
        let removed = match self.store.remove(space) {
            Ok(removed) => removed,
            Err(err) => {
                warn!(%space, error = %err, "Failed to clear label");
                false
            }
        };
        self.refresh();
        removed
    }

    /// The active Space changed: any pending edit is dropped unsaved.
    /// Returns whether an edit was discarded.
    pub fn space_changed(&mut self) -> bool {
        let discarded = self.is_editing();
        if discarded {
            debug!("Space changed mid-edit; discarding edit");
        }
        self.mode = Mode::Display;
        self.refresh();
        discarded
    }

    fn is_editing(&self) -> bool { matches!(self.mode, Mode::Editing { .. }) }
}
