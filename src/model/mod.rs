pub mod display;
pub mod labels;
pub mod server;
pub mod space;

pub use display::{CommitOutcome, DisplayController, DisplayOptions, DisplayState, Mode};
pub use labels::{LabelMap, LabelStore, MemoryPreferences, Preferences, StoreError};
pub use space::{FixedSpaceReader, SpaceId, SpaceReader};
