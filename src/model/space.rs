use std::cell::Cell;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier the window server hands out for a Space.
///
/// The value is opaque: it is stable for the lifetime of the Space but says
/// nothing about the Space's position or display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(u64);

impl SpaceId {
    pub const fn new(id: u64) -> Self { Self(id) }

    pub const fn get(self) -> u64 { self.0 }

    /// Key under which this Space's label is persisted.
    pub fn key(self) -> String { self.0.to_string() }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for SpaceId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { s.trim().parse().map(Self) }
}

/// Source of the active Space identifier.
///
/// `None` means the window server could not be asked, not that there is no
/// active Space.
pub trait SpaceReader {
    fn active_space(&self) -> Option<SpaceId>;
}

impl<R: SpaceReader + ?Sized> SpaceReader for &R {
    fn active_space(&self) -> Option<SpaceId> { (**self).active_space() }
}

/// Reader that reports whatever it was last told. Used to drive the
/// controller without a window server.
#[derive(Debug, Default)]
pub struct FixedSpaceReader {
    current: Cell<Option<SpaceId>>,
}

impl FixedSpaceReader {
    pub fn new(current: Option<SpaceId>) -> Self { Self { current: Cell::new(current) } }

    pub fn switch_to(&self, space: Option<SpaceId>) { self.current.set(space); }
}

impl SpaceReader for FixedSpaceReader {
    fn active_space(&self) -> Option<SpaceId> { self.current.get() }
}
