//! Private window-server calls. These have no public contract, so every
//! result is checked before it is trusted.

use tracing::warn;

use crate::model::space::{SpaceId, SpaceReader};

pub type CGSConnectionID = i32;
pub type CGSSpaceID = u64;

#[link(name = "CoreGraphics", kind = "framework")]
unsafe extern "C" {
    fn _CGSDefaultConnection() -> CGSConnectionID;
    fn CGSGetActiveSpace(cid: CGSConnectionID) -> CGSSpaceID;
}

/// Active Space of the current user session, or `None` when the window
/// server does not answer.
pub fn active_space() -> Option<SpaceId> {
    let cid = unsafe { _CGSDefaultConnection() };
    if cid == 0 {
        warn!("No window server connection");
        return None;
    }
    match unsafe { CGSGetActiveSpace(cid) } {
        0 => {
            warn!(cid, "Window server reported no active space");
            None
        }
        id => Some(SpaceId::new(id)),
    }
}

/// [`SpaceReader`] backed by the window server.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowServerSpaces;

impl SpaceReader for WindowServerSpaces {
    fn active_space(&self) -> Option<SpaceId> { active_space() }
}
