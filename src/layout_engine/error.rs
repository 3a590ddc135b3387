use thiserror::Error;

use crate::model::WindowId;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Window {0:?} is not known to the desktop")]
    UnknownWindow(WindowId),
    #[error("Window {0:?} does not fit the layout and should float")]
    CannotTile(WindowId),
}
