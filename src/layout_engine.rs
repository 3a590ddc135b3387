mod command;
mod engine;
mod error;
pub(crate) mod graph;
pub mod placement;
pub mod resize;
pub mod utils;
mod workspaces;


pub use command::{FocusHint, LayoutCommand, StackCount};
pub use engine::{EventResponse, LayoutEngine};
pub use error::LayoutError;
pub use graph::{Axis, ORDER_CYCLE, ORIENTATION_CYCLE, Order, Orientation, advance};
pub use resize::{ResizeAmount, ResizeDelta};
pub use utils::{DecorationOverrides, WindowPlacement};
pub use workspaces::{LAYOUT_OPTS, Overrides, WorkspaceSettings};
