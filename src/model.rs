pub mod desktop;
pub mod nodes;

pub use desktop::{Desktop, FullscreenMode, Monitor, MonitorId, Window, WindowId, Workspace, WorkspaceId};
pub use nodes::{Node, NodeRegistry};
