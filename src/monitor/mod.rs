pub mod machine;
pub mod session;
pub mod status;

pub use machine::MonitorMachine;
pub use status::{MonitorPhase, MonitorState, MonitorStatusHandle};
