//! API route modules.

pub mod monitor;
pub mod recordings;
pub mod settings;
