pub mod analysis;
pub mod api;
pub mod app;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod detector;
pub mod global;
pub mod media;
pub mod monitor;
pub mod store;
