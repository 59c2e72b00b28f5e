pub mod app;
pub mod cli;
pub mod config;
pub mod feed;
pub mod highlight;
pub mod records;
pub mod timefmt;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
