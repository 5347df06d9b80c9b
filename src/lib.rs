pub mod app;
pub mod cli;
pub mod config;
pub mod journaling;
pub mod model;
pub mod registry;
pub mod storage;
pub mod surface;

pub use app::StickyApp;
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use registry::NoteRegistry;
