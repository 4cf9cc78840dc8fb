pub mod app;
pub mod config;
pub mod logging;
pub mod report;
pub mod script;

pub use config::{AppConfig, ConfigError};
pub use script::{Script, ScriptError};
