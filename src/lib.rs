#[cfg(feature = "cli")]
pub mod config;
pub mod engine;
pub mod env;
#[cfg(feature = "cli")]
pub mod logging;
pub mod report;
pub mod request;
