//! Portfolio site tooling: build pipeline, preview server and page localization.

pub mod config;
pub mod i18n;
pub mod pipeline;
pub mod server;
