//! wxdash library
//!
//! Exposes the forecast pipeline, cache, CLI and UI modules to the binary and
//! to integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod logging;
pub mod ui;
