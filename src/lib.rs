//! Traffic Dashboard Library
//!
//! Terminal client for a road traffic monitoring backend. The modules are
//! exposed for the binary and for integration tests.

pub mod app;
pub mod cli;
pub mod data;
pub mod logging;
pub mod pages;
pub mod refresh;
pub mod ui;
pub mod utils;
