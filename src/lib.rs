//! ops-cli - modal configuration shell for OpenSwitch devices.
//!
//! This library exposes the core modules for use by the binary and the
//! integration tests.

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod shell;
