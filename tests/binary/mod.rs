//! Tests that run the built binary.

pub mod common;
pub mod headless_test;
